//! Overlay keyboard shortcuts (`spec.md` §4.7 level 1, "Overlay shortcuts").
//!
//! A prefix trie built from active dropdown items' and command-palette
//! items' advertised shortcut strings. `feed` returns `matched`, `pending`,
//! or `none` per key; `pending` means a chord prefix is recognized and the
//! key must not fall through to lower levels.

use std::collections::HashMap;

use crate::event::{Event, EventKind, KeyEvent};

use super::RouteResult;

#[derive(Default)]
struct TrieNode {
    children: HashMap<KeyEvent, TrieNode>,
    action: Option<String>,
}

pub enum ShortcutMatch {
    Matched(String),
    Pending,
    None,
}

/// Chord trie plus the in-progress chord position. Rebuilt (via
/// [`ShortcutTrie::rebuild`]) whenever the active overlay's advertised
/// shortcuts change; matching is otherwise stateless between keys except
/// for `cursor`.
#[derive(Default)]
pub struct ShortcutTrie {
    root: TrieNode,
    cursor: Vec<KeyEvent>,
}

impl ShortcutTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole trie with the shortcuts advertised by the
    /// currently active overlay (dropdown items / command-palette items).
    pub fn rebuild(&mut self, shortcuts: impl IntoIterator<Item = (Vec<KeyEvent>, String)>) {
        self.root = TrieNode::default();
        self.cursor.clear();
        for (chord, action) in shortcuts {
            self.register(&chord, action);
        }
    }

    fn register(&mut self, shortcut: &[KeyEvent], action: impl Into<String>) {
        let mut node = &mut self.root;
        for key in shortcut {
            node = node.children.entry(*key).or_default();
        }
        node.action = Some(action.into());
    }

    fn lookup(&self, path: &[KeyEvent]) -> Option<&TrieNode> {
        let mut node = &self.root;
        for key in path {
            node = node.children.get(key)?;
        }
        Some(node)
    }

    pub fn feed(&mut self, key: KeyEvent) -> ShortcutMatch {
        if self.root.children.is_empty() {
            return ShortcutMatch::None;
        }
        self.cursor.push(key);
        match self.lookup(&self.cursor) {
            Some(node) if node.children.is_empty() => match &node.action {
                Some(action) => {
                    let action = action.clone();
                    self.cursor.clear();
                    ShortcutMatch::Matched(action)
                }
                None => {
                    self.cursor.clear();
                    ShortcutMatch::None
                }
            },
            Some(_) => ShortcutMatch::Pending,
            None => {
                self.cursor.clear();
                ShortcutMatch::None
            }
        }
    }
}

pub fn route(trie: &mut ShortcutTrie, event: &Event) -> Option<RouteResult> {
    let EventKind::Key(key) = event.kind else { return None };
    match trie.feed(key) {
        ShortcutMatch::Matched(action) => Some(RouteResult::consumed(vec![super::RouterAction::ShortcutMatched(action)])),
        ShortcutMatch::Pending => Some(RouteResult::consumed_no_action()),
        ShortcutMatch::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, Mods};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent { code, mods: Mods::empty() }
    }

    #[test]
    fn single_key_shortcut_matches_immediately() {
        let mut trie = ShortcutTrie::new();
        trie.rebuild([(vec![key(KeyCode::Char('p'))], "open-palette".to_string())]);
        assert!(matches!(trie.feed(key(KeyCode::Char('p'))), ShortcutMatch::Matched(a) if a == "open-palette"));
    }

    #[test]
    fn chord_prefix_is_pending_until_completed() {
        let mut trie = ShortcutTrie::new();
        trie.rebuild([(vec![key(KeyCode::Char('g')), key(KeyCode::Char('g'))], "top".to_string())]);
        assert!(matches!(trie.feed(key(KeyCode::Char('g'))), ShortcutMatch::Pending));
        assert!(matches!(trie.feed(key(KeyCode::Char('g'))), ShortcutMatch::Matched(a) if a == "top"));
    }

    #[test]
    fn unknown_key_resets_the_chord() {
        let mut trie = ShortcutTrie::new();
        trie.rebuild([(vec![key(KeyCode::Char('g')), key(KeyCode::Char('g'))], "top".to_string())]);
        assert!(matches!(trie.feed(key(KeyCode::Char('g'))), ShortcutMatch::Pending));
        assert!(matches!(trie.feed(key(KeyCode::Char('x'))), ShortcutMatch::None));
        assert!(matches!(trie.feed(key(KeyCode::Char('g'))), ShortcutMatch::Pending));
    }

    #[test]
    fn empty_trie_never_matches() {
        let mut trie = ShortcutTrie::new();
        assert!(matches!(trie.feed(key(KeyCode::Char('p'))), ShortcutMatch::None));
    }
}
