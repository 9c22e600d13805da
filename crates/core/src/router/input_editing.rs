//! Text/paste insertion and full input editing (`spec.md` §4.7 levels 10 and
//! 15, "Input editing").
//!
//! Working state (value, cursor, selection, undo/redo) is kept per focused
//! instance rather than folded into the vnode payload: the controlled
//! `value` only catches up once the app's state update is committed on the
//! next turn. When the controlled value no longer matches what this router
//! last produced, an external reset happened and the undo stack is cleared.

use std::collections::HashMap;

use crate::event::{Event, EventKind, KeyCode, Mods};
use crate::grapheme::{grapheme_byte_index, grapheme_count};
use crate::instance::InstanceId;
use crate::vnode::{InteractiveKind, InteractivePayload, VNodePayload, VNodeTag};

use super::{RouteContext, RouteResult, RouterAction};

struct EditorState {
    working_value: String,
    cursor: usize,
    selection_anchor: Option<usize>,
    undo_stack: Vec<(String, usize)>,
    redo_stack: Vec<(String, usize)>,
}

impl EditorState {
    fn fresh(value: &str) -> Self {
        Self {
            working_value: value.to_string(),
            cursor: grapheme_count(value),
            selection_anchor: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    fn push_undo(&mut self) {
        self.undo_stack.push((self.working_value.clone(), self.cursor));
        self.redo_stack.clear();
    }

    fn clamp_cursor(&mut self) {
        let len = grapheme_count(&self.working_value);
        self.cursor = self.cursor.min(len);
    }
}

#[derive(Default)]
pub struct InputEditingState {
    editors: HashMap<InstanceId, EditorState>,
}

impl InputEditingState {
    /// Returns the editor for `id`, resetting it (and clearing undo/redo) if
    /// the tree's controlled value no longer matches what we last produced.
    fn sync<'a>(&'a mut self, id: InstanceId, controlled_value: &str) -> &'a mut EditorState {
        let needs_reset = match self.editors.get(&id) {
            Some(e) => e.working_value != controlled_value,
            None => true,
        };
        if needs_reset {
            self.editors.insert(id, EditorState::fresh(controlled_value));
        }
        self.editors.get_mut(&id).expect("just inserted or present")
    }
}

fn editable_value<'a>(payload: &'a VNodePayload) -> Option<(&'a str, bool, bool)> {
    match payload {
        VNodePayload::Interactive(InteractivePayload::Input { value, multiline, read_only }) => {
            Some((value.as_str(), *multiline, *read_only))
        }
        VNodePayload::Interactive(InteractivePayload::CodeEditor { value, read_only }) => Some((value.as_str(), true, *read_only)),
        VNodePayload::Interactive(InteractivePayload::CommandPalette { query, .. }) => Some((query.as_str(), false, false)),
        _ => None,
    }
}

fn insert_at(value: &str, cursor: usize, insert: &str) -> String {
    let byte = grapheme_byte_index(value, cursor);
    let mut out = String::with_capacity(value.len() + insert.len());
    out.push_str(&value[..byte]);
    out.push_str(insert);
    out.push_str(&value[byte..]);
    out
}

fn delete_range(value: &str, from: usize, to: usize) -> String {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let byte_lo = grapheme_byte_index(value, lo);
    let byte_hi = grapheme_byte_index(value, hi);
    let mut out = String::with_capacity(value.len());
    out.push_str(&value[..byte_lo]);
    out.push_str(&value[byte_hi..]);
    out
}

fn word_boundary_left(value: &str, from: usize) -> usize {
    let graphemes: Vec<&str> = crate::grapheme::graphemes(value).collect();
    let mut i = from;
    while i > 0 && graphemes[i - 1].chars().all(|c| c.is_whitespace()) {
        i -= 1;
    }
    while i > 0 && !graphemes[i - 1].chars().all(|c| c.is_whitespace()) {
        i -= 1;
    }
    i
}

fn word_boundary_right(value: &str, from: usize) -> usize {
    let graphemes: Vec<&str> = crate::grapheme::graphemes(value).collect();
    let len = graphemes.len();
    let mut i = from;
    while i < len && graphemes[i].chars().all(|c| c.is_whitespace()) {
        i += 1;
    }
    while i < len && !graphemes[i].chars().all(|c| c.is_whitespace()) {
        i += 1;
    }
    i
}

/// Level 10: text/paste insertion for the focused palette query, code
/// editor, or plain input (unless read-only).
pub fn route_text_or_paste(state: &mut InputEditingState, event: &Event, ctx: &RouteContext, focused: Option<InstanceId>) -> Option<RouteResult> {
    let id = focused?;
    let inst = ctx.tree.get(id)?;
    if !matches!(
        inst.tag(),
        VNodeTag::Interactive(InteractiveKind::CommandPalette | InteractiveKind::CodeEditor | InteractiveKind::Input)
    ) {
        return None;
    }
    let (value, _multiline, read_only) = editable_value(&inst.vnode.payload)?;
    if read_only {
        return None;
    }

    let inserted = match event.kind {
        EventKind::Text(ch) => ch.to_string(),
        EventKind::Paste(ref s) => s.clone(),
        _ => return None,
    };

    let editor = state.sync(id, value);
    editor.push_undo();
    editor.working_value = insert_at(&editor.working_value, editor.cursor, &inserted);
    editor.cursor += grapheme_count(&inserted);
    editor.selection_anchor = None;
    Some(RouteResult::consumed(vec![RouterAction::ValueChanged(id, editor.working_value.clone())]))
}

/// Level 15: full input editing on a focused, non-disabled `Input`.
pub fn route_editing(state: &mut InputEditingState, event: &Event, ctx: &RouteContext, focused: Option<InstanceId>) -> Option<RouteResult> {
    let EventKind::Key(key) = event.kind else { return None };
    let id = focused?;
    let inst = ctx.tree.get(id)?;
    if !matches!(inst.tag(), VNodeTag::Interactive(InteractiveKind::Input)) {
        return None;
    }
    let (value, multiline, read_only) = editable_value(&inst.vnode.payload)?;
    if read_only {
        return None;
    }

    let editor = state.sync(id, value);
    let shift = key.mods.contains(Mods::SHIFT);
    let ctrl = key.mods.contains(Mods::CTRL);

    match key.code {
        KeyCode::Left => {
            let target = if ctrl { word_boundary_left(&editor.working_value, editor.cursor) } else { editor.cursor.saturating_sub(1) };
            move_cursor(editor, target, shift);
            Some(RouteResult::consumed_no_action())
        }
        KeyCode::Right => {
            let target = if ctrl { word_boundary_right(&editor.working_value, editor.cursor) } else { editor.cursor + 1 };
            move_cursor(editor, target, shift);
            Some(RouteResult::consumed_no_action())
        }
        KeyCode::Home => {
            move_cursor(editor, 0, shift);
            Some(RouteResult::consumed_no_action())
        }
        KeyCode::End => {
            let end = grapheme_count(&editor.working_value);
            move_cursor(editor, end, shift);
            Some(RouteResult::consumed_no_action())
        }
        KeyCode::Backspace => {
            let result = if let Some(anchor) = editor.selection_anchor.take() {
                editor.push_undo();
                let new_value = delete_range(&editor.working_value, anchor, editor.cursor);
                editor.cursor = anchor.min(editor.cursor);
                new_value
            } else if ctrl {
                let from = word_boundary_left(&editor.working_value, editor.cursor);
                editor.push_undo();
                let new_value = delete_range(&editor.working_value, from, editor.cursor);
                editor.cursor = from;
                new_value
            } else if editor.cursor > 0 {
                editor.push_undo();
                let new_value = delete_range(&editor.working_value, editor.cursor - 1, editor.cursor);
                editor.cursor -= 1;
                new_value
            } else {
                return Some(RouteResult::consumed_no_action());
            };
            editor.working_value = result;
            Some(RouteResult::consumed(vec![RouterAction::ValueChanged(id, editor.working_value.clone())]))
        }
        KeyCode::Delete => {
            let result = if let Some(anchor) = editor.selection_anchor.take() {
                editor.push_undo();
                let new_value = delete_range(&editor.working_value, anchor, editor.cursor);
                editor.cursor = anchor.min(editor.cursor);
                new_value
            } else if ctrl {
                let to = word_boundary_right(&editor.working_value, editor.cursor);
                editor.push_undo();
                let new_value = delete_range(&editor.working_value, editor.cursor, to);
                new_value
            } else {
                let len = grapheme_count(&editor.working_value);
                if editor.cursor >= len {
                    return Some(RouteResult::consumed_no_action());
                }
                editor.push_undo();
                delete_range(&editor.working_value, editor.cursor, editor.cursor + 1)
            };
            editor.working_value = result;
            Some(RouteResult::consumed(vec![RouterAction::ValueChanged(id, editor.working_value.clone())]))
        }
        KeyCode::Enter if multiline => {
            editor.push_undo();
            editor.working_value = insert_at(&editor.working_value, editor.cursor, "\n");
            editor.cursor += 1;
            Some(RouteResult::consumed(vec![RouterAction::ValueChanged(id, editor.working_value.clone())]))
        }
        KeyCode::Enter => Some(RouteResult::consumed(vec![RouterAction::Press(id)])),
        KeyCode::Char('a') if ctrl => {
            editor.selection_anchor = Some(0);
            editor.cursor = grapheme_count(&editor.working_value);
            Some(RouteResult::consumed_no_action())
        }
        KeyCode::Char('c') if ctrl => {
            let text = selected_text(editor);
            Some(RouteResult::consumed(vec![RouterAction::ClipboardWrite(text)]))
        }
        KeyCode::Char('x') if ctrl => {
            let anchor = editor.selection_anchor.take().unwrap_or(editor.cursor);
            let text = selected_text_between(&editor.working_value, anchor, editor.cursor);
            editor.push_undo();
            editor.working_value = delete_range(&editor.working_value, anchor, editor.cursor);
            editor.cursor = anchor.min(editor.cursor);
            Some(RouteResult::consumed(vec![
                RouterAction::ClipboardCut(text.clone()),
                RouterAction::ValueChanged(id, editor.working_value.clone()),
            ]))
        }
        KeyCode::Char('z') if ctrl => {
            if let Some((prev_value, prev_cursor)) = editor.undo_stack.pop() {
                editor.redo_stack.push((editor.working_value.clone(), editor.cursor));
                editor.working_value = prev_value;
                editor.cursor = prev_cursor;
                Some(RouteResult::consumed_no_action())
            } else {
                Some(RouteResult::consumed_no_action())
            }
        }
        KeyCode::Char('y') if ctrl => {
            if let Some((next_value, next_cursor)) = editor.redo_stack.pop() {
                editor.undo_stack.push((editor.working_value.clone(), editor.cursor));
                editor.working_value = next_value;
                editor.cursor = next_cursor;
                Some(RouteResult::consumed_no_action())
            } else {
                Some(RouteResult::consumed_no_action())
            }
        }
        _ => None,
    }
}

fn move_cursor(editor: &mut EditorState, target: usize, shift: bool) {
    if shift {
        if editor.selection_anchor.is_none() {
            editor.selection_anchor = Some(editor.cursor);
        }
    } else {
        editor.selection_anchor = None;
    }
    editor.cursor = target;
    editor.clamp_cursor();
}

fn selected_text(editor: &EditorState) -> String {
    match editor.selection_anchor {
        Some(anchor) => selected_text_between(&editor.working_value, anchor, editor.cursor),
        None => String::new(),
    }
}

fn selected_text_between(value: &str, from: usize, to: usize) -> String {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let byte_lo = grapheme_byte_index(value, lo);
    let byte_hi = grapheme_byte_index(value, hi);
    value[byte_lo..byte_hi].to_string()
}
