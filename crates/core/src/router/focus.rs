//! Focus zones, traps, and keyboard traversal (`spec.md` §4.7 level 13,
//! "Focus zones & traps").
//!
//! Zones are discovered fresh each turn by a depth-first preorder walk of
//! the committed tree (`spec.md` §4.7: "Zones are ordered by depth-first
//! preorder of the committed tree"). Trap confinement uses the instance
//! tree's parent pointers directly instead of re-walking subtrees: once the
//! topmost active trap is found, membership is just "is this id, or an
//! ancestor of it, the trap container."

use std::collections::HashMap;

use crate::event::{Event, EventKind, KeyCode, Mods};
use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{capabilities_for, Capabilities, ContainerKind, ContainerPayload, Navigation, VNodePayload, VNodeTag};

use super::{RouteResult, RouterAction};

#[derive(Debug, Clone)]
pub struct FocusZone {
    pub container_id: InstanceId,
    pub navigation: Navigation,
    pub wrap_around: bool,
    pub focusable_ids: Vec<InstanceId>,
}

#[derive(Default)]
pub struct FocusState {
    focused: Option<InstanceId>,
    zones: Vec<FocusZone>,
    zone_last_focused: HashMap<InstanceId, InstanceId>,
    all_focusable: Vec<InstanceId>,
    active_trap: Option<InstanceId>,
}

impl FocusState {
    pub fn focused(&self) -> Option<InstanceId> {
        self.focused
    }

    /// Rebuilds zones/focusable-id lists from the current tree. Cheap
    /// relative to commit/layout; called once per routed event so that
    /// traversal always sees the post-commit tree.
    pub fn rebuild_zones(&mut self, tree: &InstanceTree) {
        self.zones.clear();
        self.all_focusable.clear();

        let Some(root) = tree.root else {
            self.focused = None;
            self.active_trap = None;
            return;
        };

        let mut trap_candidates: Vec<(i32, InstanceId)> = Vec::new();
        walk(tree, root, None, 0, &mut self.zones, &mut self.all_focusable, &mut trap_candidates);

        self.active_trap = trap_candidates.into_iter().max_by_key(|(z, _)| *z).map(|(_, id)| id);

        if let Some(trap) = self.active_trap {
            self.all_focusable.retain(|&id| is_within(tree, id, trap));
            for zone in &mut self.zones {
                zone.focusable_ids.retain(|&id| is_within(tree, id, trap));
            }
        }

        if let Some(id) = self.focused {
            if !self.all_focusable.contains(&id) {
                self.focused = None;
            }
        }
        if self.focused.is_none() {
            if let Some(trap) = self.active_trap {
                if let Some(&restore) = self.zone_last_focused.get(&trap) {
                    if self.all_focusable.contains(&restore) {
                        self.focused = Some(restore);
                    }
                }
            }
        }
    }

    fn zone_of(&self, id: InstanceId) -> Option<usize> {
        self.zones.iter().position(|z| z.focusable_ids.contains(&id))
    }

    fn set_focus(&mut self, next: InstanceId) -> RouteResult {
        let previous = self.focused;
        self.focused = Some(next);
        if let Some(zi) = self.zone_of(next) {
            self.zone_last_focused.insert(self.zones[zi].container_id, next);
        } else if let Some(trap) = self.active_trap {
            self.zone_last_focused.insert(trap, next);
        }
        RouteResult::consumed(vec![RouterAction::FocusChanged { previous, next: Some(next) }])
    }

    fn advance(&mut self, delta: i32) -> Option<RouteResult> {
        if self.all_focusable.is_empty() {
            return None;
        }
        let len = self.all_focusable.len() as i32;
        let current_idx = self
            .focused
            .and_then(|id| self.all_focusable.iter().position(|&x| x == id))
            .map(|i| i as i32)
            .unwrap_or(-1);
        let next_idx = (current_idx + delta).rem_euclid(len) as usize;
        Some(self.set_focus(self.all_focusable[next_idx]))
    }

    fn navigate_within_zone(&mut self, code: KeyCode) -> Option<RouteResult> {
        let focused = self.focused?;
        let zi = self.zone_of(focused)?;
        let zone = &self.zones[zi];
        if matches!(zone.navigation, Navigation::None) || zone.focusable_ids.is_empty() {
            return None;
        }
        let len = zone.focusable_ids.len() as i32;
        let current_idx = zone.focusable_ids.iter().position(|&x| x == focused)? as i32;

        let delta = match (zone.navigation, code) {
            (Navigation::Linear, KeyCode::Up | KeyCode::Left) => -1,
            (Navigation::Linear, KeyCode::Down | KeyCode::Right) => 1,
            (Navigation::Grid { columns }, KeyCode::Up) => -(columns.max(1) as i32),
            (Navigation::Grid { columns }, KeyCode::Down) => columns.max(1) as i32,
            (Navigation::Grid { .. }, KeyCode::Left) => -1,
            (Navigation::Grid { .. }, KeyCode::Right) => 1,
            _ => return None,
        };

        let raw = current_idx + delta;
        let next_idx = if zone.wrap_around {
            raw.rem_euclid(len)
        } else if raw < 0 || raw >= len {
            return Some(RouteResult::consumed_no_action());
        } else {
            raw
        };
        let next_id = self.zones[zi].focusable_ids[next_idx as usize];
        Some(self.set_focus(next_id))
    }

    pub fn route_traversal(&mut self, event: &Event) -> Option<RouteResult> {
        let EventKind::Key(key) = event.kind else { return None };
        match key.code {
            KeyCode::Tab if key.mods.contains(Mods::SHIFT) => self.advance(-1),
            KeyCode::Tab => self.advance(1),
            KeyCode::BackTab => self.advance(-1),
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => self.navigate_within_zone(key.code),
            _ => None,
        }
    }
}

fn is_within(tree: &InstanceTree, id: InstanceId, ancestor: InstanceId) -> bool {
    let mut cur = Some(id);
    while let Some(c) = cur {
        if c == ancestor {
            return true;
        }
        cur = tree.get(c).and_then(|i| i.parent);
    }
    false
}

fn walk(
    tree: &InstanceTree,
    id: InstanceId,
    current_zone: Option<usize>,
    current_z_index: i32,
    zones: &mut Vec<FocusZone>,
    all_focusable: &mut Vec<InstanceId>,
    trap_candidates: &mut Vec<(i32, InstanceId)>,
) {
    let Some(inst) = tree.get(id) else { return };
    let mut zone = current_zone;
    let mut z_index = current_z_index;

    match inst.tag() {
        VNodeTag::Container(ContainerKind::FocusTrap) => trap_candidates.push((z_index, id)),
        VNodeTag::Container(ContainerKind::Modal) => trap_candidates.push((z_index, id)),
        VNodeTag::Container(ContainerKind::Layer) => {
            if let VNodePayload::Container(ContainerPayload::Layer { z_index: z }) = &inst.vnode.payload {
                z_index = *z;
            }
        }
        VNodeTag::Container(ContainerKind::FocusZone) => {
            if let VNodePayload::Container(ContainerPayload::FocusZone { navigation, wrap_around }) = &inst.vnode.payload {
                zones.push(FocusZone {
                    container_id: id,
                    navigation: *navigation,
                    wrap_around: *wrap_around,
                    focusable_ids: Vec::new(),
                });
                zone = Some(zones.len() - 1);
            }
        }
        _ => {}
    }

    if capabilities_for(inst.tag()).contains(Capabilities::FOCUSABLE) {
        all_focusable.push(id);
        if let Some(zi) = zone {
            zones[zi].focusable_ids.push(id);
        }
    }

    for &child in &inst.children {
        walk(tree, child, zone, z_index, zones, all_focusable, trap_candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyEvent;
    use crate::instance::RuntimeInstance;
    use crate::vnode::{InteractiveKind, InteractivePayload, VNode, VNodePayload};

    fn button(id: u64, parent: Option<InstanceId>) -> RuntimeInstance {
        RuntimeInstance {
            id: InstanceId(id),
            parent,
            vnode: VNode {
                tag: VNodeTag::Interactive(InteractiveKind::Button),
                id: None,
                key: None,
                style: Default::default(),
                payload: VNodePayload::Interactive(InteractivePayload::Button { label: "x".into() }),
                exit_transition: None,
                children: Vec::new(),
            },
            children: Vec::new(),
            self_dirty: false,
            dirty: false,
            widget_key: None,
            generation: 0,
        }
    }

    fn build_two_button_tree() -> InstanceTree {
        let mut tree = InstanceTree::new();
        let mut root = button(1, None);
        root.children = vec![InstanceId(2), InstanceId(3)];
        tree.insert(root);
        tree.insert(button(2, Some(InstanceId(1))));
        tree.insert(button(3, Some(InstanceId(1))));
        tree.root = Some(InstanceId(1));
        tree
    }

    #[test]
    fn tab_advances_through_focusable_ids_and_wraps() {
        let tree = build_two_button_tree();
        let mut focus = FocusState::default();
        focus.rebuild_zones(&tree);

        let tab = Event { kind: EventKind::Key(KeyEvent { code: KeyCode::Tab, mods: Mods::empty() }), time_ms: 0 };
        focus.route_traversal(&tab);
        assert_eq!(focus.focused(), Some(InstanceId(1)));
        focus.route_traversal(&tab);
        assert_eq!(focus.focused(), Some(InstanceId(2)));
        focus.route_traversal(&tab);
        assert_eq!(focus.focused(), Some(InstanceId(3)));
        focus.route_traversal(&tab);
        assert_eq!(focus.focused(), Some(InstanceId(1)), "tab wraps back to the first focusable id");
    }

    #[test]
    fn shift_tab_moves_backward() {
        let tree = build_two_button_tree();
        let mut focus = FocusState::default();
        focus.rebuild_zones(&tree);
        focus.focused = Some(InstanceId(2));

        let shift_tab = Event {
            kind: EventKind::Key(KeyEvent { code: KeyCode::Tab, mods: Mods::SHIFT }),
            time_ms: 0,
        };
        focus.route_traversal(&shift_tab);
        assert_eq!(focus.focused(), Some(InstanceId(1)));
    }
}
