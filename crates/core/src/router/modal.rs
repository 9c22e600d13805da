//! Layer/modal Escape and backdrop-click routing (`spec.md` §4.7 levels 3
//! and 5).
//!
//! Modals are `Container(Modal)` nodes; the layer stack is walked top-down
//! (innermost `Layer` z-index first) looking for the first modal whose
//! `close_on_escape`/`close_on_backdrop` applies.

use crate::event::{Event, EventKind, KeyCode, MouseKind};
use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{ContainerKind, ContainerPayload, VNodePayload, VNodeTag};

use super::{RouteContext, RouteResult, RouterAction};

/// Collects every mounted `Modal` container with the z-index of its
/// nearest enclosing `Layer` (0 if none), ordered innermost/highest-first
/// ("walking the layer stack top-down").
fn modal_stack(tree: &InstanceTree) -> Vec<(i32, InstanceId, bool, bool)> {
    let mut out = Vec::new();
    if let Some(root) = tree.root {
        collect(tree, root, 0, &mut out);
    }
    out.sort_by(|a, b| b.0.cmp(&a.0));
    out
}

fn collect(tree: &InstanceTree, id: InstanceId, z: i32, out: &mut Vec<(i32, InstanceId, bool, bool)>) {
    let Some(inst) = tree.get(id) else { return };
    let mut z_index = z;
    if let VNodeTag::Container(ContainerKind::Layer) = inst.tag() {
        if let VNodePayload::Container(ContainerPayload::Layer { z_index: zi }) = &inst.vnode.payload {
            z_index = *zi;
        }
    }
    if let VNodeTag::Container(ContainerKind::Modal) = inst.tag() {
        if let VNodePayload::Container(ContainerPayload::Modal { close_on_escape, close_on_backdrop }) = &inst.vnode.payload {
            out.push((z_index, id, *close_on_escape, *close_on_backdrop));
        }
    }
    for &child in &inst.children {
        collect(tree, child, z_index, out);
    }
}

pub fn route_escape(event: &Event, ctx: &RouteContext) -> Option<RouteResult> {
    let EventKind::Key(key) = event.kind else { return None };
    if key.code != KeyCode::Esc {
        return None;
    }
    for (_, id, close_on_escape, _) in modal_stack(ctx.tree) {
        if close_on_escape {
            return Some(RouteResult::consumed(vec![RouterAction::RequestClose(id)]));
        }
    }
    None
}

fn contains_point(layout: &crate::layout::LayoutTree, modal_id: InstanceId, x: i32, y: i32) -> bool {
    layout
        .rect_by_instance_id
        .get(&modal_id)
        .map(|r| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
        .unwrap_or(false)
}

pub fn route_backdrop_mouse(event: &Event, ctx: &RouteContext) -> Option<RouteResult> {
    let EventKind::Mouse(mouse) = event.kind else { return None };
    if mouse.kind != MouseKind::Down {
        return None;
    }
    for (_, id, _, close_on_backdrop) in modal_stack(ctx.tree) {
        if close_on_backdrop {
            let inside = contains_point(ctx.layout, id, mouse.x as i32, mouse.y as i32);
            if !inside {
                return Some(RouteResult::consumed(vec![RouterAction::RequestClose(id)]));
            }
            return Some(RouteResult::consumed_no_action());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyEvent, Mods};

    #[test]
    fn no_modal_falls_through() {
        let tree = InstanceTree::new();
        let layout = crate::layout::LayoutTree::default();
        let ctx = RouteContext { tree: &tree, layout: &layout, now_ms: 0 };
        let esc = Event { kind: EventKind::Key(KeyEvent { code: KeyCode::Esc, mods: Mods::empty() }), time_ms: 0 };
        assert!(route_escape(&esc, &ctx).is_none());
    }

    #[test]
    fn non_escape_key_falls_through() {
        let tree = InstanceTree::new();
        let layout = crate::layout::LayoutTree::default();
        let ctx = RouteContext { tree: &tree, layout: &layout, now_ms: 0 };
        let key = Event { kind: EventKind::Key(KeyEvent { code: KeyCode::Enter, mods: Mods::empty() }), time_ms: 0 };
        assert!(route_escape(&key, &ctx).is_none());
    }
}
