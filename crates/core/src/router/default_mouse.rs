//! Default mouse routing (`spec.md` §4.7 level 14): press, then release on
//! the same pressable id, is a press action. This is the fallback level —
//! everything more specific (dropdowns, split panes, lists) has already had
//! its chance by the time an event reaches here.

use crate::event::{Event, EventKind, MouseKind};
use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{capabilities_for, Capabilities};

use super::list_routing::ListRoutingState;
use super::{RouteContext, RouteResult, RouterAction};

fn hit_rect(layout: &crate::layout::LayoutTree, id: InstanceId, x: i32, y: i32) -> bool {
    layout
        .rect_by_instance_id
        .get(&id)
        .map(|r| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
        .unwrap_or(false)
}

fn find_pressable_under(tree: &InstanceTree, layout: &crate::layout::LayoutTree, x: i32, y: i32) -> Option<InstanceId> {
    let mut best = None;
    let mut stack = tree.root.into_iter().collect::<Vec<_>>();
    while let Some(id) = stack.pop() {
        let Some(inst) = tree.get(id) else { continue };
        if capabilities_for(inst.tag()).contains(Capabilities::PRESSABLE) && hit_rect(layout, id, x, y) {
            best = Some(id);
        }
        stack.extend(inst.children.iter().copied());
    }
    best
}

pub fn route(state: &mut ListRoutingState, event: &Event, ctx: &RouteContext) -> Option<RouteResult> {
    let EventKind::Mouse(mouse) = event.kind else { return None };
    let (x, y) = (mouse.x as i32, mouse.y as i32);

    match mouse.kind {
        MouseKind::Down => {
            let id = find_pressable_under(ctx.tree, ctx.layout, x, y)?;
            state.pressed_simple = Some(id);
            Some(RouteResult::consumed_no_action())
        }
        MouseKind::Up => {
            let id = state.pressed_simple.take()?;
            if hit_rect(ctx.layout, id, x, y) {
                Some(RouteResult::consumed(vec![RouterAction::Press(id)]))
            } else {
                Some(RouteResult::consumed_no_action())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Mods, MouseButtons, MouseEvent};
    use crate::layout::LayoutTree;

    #[test]
    fn no_pressable_under_cursor_falls_through() {
        let mut state = ListRoutingState::default();
        let tree = InstanceTree::new();
        let layout = LayoutTree::default();
        let ctx = RouteContext { tree: &tree, layout: &layout, now_ms: 0 };
        let down = Event {
            kind: EventKind::Mouse(MouseEvent { kind: MouseKind::Down, buttons: MouseButtons::LEFT, mods: Mods::empty(), x: 0, y: 0, wheel_x: 0, wheel_y: 0 }),
            time_ms: 0,
        };
        assert!(route(&mut state, &down, &ctx).is_none());
    }

    #[test]
    fn release_without_prior_press_falls_through() {
        let mut state = ListRoutingState::default();
        let tree = InstanceTree::new();
        let layout = LayoutTree::default();
        let ctx = RouteContext { tree: &tree, layout: &layout, now_ms: 0 };
        let up = Event {
            kind: EventKind::Mouse(MouseEvent { kind: MouseKind::Up, buttons: MouseButtons::LEFT, mods: Mods::empty(), x: 0, y: 0, wheel_x: 0, wheel_y: 0 }),
            time_ms: 0,
        };
        assert!(route(&mut state, &up, &ctx).is_none());
    }
}
