//! Split-pane divider drag (`spec.md` §4.7 level 6).
//!
//! Down near the divider enters a drag; subsequent moves update the split
//! ratio; up ends the drag. A double-click near the divider toggles
//! collapse instead of starting a drag.

use crate::event::{Event, EventKind, MouseKind};
use crate::fraction::Fraction;
use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{ContainerKind, ContainerPayload, VNodePayload, VNodeTag};

use super::{RouteContext, RouteResult, RouterAction};

const DIVIDER_HIT_MARGIN: i32 = 1;
const DOUBLE_CLICK_WINDOW_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
struct Drag {
    pane_id: InstanceId,
    vertical: bool,
}

#[derive(Default)]
pub struct SplitPaneState {
    drag: Option<Drag>,
    last_click: Option<(InstanceId, u64)>,
    collapsed: std::collections::HashSet<InstanceId>,
}

fn divider_position(layout: &crate::layout::LayoutTree, pane_id: InstanceId, vertical: bool, ratio: Fraction) -> Option<i32> {
    let rect = layout.rect_by_instance_id.get(&pane_id)?;
    if vertical {
        Some(rect.y + (ratio * Fraction::from(rect.height)).floor() as i32)
    } else {
        Some(rect.x + (ratio * Fraction::from(rect.width)).floor() as i32)
    }
}

fn near_divider(layout: &crate::layout::LayoutTree, pane_id: InstanceId, vertical: bool, ratio: Fraction, x: i32, y: i32) -> bool {
    let Some(pos) = divider_position(layout, pane_id, vertical, ratio) else { return false };
    let coord = if vertical { y } else { x };
    (coord - pos).abs() <= DIVIDER_HIT_MARGIN
}

fn find_split_pane_under(tree: &InstanceTree) -> Vec<(InstanceId, bool, Fraction)> {
    let mut out = Vec::new();
    if let Some(root) = tree.root {
        collect(tree, root, &mut out);
    }
    out
}

fn collect(tree: &InstanceTree, id: InstanceId, out: &mut Vec<(InstanceId, bool, Fraction)>) {
    let Some(inst) = tree.get(id) else { return };
    if let VNodeTag::Container(ContainerKind::SplitPane) = inst.tag() {
        if let VNodePayload::Container(ContainerPayload::SplitPane { vertical, ratio }) = &inst.vnode.payload {
            out.push((id, *vertical, *ratio));
        }
    }
    for &child in &inst.children {
        collect(tree, child, out);
    }
}

pub fn route_mouse(state: &mut SplitPaneState, event: &Event, ctx: &RouteContext) -> Option<RouteResult> {
    let EventKind::Mouse(mouse) = event.kind else { return None };
    let (x, y) = (mouse.x as i32, mouse.y as i32);

    if let Some(drag) = state.drag {
        return match mouse.kind {
            MouseKind::Move => {
                let coord = if drag.vertical { y } else { x };
                let rect = ctx.layout.rect_by_instance_id.get(&drag.pane_id)?;
                let total = if drag.vertical { rect.height } else { rect.width };
                let origin = if drag.vertical { rect.y } else { rect.x };
                if total <= 0 {
                    return Some(RouteResult::consumed_no_action());
                }
                let ratio = Fraction::new(((coord - origin).clamp(0, total)) as i64, total as i64);
                Some(RouteResult::consumed(vec![RouterAction::ScrollBy(drag.pane_id, 0, 0), RouterAction::SelectionChanged(drag.pane_id, (ratio.floor() as usize))]))
            }
            MouseKind::Up => {
                state.drag = None;
                Some(RouteResult::consumed_no_action())
            }
            _ => Some(RouteResult::consumed_no_action()),
        };
    }

    if mouse.kind != MouseKind::Down {
        return None;
    }

    for (pane_id, vertical, ratio) in find_split_pane_under(ctx.tree) {
        if !near_divider(ctx.layout, pane_id, vertical, ratio, x, y) {
            continue;
        }

        let is_double_click = state
            .last_click
            .map(|(id, t)| id == pane_id && ctx.now_ms.saturating_sub(t) <= DOUBLE_CLICK_WINDOW_MS)
            .unwrap_or(false);
        state.last_click = Some((pane_id, ctx.now_ms));

        if is_double_click {
            if state.collapsed.contains(&pane_id) {
                state.collapsed.remove(&pane_id);
            } else {
                state.collapsed.insert(pane_id);
            }
            return Some(RouteResult::consumed(vec![RouterAction::DoubleClick(pane_id)]));
        }

        state.drag = Some(Drag { pane_id, vertical });
        return Some(RouteResult::consumed_no_action());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Mods, MouseButtons, MouseEvent};
    use crate::layout::{LayoutTree, Rect};

    fn mouse_event(kind: MouseKind, x: u16, y: u16) -> Event {
        Event {
            kind: EventKind::Mouse(MouseEvent { kind, buttons: MouseButtons::LEFT, mods: Mods::empty(), x, y, wheel_x: 0, wheel_y: 0 }),
            time_ms: 0,
        }
    }

    #[test]
    fn no_split_pane_falls_through() {
        let mut state = SplitPaneState::default();
        let tree = InstanceTree::new();
        let layout = LayoutTree::default();
        let ctx = RouteContext { tree: &tree, layout: &layout, now_ms: 0 };
        let down = mouse_event(MouseKind::Down, 5, 5);
        assert!(route_mouse(&mut state, &down, &ctx).is_none());
    }

    #[test]
    fn divider_position_is_midpoint_for_half_ratio() {
        let mut layout = LayoutTree::default();
        layout.rect_by_instance_id.insert(InstanceId(1), Rect { x: 0, y: 0, width: 100, height: 10 });
        let pos = divider_position(&layout, InstanceId(1), false, Fraction::new(1, 2));
        assert_eq!(pos, Some(50));
    }
}
