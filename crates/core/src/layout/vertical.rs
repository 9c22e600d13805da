//! Vertical layout: stacks children top-to-bottom (`spec.md` §4.6). Grounded
//! on the teacher's `layouts/vertical.rs` margin-collapsing behavior,
//! retargeted from `ComputedStyle`/`Region` to this crate's `Style`/`Rect`.

use super::size_resolver::{resolve_height, resolve_width};
use super::{Child, ChildLayout, Rect};
use crate::vnode::Unit;

#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalLayout;

impl ChildLayout for VerticalLayout {
    fn arrange(&self, children: &[Child], available: Rect) -> Vec<Rect> {
        let mut rects = Vec::with_capacity(children.len());
        let mut cursor_y = available.y;
        let mut prev_margin_bottom = 0;

        for (i, child) in children.iter().enumerate() {
            let height = resolve_height(child.style.height, available.height, false);
            let width = resolve_width(child.style.width, available.width, true);
            let margin = &child.style.margin;

            // CSS-style margin collapsing: the gap between siblings is
            // max(prev_bottom, this_top), not their sum.
            let effective_top = if i == 0 {
                margin.top
            } else {
                (margin.top - prev_margin_bottom).max(0)
            };
            cursor_y += effective_top;

            rects.push(Rect {
                x: available.x + margin.left,
                y: cursor_y,
                width: if matches!(child.style.width, Unit::Auto) {
                    width
                } else {
                    width.min((available.width - margin.left - margin.right).max(0))
                },
                height,
            });

            cursor_y += height + margin.bottom;
            prev_margin_bottom = margin.bottom;
        }

        rects
    }
}
