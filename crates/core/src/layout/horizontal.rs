//! Horizontal layout: stacks children left-to-right (`spec.md` §4.6).
//! Mirror of [`super::vertical::VerticalLayout`] with the fill axis swapped,
//! grounded on the teacher's `layouts/horizontal.rs`.

use super::size_resolver::{resolve_height, resolve_width};
use super::{Child, ChildLayout, Rect};
use crate::vnode::Unit;

#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalLayout;

impl ChildLayout for HorizontalLayout {
    fn arrange(&self, children: &[Child], available: Rect) -> Vec<Rect> {
        let mut rects = Vec::with_capacity(children.len());
        let mut cursor_x = available.x;
        let mut prev_margin_right = 0;

        for (i, child) in children.iter().enumerate() {
            let width = resolve_width(child.style.width, available.width, false);
            let height = resolve_height(child.style.height, available.height, true);
            let margin = &child.style.margin;

            let effective_left = if i == 0 {
                margin.left
            } else {
                (margin.left - prev_margin_right).max(0)
            };
            cursor_x += effective_left;

            rects.push(Rect {
                x: cursor_x,
                y: available.y + margin.top,
                width,
                height: if matches!(child.style.height, Unit::Auto) {
                    height
                } else {
                    height.min((available.height - margin.top - margin.bottom).max(0))
                },
            });

            cursor_x += width + margin.right;
            prev_margin_right = margin.right;
        }

        rects
    }
}
