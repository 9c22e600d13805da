//! The layout engine (`spec.md` §4.6 "Layout").
//!
//! A pure function over the committed tree plus viewport dimensions: walks
//! the [`InstanceTree`](crate::instance::InstanceTree) from its root,
//! dispatching each container to the layout algorithm implied by its
//! `ContainerKind`, and writes two indexes — by instance id and by public
//! (string) id — the way `spec.md` describes `rect_by_instance_id` and
//! `rect_by_public_id`.
//!
//! Text measurement is out of scope (`spec.md` §1), so there is no
//! intrinsic/content-sizing pass here: `Unit::Auto` resolves to "fill
//! available space" or a fixed default exactly as the teacher's
//! `size_resolver` did before its intrinsic-sizing extensions, which this
//! crate does not need.

pub mod damage;
mod grid;
mod horizontal;
mod size_resolver;
mod vertical;

use std::collections::HashMap;

use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{ContainerKind, ContainerPayload, Style, VNodePayload, VNodeTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn area(&self) -> i64 {
        (self.width.max(0) as i64) * (self.height.max(0) as i64)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Touching counts as mergeable too, per `spec.md` §4.6 "merge
    /// overlapping or touching rects until stable".
    pub fn touches_or_intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn clip(&self, bounds: &Rect) -> Option<Rect> {
        let x1 = self.x.max(bounds.x);
        let y1 = self.y.max(bounds.y);
        let x2 = (self.x + self.width).min(bounds.x + bounds.width);
        let y2 = (self.y + self.height).min(bounds.y + bounds.height);
        if x2 > x1 && y2 > y1 {
            Some(Rect {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
            })
        } else {
            None
        }
    }
}

/// A child awaiting placement: its instance id, style, and the `VNode`
/// tag used to pick sizing defaults.
struct Child {
    id: InstanceId,
    style: Style,
}

trait ChildLayout {
    fn arrange(&self, children: &[Child], available: Rect) -> Vec<Rect>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Breakpoints {
    pub sm_max: u16,
    pub md_max: u16,
    pub lg_max: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

pub fn classify_breakpoint(viewport_width: u16, table: &Breakpoints) -> Breakpoint {
    if viewport_width <= table.sm_max {
        Breakpoint::Small
    } else if viewport_width <= table.md_max {
        Breakpoint::Medium
    } else if viewport_width <= table.lg_max {
        Breakpoint::Large
    } else {
        Breakpoint::ExtraLarge
    }
}

#[derive(Debug, Default)]
pub struct LayoutTree {
    pub rect_by_instance_id: HashMap<InstanceId, Rect>,
    pub rect_by_public_id: HashMap<String, Rect>,
}

/// Computes a fresh layout over the whole committed tree. Callers decide
/// whether a relayout is warranted via
/// [`damage::DamageTracker::should_relayout`] first.
pub fn compute_layout(tree: &InstanceTree, root: InstanceId, viewport: Rect) -> LayoutTree {
    let mut out = LayoutTree::default();
    place(tree, root, viewport, &mut out);
    out
}

fn place(tree: &InstanceTree, id: InstanceId, rect: Rect, out: &mut LayoutTree) {
    let Some(inst) = tree.get(id) else { return };
    out.rect_by_instance_id.insert(id, rect);
    if let Some(public_id) = &inst.vnode.id {
        out.rect_by_public_id.insert(public_id.clone(), rect);
    }
    if !inst.vnode.style.visible {
        return;
    }

    let content_rect = Rect {
        x: rect.x + inst.vnode.style.padding.left,
        y: rect.y + inst.vnode.style.padding.top,
        width: (rect.width - inst.vnode.style.padding.left - inst.vnode.style.padding.right).max(0),
        height: (rect.height - inst.vnode.style.padding.top - inst.vnode.style.padding.bottom).max(0),
    };

    let children: Vec<Child> = inst
        .children
        .iter()
        .filter_map(|&cid| tree.get(cid).map(|c| Child { id: cid, style: c.vnode.style.clone() }))
        .collect();
    if children.is_empty() {
        return;
    }

    let child_rects = arrange(tree, id, &children, content_rect);
    for child in &children {
        if let Some(child_rect) = child_rects.get(&child.id) {
            place(tree, child.id, *child_rect, out);
        }
    }
}

fn arrange(tree: &InstanceTree, parent_id: InstanceId, children: &[Child], available: Rect) -> HashMap<InstanceId, Rect> {
    let Some(parent) = tree.get(parent_id) else { return HashMap::new() };
    let rects: Vec<Rect> = match &parent.vnode.tag {
        VNodeTag::Container(ContainerKind::Row) => horizontal::HorizontalLayout.arrange(children, available),
        VNodeTag::Container(ContainerKind::Column) => vertical::VerticalLayout.arrange(children, available),
        VNodeTag::Container(ContainerKind::Grid) => {
            if let VNodePayload::Container(ContainerPayload::Grid(spec)) = &parent.vnode.payload {
                grid::GridLayout::new(spec).arrange(children, available)
            } else {
                vertical::VerticalLayout.arrange(children, available)
            }
        }
        VNodeTag::Container(ContainerKind::Layers) => children.iter().map(|_| available).collect(),
        VNodeTag::Container(ContainerKind::SplitPane) => {
            if let VNodePayload::Container(ContainerPayload::SplitPane { vertical, ratio }) = &parent.vnode.payload {
                grid::split_pane(children, available, *vertical, *ratio)
            } else {
                vertical::VerticalLayout.arrange(children, available)
            }
        }
        _ => vertical::VerticalLayout.arrange(children, available),
    };
    children.iter().zip(rects).map(|(c, r)| (c.id, r)).collect()
}

pub(crate) use size_resolver::{resolve_height, resolve_width};
