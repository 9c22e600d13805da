//! Dirty tracking, identity-diff damage, and the incremental-vs-full render
//! decision (`spec.md` §4.6).
//!
//! Identity-diff damage rides on bits the commit engine already maintains:
//! [`RuntimeInstance::self_dirty`](crate::instance::RuntimeInstance) is set
//! exactly on the "mutate in place" and "new allocation" branches of
//! `spec.md` §4.5's reconciliation rule, and
//! [`InstanceTree::recompute_dirty_bit`](crate::instance::InstanceTree::recompute_dirty_bit)
//! propagates it upward — so a post-commit traversal that stops descending
//! once it hits a dirty, damage-granular node *is* the identity-diff.

use std::collections::HashSet;

use crate::commit::CommitOutcome;
use crate::instance::{InstanceId, InstanceTree};
use crate::vnode::{capabilities_for, Capabilities, VNodeTag};

use super::{LayoutTree, Rect};

/// Merged damage area above this percentage of the viewport area falls back
/// to a full render (`spec.md` §4.6).
pub const INCREMENTAL_AREA_THRESHOLD_PERCENT: i64 = 45;

/// A subtree is "damage-granular" if its kind is leaf-like or explicitly
/// interactive: traversal descends no further into it when recording
/// damage, since the whole node repaints as one unit.
pub fn is_damage_granular(tag: VNodeTag) -> bool {
    matches!(tag, VNodeTag::Leaf(_) | VNodeTag::Interactive(_))
}

/// A node is "routing-relevant" if its kind may influence event routing —
/// exactly the set with `REQUIRES_ROUTING_REBUILD` in the per-kind
/// protocol table (`spec.md` §9).
pub fn is_routing_relevant(tag: VNodeTag) -> bool {
    capabilities_for(tag).contains(Capabilities::REQUIRES_ROUTING_REBUILD)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyVersions {
    pub render: u64,
    pub layout: u64,
    pub view: u64,
}

/// The three app-level dirty flags (`spec.md` §4.6 "Dirty tracking").
///
/// Each mark bumps a version counter rather than a bool. A turn takes a
/// [`snapshot`](Self::snapshot) before doing work and
/// [`clear_since`](Self::clear_since) after: a flag only clears if its
/// version is still the one from the snapshot, so a mark that lands
/// *during* commit/render (e.g. a tick handler enqueuing more state) is not
/// silently dropped.
#[derive(Debug, Default)]
pub struct DirtyFlags {
    current: DirtyVersions,
    baseline: DirtyVersions,
}

impl DirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_render(&mut self) {
        self.current.render = self.current.render.wrapping_add(1);
    }

    /// Geometry-affecting events also mark `RENDER` (`spec.md` §4.6).
    pub fn mark_layout(&mut self) {
        self.current.layout = self.current.layout.wrapping_add(1);
        self.mark_render();
    }

    pub fn mark_view(&mut self) {
        self.current.view = self.current.view.wrapping_add(1);
    }

    pub fn render_dirty(&self) -> bool {
        self.current.render != self.baseline.render
    }

    pub fn layout_dirty(&self) -> bool {
        self.current.layout != self.baseline.layout
    }

    pub fn view_dirty(&self) -> bool {
        self.current.view != self.baseline.view
    }

    pub fn snapshot(&self) -> DirtyVersions {
        self.current
    }

    pub fn clear_since(&mut self, snapshot: &DirtyVersions) {
        if self.current.render == snapshot.render {
            self.baseline.render = snapshot.render;
        }
        if self.current.layout == snapshot.layout {
            self.baseline.layout = snapshot.layout;
        }
        if self.current.view == snapshot.view {
            self.baseline.view = snapshot.view;
        }
    }
}

pub enum RenderDecision {
    Full,
    Incremental(Vec<Rect>),
}

/// The per-turn facts needed to pick incremental vs. full render
/// (`spec.md` §4.6 "Incremental vs full render").
pub struct RenderContext<'a> {
    pub tree: &'a InstanceTree,
    pub outcome: &'a CommitOutcome,
    pub layout: &'a LayoutTree,
    pub prev_layout: Option<&'a LayoutTree>,
    pub viewport: Rect,
    pub theme_id: u64,
    pub explicit_layout_requested: bool,
    pub transitions_active: bool,
    pub overlay_open: bool,
    pub prev_focus_public_id: Option<&'a str>,
    pub next_focus_public_id: Option<&'a str>,
}

/// Tracks dirty flags plus the facts needed to tell whether the *next*
/// frame is even eligible for incremental render.
#[derive(Debug, Default)]
pub struct DamageTracker {
    dirty: DirtyFlags,
    rendered_before: bool,
    last_viewport: Option<Rect>,
    last_theme_id: Option<u64>,
}

impl DamageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirty_flags(&mut self) -> &mut DirtyFlags {
        &mut self.dirty
    }

    /// Whether a relayout is warranted this turn. Callers check this before
    /// calling [`super::compute_layout`]; a render with no layout change
    /// still runs the damage decision against the previous layout tree.
    pub fn should_relayout(&self) -> bool {
        self.dirty.layout_dirty()
    }

    /// Resets render-eligibility state, e.g. after `stop`/`start` or a
    /// fatal fault (`spec.md` §5), so the next frame is forced full.
    pub fn reset_rendered(&mut self) {
        self.rendered_before = false;
    }

    pub fn decide(&mut self, ctx: &RenderContext) -> RenderDecision {
        let eligible = self.rendered_before
            && !ctx.explicit_layout_requested
            && !ctx.transitions_active
            && !ctx.overlay_open
            && self.last_viewport == Some(ctx.viewport)
            && self.last_theme_id == Some(ctx.theme_id);

        self.rendered_before = true;
        self.last_viewport = Some(ctx.viewport);
        self.last_theme_id = Some(ctx.theme_id);

        if !eligible {
            return RenderDecision::Full;
        }

        let mut rects = collect_changed_rects(ctx.tree, ctx.outcome.root, ctx.layout);
        rects.extend(collect_removed_rects(ctx.prev_layout, &ctx.outcome.unmounted));
        rects.extend(focus_change_rects(ctx.layout, ctx.prev_layout, ctx.prev_focus_public_id, ctx.next_focus_public_id));

        let clipped: Vec<Rect> = rects.into_iter().filter_map(|r| r.clip(&ctx.viewport)).collect();
        let merged = merge_rects(clipped);

        let viewport_area = ctx.viewport.area();
        let damage_area: i64 = merged.iter().map(Rect::area).sum();
        if viewport_area > 0 && damage_area * 100 > viewport_area * INCREMENTAL_AREA_THRESHOLD_PERCENT {
            RenderDecision::Full
        } else {
            RenderDecision::Incremental(merged)
        }
    }
}

/// Walks from `root`, collecting the rect of every dirty, damage-granular
/// node and stopping descent there; descends through non-granular dirty
/// containers to find their dirty descendants.
fn collect_changed_rects(tree: &InstanceTree, root: InstanceId, layout: &LayoutTree) -> Vec<Rect> {
    let mut out = Vec::new();
    walk_changed(tree, root, layout, &mut out);
    out
}

fn walk_changed(tree: &InstanceTree, id: InstanceId, layout: &LayoutTree, out: &mut Vec<Rect>) {
    let Some(inst) = tree.get(id) else { return };

    if inst.self_dirty {
        if let Some(rect) = layout.rect_by_instance_id.get(&id) {
            out.push(*rect);
        }
        if is_damage_granular(inst.tag()) {
            return;
        }
    }

    if !inst.dirty {
        return;
    }
    for &child in &inst.children {
        walk_changed(tree, child, layout, out);
    }
}

fn collect_removed_rects(prev_layout: Option<&LayoutTree>, removed: &[InstanceId]) -> Vec<Rect> {
    let Some(prev_layout) = prev_layout else { return Vec::new() };
    removed.iter().filter_map(|id| prev_layout.rect_by_instance_id.get(id).copied()).collect()
}

/// When the focused id changes, both its previous and next rects join the
/// damage set (`spec.md` §4.6 "Focus change repaint").
fn focus_change_rects(
    layout: &LayoutTree,
    prev_layout: Option<&LayoutTree>,
    prev_focus: Option<&str>,
    next_focus: Option<&str>,
) -> Vec<Rect> {
    if prev_focus == next_focus {
        return Vec::new();
    }
    let mut out = Vec::new();
    if let Some(id) = prev_focus {
        if let Some(rect) = prev_layout.unwrap_or(layout).rect_by_public_id.get(id) {
            out.push(*rect);
        }
    }
    if let Some(id) = next_focus {
        if let Some(rect) = layout.rect_by_public_id.get(id) {
            out.push(*rect);
        }
    }
    out
}

/// Merges overlapping or touching rects until no pair can merge further
/// (`spec.md` §4.6). O(n^2) passes; damage sets are small per turn.
pub fn merge_rects(mut rects: Vec<Rect>) -> Vec<Rect> {
    loop {
        let mut merged_any = false;
        'outer: for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                if rects[i].touches_or_intersects(&rects[j]) {
                    let union = rects[i].union(&rects[j]);
                    rects[j] = union;
                    rects.remove(i);
                    merged_any = true;
                    break 'outer;
                }
            }
        }
        if !merged_any {
            return rects;
        }
    }
}

/// Instance ids whose change should trigger a routing-rebuild pass next
/// turn (`spec.md` §4.6 "routing-relevant").
pub fn routing_rebuild_needed(tree: &InstanceTree, outcome: &CommitOutcome) -> bool {
    let mut seen: HashSet<InstanceId> = HashSet::new();
    for &id in outcome.mounted.iter().chain(outcome.unmounted.iter()) {
        if seen.insert(id) {
            if let Some(inst) = tree.get(id) {
                if is_routing_relevant(inst.tag()) {
                    return true;
                }
            } else if outcome.unmounted.contains(&id) {
                // Unmounted instances are already gone from the tree; a
                // removed routing-relevant node still needs a rebuild, but
                // without its tag we can't classify it here. Callers that
                // need certainty should check capabilities before removal.
                continue;
            }
        }
    }
    false
}
