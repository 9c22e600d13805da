//! Pooled per-frame scratch storage (`spec.md` §5/§9 "pooled scratch
//! structures").
//!
//! The source caches dozens of reusable vectors/maps on the renderer
//! instance; `spec.md` §9 calls for grouping them into a single struct owned
//! by the app and threaded as `&mut FrameScratch`, with every consuming
//! function clearing the slots it uses at entry so nested calls never
//! observe foreign contents left over from a previous turn.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::instance::InstanceId;
use crate::layout::Rect;

/// Scratch used by [`crate::commit::CommitEngine::commit`]'s bookkeeping:
/// mounted/reused/unmounted id lists and the interactive-id uniqueness map
/// (`spec.md` §4.5 "interactive-id scratch map").
#[derive(Debug, Default)]
pub struct CommitScratch {
    pub mounted: Vec<InstanceId>,
    pub reused: Vec<InstanceId>,
    pub unmounted: Vec<InstanceId>,
    pub interactive_ids: HashMap<String, InstanceId>,
}

impl CommitScratch {
    pub fn clear(&mut self) {
        self.mounted.clear();
        self.reused.clear();
        self.unmounted.clear();
        self.interactive_ids.clear();
    }
}

/// Scratch used by the damage pass: the raw rect list before merging, and
/// the merge pass's working copy (`spec.md` §4.6).
#[derive(Debug, Default)]
pub struct DamageScratch {
    pub candidate_rects: Vec<Rect>,
    pub merged_rects: Vec<Rect>,
}

impl DamageScratch {
    pub fn clear(&mut self) {
        self.candidate_rects.clear();
        self.merged_rects.clear();
    }
}

/// Scratch used by the event router's precedence chain (`spec.md` §4.7):
/// the ordered stack of candidate instance ids considered for a given
/// event, reused across the fifteen precedence levels instead of
/// allocating a fresh `Vec` per level. Both lists are almost always a
/// handful of ids deep (a focus chain rarely nests past a few zones/traps),
/// so they're inline-backed the same way the teacher's `Strip` avoids a
/// heap `Vec` for the common small-segment-count case.
#[derive(Debug, Default)]
pub struct RouterScratch {
    pub candidates: SmallVec<[InstanceId; 8]>,
    pub focus_chain: SmallVec<[InstanceId; 8]>,
}

impl RouterScratch {
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.focus_chain.clear();
    }
}

/// Scratch used by the drawlist opcode builder (`spec.md` §6): the clip
/// stack must balance push/pop within a single frame, so it is cleared
/// (not just emptied by balanced pops) at the start of every build to
/// guarantee a clean start even after a build aborted mid-frame.
#[derive(Debug, Default)]
pub struct DrawlistScratch {
    pub clip_stack: Vec<Rect>,
}

impl DrawlistScratch {
    pub fn clear(&mut self) {
        self.clip_stack.clear();
    }
}

/// The renderer's single pooled-scratch struct (`spec.md` §9's
/// re-architecture note groups "dozens of reusable vectors/maps" this way).
/// Each sub-struct's shape matches the scratch a specific stage needs
/// (`CommitEngine::commit`, the damage pass, the router, the drawlist
/// builder); every stage clears only the sub-struct(s) it uses before
/// reading them.
#[derive(Debug, Default)]
pub struct FrameScratch {
    pub commit: CommitScratch,
    pub damage: DamageScratch,
    pub router: RouterScratch,
    pub drawlist: DrawlistScratch,
}

impl FrameScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_all(&mut self) {
        self.commit.clear();
        self.damage.clear();
        self.router.clear();
        self.drawlist.clear();
    }
}
