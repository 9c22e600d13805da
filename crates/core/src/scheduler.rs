//! Turn scheduler (`spec.md` §4.2): a single-threaded cooperative scheduler
//! that coalesces heterogeneous work items into ordered batches processed
//! one turn at a time.
//!
//! This module owns only the *queueing and ordering* discipline. The actual
//! work each item triggers (parsing a batch, draining updates, committing,
//! laying out, submitting a frame) is driven by [`crate::app::App`], which
//! calls [`Scheduler::begin_turn`] then walks the returned [`TurnPlan`].

use std::collections::VecDeque;

use crate::backend::EventBatch;

/// One unit of work the scheduler coalesces into a turn.
pub enum WorkItem {
    EventBatch(EventBatch),
    /// Posted whenever the update queue transitions from empty+idle to
    /// holding at least one pending updater.
    UserCommit,
    /// Posted once, right after `start()`, to run the first turn.
    Kick,
    RenderRequest,
    FrameDone,
    FrameError(crate::CoreError),
    Fatal(crate::CoreError),
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkItem::EventBatch(_) => write!(f, "WorkItem::EventBatch"),
            WorkItem::UserCommit => write!(f, "WorkItem::UserCommit"),
            WorkItem::Kick => write!(f, "WorkItem::Kick"),
            WorkItem::RenderRequest => write!(f, "WorkItem::RenderRequest"),
            WorkItem::FrameDone => write!(f, "WorkItem::FrameDone"),
            WorkItem::FrameError(e) => write!(f, "WorkItem::FrameError({e})"),
            WorkItem::Fatal(e) => write!(f, "WorkItem::Fatal({e})"),
        }
    }
}

/// The coalesced contents of one turn, in the order `spec.md` §4.2 requires
/// them to be handled: event batches first, then update-queue drains, then
/// at most one render attempt.
#[derive(Default)]
pub struct TurnPlan {
    pub event_batches: Vec<EventBatch>,
    pub saw_user_commit: bool,
    pub saw_kick: bool,
    pub render_requests: u32,
    pub frame_done_count: u32,
    pub frame_errors: Vec<crate::CoreError>,
    pub fatal: Option<crate::CoreError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Executing,
}

/// Coalesces [`WorkItem`]s while a turn executes; exactly one turn executes
/// at a time, with no nested turns.
pub struct Scheduler {
    pending: VecDeque<WorkItem>,
    state: TurnState,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            state: TurnState::Idle,
        }
    }

    pub fn is_executing(&self) -> bool {
        self.state == TurnState::Executing
    }

    /// Enqueues an item. While a turn is executing, items become part of
    /// the *next* turn.
    pub fn push(&mut self, item: WorkItem) {
        self.pending.push_back(item);
    }

    /// If no turn is currently executing and items are pending, drains all
    /// currently-queued items (insertion order) into a [`TurnPlan`] and
    /// marks the scheduler as executing. Returns `None` if idle with
    /// nothing to do, or if a turn is already executing (nested-turn guard).
    pub fn begin_turn(&mut self) -> Option<TurnPlan> {
        if self.state == TurnState::Executing || self.pending.is_empty() {
            return None;
        }
        self.state = TurnState::Executing;

        let mut plan = TurnPlan::default();
        while let Some(item) = self.pending.pop_front() {
            match item {
                WorkItem::EventBatch(batch) => plan.event_batches.push(batch),
                WorkItem::UserCommit => plan.saw_user_commit = true,
                WorkItem::Kick => plan.saw_kick = true,
                WorkItem::RenderRequest => plan.render_requests += 1,
                WorkItem::FrameDone => plan.frame_done_count += 1,
                WorkItem::FrameError(e) => plan.frame_errors.push(e),
                WorkItem::Fatal(e) => {
                    // Fatal short-circuits: drain remaining items (releasing
                    // any held event batches via their Drop impl) and stop
                    // collecting further work for this turn.
                    plan.fatal = Some(e);
                    self.pending.clear();
                    break;
                }
            }
        }
        Some(plan)
    }

    pub fn end_turn(&mut self) {
        self.state = TurnState::Idle;
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(bytes: &[u8]) -> EventBatch {
        EventBatch::new(bytes.to_vec(), 0, || {})
    }

    #[test]
    fn idle_with_no_work_returns_none() {
        let mut s = Scheduler::new();
        assert!(s.begin_turn().is_none());
    }

    #[test]
    fn one_turn_collects_all_queued_items_in_order() {
        let mut s = Scheduler::new();
        s.push(WorkItem::Kick);
        s.push(WorkItem::EventBatch(batch(b"a")));
        s.push(WorkItem::RenderRequest);
        let plan = s.begin_turn().unwrap();
        assert!(plan.saw_kick);
        assert_eq!(plan.event_batches.len(), 1);
        assert_eq!(plan.render_requests, 1);
        assert!(s.is_executing());
    }

    #[test]
    fn nested_begin_turn_is_rejected_while_executing() {
        let mut s = Scheduler::new();
        s.push(WorkItem::Kick);
        s.begin_turn().unwrap();
        s.push(WorkItem::RenderRequest);
        assert!(s.begin_turn().is_none());
    }

    #[test]
    fn items_pushed_during_a_turn_become_the_next_turn() {
        let mut s = Scheduler::new();
        s.push(WorkItem::Kick);
        let _plan = s.begin_turn().unwrap();
        s.push(WorkItem::RenderRequest);
        s.end_turn();
        let plan2 = s.begin_turn().unwrap();
        assert!(!plan2.saw_kick);
        assert_eq!(plan2.render_requests, 1);
    }

    #[test]
    fn fatal_short_circuits_and_drops_remaining_items() {
        let mut s = Scheduler::new();
        s.push(WorkItem::EventBatch(batch(b"a")));
        s.push(WorkItem::Fatal(crate::CoreError::NoRenderMode));
        s.push(WorkItem::RenderRequest);
        let plan = s.begin_turn().unwrap();
        assert!(plan.fatal.is_some());
        assert!(!s.has_pending());
    }
}
