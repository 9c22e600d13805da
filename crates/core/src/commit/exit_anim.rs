//! Exit-animation scheduling (`spec.md` §4.5 "Exit animations").

use crate::instance::{InstanceId, RuntimeInstance};
use crate::vnode::{Easing, Key, VNodeTag};

/// A subtree that was unmounted but declared an `exit_transition`. Its local
/// state is kept alive (the cleanup closure is deferred) until the
/// animation completes or the node re-enters with the same
/// `(parent_id, kind, key)` identity.
pub struct PendingExitAnimation {
    pub snapshot: RuntimeInstance,
    pub parent_id: InstanceId,
    pub kind: VNodeTag,
    pub key: Option<Key>,
    pub start_time_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub cleanup: Option<Box<dyn FnOnce()>>,
}

impl PendingExitAnimation {
    pub fn identity(&self) -> (InstanceId, &'static str, Option<&Key>) {
        (self.parent_id, self.kind.name(), self.key.as_ref())
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.start_time_ms + self.duration_ms
    }

    /// Runs the deferred cleanup and discards the exit record. Called when
    /// a re-appearance with matching identity cancels the exit, or when the
    /// animation runs to completion.
    pub fn finish(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Registry of exit animations currently in flight, keyed by the identity
/// that would cancel them on re-appearance.
#[derive(Default)]
pub struct ExitAnimationRegistry {
    pending: Vec<PendingExitAnimation>,
}

impl ExitAnimationRegistry {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn schedule(&mut self, anim: PendingExitAnimation) {
        self.pending.push(anim);
    }

    /// If a re-entrant node with matching `(parent_id, kind, key)` is found
    /// among in-flight exits, cancels it (runs cleanup, discards the
    /// record) and returns `true`. `spec.md` §9 leaves the behavior with
    /// *multiple* simultaneous re-entries of the same key implementation
    /// defined; this cancels the first match found, preserving insertion
    /// order.
    pub fn cancel_if_reentrant(&mut self, parent_id: InstanceId, kind: VNodeTag, key: Option<&Key>) -> bool {
        if let Some(pos) = self
            .pending
            .iter()
            .position(|a| a.parent_id == parent_id && a.kind.name() == kind.name() && a.key.as_ref() == key)
        {
            let anim = self.pending.remove(pos);
            anim.finish();
            true
        } else {
            false
        }
    }

    pub fn retire_completed(&mut self, now_ms: u64) -> Vec<PendingExitAnimation> {
        let mut completed = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if !self.pending[i].is_active(now_ms) {
                completed.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        completed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
