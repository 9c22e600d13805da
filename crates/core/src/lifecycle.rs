//! Lifecycle state machine (`spec.md` §4.1).
//!
//! ```text
//! Created --start()--> Running --stop()--> Stopped --start()--> Running
//!                        |                   |
//!                        +-- doFatal() --> Faulted (terminal except dispose)
//!                        +-- dispose() --> Disposed (terminal)
//! ```

use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
    Faulted,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Idle,
    Starting,
    Stopping,
}

/// Guards operational state and re-entrancy for every public API method.
pub struct Lifecycle {
    state: LifecycleState,
    busy: Busy,
    /// Bumped by `stop`; an in-flight poll whose token is stale discards its
    /// result without touching state (`spec.md` §5 "Cancellation").
    poll_token: u64,
    frames_in_flight: u8,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            busy: Busy::Idle,
            poll_token: 0,
            frames_in_flight: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn poll_token(&self) -> u64 {
        self.poll_token
    }

    pub fn frames_in_flight(&self) -> u8 {
        self.frames_in_flight
    }

    pub fn note_frame_submitted(&mut self) {
        self.frames_in_flight = self.frames_in_flight.saturating_add(1);
    }

    pub fn note_frame_acked(&mut self) {
        self.frames_in_flight = self.frames_in_flight.saturating_sub(1);
    }

    /// Asserts the machine is in a state that accepts ordinary API calls.
    pub fn assert_operational(&self, method: &'static str) -> Result<()> {
        match self.state {
            LifecycleState::Running => Ok(()),
            _ => Err(CoreError::InvalidState(format!(
                "{method} requires Running, found {:?}",
                self.state
            ))),
        }
    }

    pub fn begin_start(&mut self) -> Result<()> {
        match (self.state, self.busy) {
            (_, Busy::Stopping) => Err(CoreError::InvalidState(
                "start() while stop() is in flight".into(),
            )),
            (LifecycleState::Created | LifecycleState::Stopped, Busy::Idle) => {
                self.busy = Busy::Starting;
                Ok(())
            }
            (other, _) => Err(CoreError::InvalidState(format!(
                "start() requires Created or Stopped, found {other:?}"
            ))),
        }
    }

    pub fn commit_start(&mut self) {
        self.state = LifecycleState::Running;
        self.busy = Busy::Idle;
    }

    /// Reverts `begin_start`'s `Busy::Starting` guard without advancing
    /// `state`, for a `start()` that discovers a config problem (no render
    /// mode, capability mismatch) before the backend is told to start.
    /// `spec.md` scenario 1: the lifecycle must still read `Created` (or
    /// `Stopped`) afterward, not `Running`.
    pub fn cancel_start(&mut self) {
        self.busy = Busy::Idle;
    }

    pub fn begin_stop(&mut self) -> Result<()> {
        match (self.state, self.busy) {
            (_, Busy::Starting) => Err(CoreError::InvalidState(
                "stop() while start() is in flight".into(),
            )),
            (LifecycleState::Running, Busy::Idle) => {
                self.busy = Busy::Stopping;
                Ok(())
            }
            (other, _) => Err(CoreError::InvalidState(format!(
                "stop() requires Running, found {other:?}"
            ))),
        }
    }

    pub fn commit_stop(&mut self) {
        self.state = LifecycleState::Stopped;
        self.busy = Busy::Idle;
        self.poll_token = self.poll_token.wrapping_add(1);
        self.frames_in_flight = 0;
    }

    /// Transitions to `Faulted`. Terminal except for `dispose`. Idempotent:
    /// faulting an already-faulted machine is a no-op.
    pub fn do_fatal(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.state = LifecycleState::Faulted;
        self.busy = Busy::Idle;
        self.poll_token = self.poll_token.wrapping_add(1);
        self.frames_in_flight = 0;
    }

    /// Idempotent: calling `dispose` more than once has no additional
    /// observable effect (`spec.md` §8).
    pub fn dispose(&mut self) {
        self.state = LifecycleState::Disposed;
        self.poll_token = self.poll_token.wrapping_add(1);
    }

    pub fn is_reentrant_update_allowed(&self, in_commit_or_render: bool) -> Result<()> {
        if in_commit_or_render {
            Err(CoreError::UpdateDuringRender)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_no_render_mode_leaves_state_created() {
        // Mirrors spec.md scenario 1: a fatal config error on start() must
        // not silently advance the lifecycle.
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), LifecycleState::Created);
    }

    #[test]
    fn normal_start_stop_start_cycle() {
        let mut lc = Lifecycle::new();
        lc.begin_start().unwrap();
        lc.commit_start();
        assert_eq!(lc.state(), LifecycleState::Running);

        lc.begin_stop().unwrap();
        lc.commit_stop();
        assert_eq!(lc.state(), LifecycleState::Stopped);

        lc.begin_start().unwrap();
        lc.commit_start();
        assert_eq!(lc.state(), LifecycleState::Running);
    }

    #[test]
    fn cancel_start_reverts_busy_without_advancing_state() {
        let mut lc = Lifecycle::new();
        lc.begin_start().unwrap();
        lc.cancel_start();
        assert_eq!(lc.state(), LifecycleState::Created);
        // busy is back to Idle, so a retried start() is accepted.
        lc.begin_start().unwrap();
        lc.commit_start();
        assert_eq!(lc.state(), LifecycleState::Running);
    }

    #[test]
    fn starting_while_stop_in_flight_fails() {
        let mut lc = Lifecycle::new();
        lc.begin_start().unwrap();
        lc.commit_start();
        lc.begin_stop().unwrap();
        assert!(lc.begin_start().is_err());
    }

    #[test]
    fn fatal_is_terminal_except_dispose() {
        let mut lc = Lifecycle::new();
        lc.begin_start().unwrap();
        lc.commit_start();
        lc.do_fatal();
        assert_eq!(lc.state(), LifecycleState::Faulted);
        assert!(lc.begin_start().is_err());
        lc.dispose();
        assert_eq!(lc.state(), LifecycleState::Disposed);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut lc = Lifecycle::new();
        lc.dispose();
        lc.dispose();
        assert_eq!(lc.state(), LifecycleState::Disposed);
    }

    #[test]
    fn update_during_render_is_fatal_trigger() {
        let lc = Lifecycle::new();
        assert!(lc.is_reentrant_update_allowed(true).is_err());
        assert!(lc.is_reentrant_update_allowed(false).is_ok());
    }

    #[test]
    fn stop_resets_frames_in_flight_so_late_acks_cannot_strand_start() {
        let mut lc = Lifecycle::new();
        lc.begin_start().unwrap();
        lc.commit_start();
        lc.note_frame_submitted();
        lc.note_frame_submitted();
        assert_eq!(lc.frames_in_flight(), 2);
        lc.begin_stop().unwrap();
        lc.commit_stop();
        assert_eq!(lc.frames_in_flight(), 0);
    }
}
