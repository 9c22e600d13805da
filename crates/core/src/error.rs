//! Error taxonomy for the runtime.
//!
//! Every fatal/reportable kind from the external contract is a variant of
//! [`CoreError`]. [`CoreError::is_fatal`] implements the tier classification:
//! fatal errors transition the [`crate::Lifecycle`] to `Faulted`; non-fatal
//! errors are reported through the normal `Result` plumbing without ending
//! the session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid props: {0}")]
    InvalidProps(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("re-entrant call into {0} while already in progress")]
    ReentrantCall(&'static str),

    #[error("no render mode configured")]
    NoRenderMode,

    #[error("update() called during commit/render")]
    UpdateDuringRender,

    #[error("conflicting mode: {0}")]
    ModeConflict(String),

    #[error("duplicate interactive id {id:?}: first seen as {first_kind}, again as {second_kind}")]
    DuplicateId {
        id: String,
        first_kind: &'static str,
        second_kind: &'static str,
    },

    #[error("duplicate key {key:?} among siblings of kind {kind}")]
    DuplicateKey { key: String, kind: &'static str },

    #[error("user code threw while rendering/handling an event: {0}")]
    UserCodeThrow(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("drawlist build error: {0}")]
    DrawlistBuildError(String),

    #[error("maximum nesting/recursion depth exceeded: {0}")]
    MaxDepth(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Tier 1 of `spec.md` §7: unrecoverable this session. The lifecycle
    /// transitions to `Faulted` and no further turns execute.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateId { .. }
                | CoreError::ProtocolError(_)
                | CoreError::DrawlistBuildError(_)
                | CoreError::UserCodeThrow(_)
                | CoreError::MaxDepth(_)
                | CoreError::UpdateDuringRender
                | CoreError::ReentrantCall(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_is_fatal() {
        let err = CoreError::DuplicateId {
            id: "go".into(),
            first_kind: "button",
            second_kind: "button",
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn backend_error_is_not_fatal() {
        let err = CoreError::BackendError("ack rejected during shutdown".into());
        assert!(!err.is_fatal());
    }

    #[test]
    fn no_render_mode_is_not_fatal() {
        assert!(!CoreError::NoRenderMode.is_fatal());
    }
}
