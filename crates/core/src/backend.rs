//! The backend contract (`spec.md` §6).
//!
//! The backend is an opaque collaborator: it owns the terminal, produces raw
//! event-batch bytes, and consumes drawlist opcode bytes. The core never
//! assumes a concrete terminal library sits behind this trait.

use async_trait::async_trait;

use crate::Result;

/// A batch of raw event bytes plus the count of batches the backend had to
/// drop before this one (backpressure signal consumed by the scheduler).
pub struct EventBatch {
    pub bytes: Vec<u8>,
    pub dropped_batches: u32,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl EventBatch {
    pub fn new(bytes: Vec<u8>, dropped_batches: u32, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            bytes,
            dropped_batches,
            release: Some(Box::new(release)),
        }
    }

    /// Must fire on every exit path once the batch is done with (`spec.md`
    /// §5 "Shared resources"). Safe to call at most once; subsequent calls
    /// are no-ops.
    pub fn release(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

impl Drop for EventBatch {
    fn drop(&mut self) {
        self.release();
    }
}

/// Acknowledgement of a submitted frame. `accepted` resolves before the full
/// frame completes transport, letting the core attribute perf timings
/// without blocking on end-to-end delivery.
pub struct FrameAck {
    pub accepted: Option<tokio::sync::oneshot::Receiver<()>>,
    pub completed: tokio::sync::oneshot::Receiver<Result<()>>,
}

/// Capability markers the backend reports; must agree with [`crate::Config`]
/// (`spec.md` §6). `None` means "no declared limit."
#[derive(Debug, Clone, Default)]
pub struct BackendCapabilities {
    pub drawlist_protocol_version: u32,
    pub max_event_bytes: Option<usize>,
    pub fps_cap: Option<u32>,
    pub supports_raw_write: bool,
}

#[async_trait]
pub trait Backend: Send {
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    async fn dispose(&mut self) -> Result<()>;

    fn capabilities(&self) -> BackendCapabilities;

    /// Awaits the next event batch. One of the only suspension points in the
    /// core (`spec.md` §5).
    async fn poll_events(&mut self) -> Result<EventBatch>;

    /// Submits drawlist bytes for one frame; ownership transfers to the
    /// backend. Returns an ack handle; the core must not read the bytes
    /// again after this call.
    async fn request_frame(&mut self, bytes: Vec<u8>) -> Result<FrameAck>;

    /// Best-effort raw write to the terminal (used for clipboard OSC52).
    /// Returns `Ok(())` even if unsupported; callers treat failures here as
    /// tier-3 swallowed errors.
    async fn raw_write(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}
