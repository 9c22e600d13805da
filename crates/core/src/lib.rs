//! Core runtime for a terminal UI framework.
//!
//! This crate owns the application loop, the widget reconciliation/commit
//! pass, the layout+damage+incremental-render pipeline, and the event
//! routing core. It does not draw pixels, ship a widget visual library, or
//! persist state across processes — those are the concern of a `Backend`
//! implementation and of the application built on top of this crate.

pub mod app;
pub mod backend;
pub mod commit;
pub mod config;
pub mod context;
pub mod drawlist;
pub mod error;
pub mod event;
pub mod fraction;
pub mod fuzzy;
pub mod grapheme;
pub mod instance;
pub mod layout;
mod log_init;
pub mod lifecycle;
pub mod router;
pub mod scheduler;
pub mod scratch;
pub mod scroll;
pub mod testing;
pub mod update_queue;
pub mod vnode;

pub use app::App;
pub use backend::{Backend, BackendCapabilities, EventBatch, FrameAck};
pub use commit::{CommitEngine, CommitOutcome};
pub use config::Config;
pub use context::{AppContext, IntervalHandle};
pub use error::{CoreError, Result};
pub use event::{Event, EventKind, MouseButtons, MouseEvent, MouseKind, Mods};
pub use fraction::Fraction;
pub use instance::{InstanceId, RuntimeInstance};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use log_init::init_logger;
pub use scheduler::{Scheduler, WorkItem};
pub use scroll::{ScrollMessage, ScrollState};
pub use update_queue::UpdateQueue;
pub use vnode::{Key, VNode, VNodeTag};

// Re-export the log crate so embedders can use core_runtime::log::info!, etc.
pub use log;
