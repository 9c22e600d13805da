//! Event parsing (`spec.md` §4.4).

pub mod parser;
pub mod types;

pub use parser::{TimeUnwrap, is_truncated, parse_batch};
pub use types::{
    Event, EventKind, KeyCode, KeyEvent, Mods, MouseButtons, MouseEvent, MouseKind,
};
