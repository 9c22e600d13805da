//! Wire-level event types (`spec.md` §4.4, §6).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mods: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const SUPER = 0b1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT   = 0b001;
        const RIGHT  = 0b010;
        const MIDDLE = 0b100;
    }
}

/// Single authoritative table for the mouse-kind numeric tag, resolving the
/// open question in `spec.md` §9 ("mouse kind numeric constants are
/// declared inline at call sites... should be consolidated into the event
/// schema with a single authoritative table").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Down,
    Up,
    Wheel,
    Move,
}

static MOUSE_KIND_TABLE: phf::Map<u8, MouseKind> = phf::phf_map! {
    3u8 => MouseKind::Down,
    4u8 => MouseKind::Up,
    5u8 => MouseKind::Wheel,
    6u8 => MouseKind::Move,
};

impl MouseKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        MOUSE_KIND_TABLE.get(&tag).copied()
    }

    pub fn to_tag(self) -> u8 {
        match self {
            MouseKind::Down => 3,
            MouseKind::Up => 4,
            MouseKind::Wheel => 5,
            MouseKind::Move => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Esc,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: Mods,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub buttons: MouseButtons,
    pub mods: Mods,
    pub x: u16,
    pub y: u16,
    pub wheel_x: i32,
    pub wheel_y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Key(KeyEvent),
    /// A single decoded codepoint, distinct from `Key(Char(..))`: produced
    /// by the backend's IME/text layer rather than raw key decoding.
    Text(char),
    Paste(String),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    Tick,
    Focus,
    Blur,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub time_ms: u64,
}

/// Low bit of the batch `flags` word: engine-side truncation occurred.
pub const FLAG_TRUNCATED: u32 = 0b1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_kind_table_round_trips() {
        for kind in [MouseKind::Down, MouseKind::Up, MouseKind::Wheel, MouseKind::Move] {
            assert_eq!(MouseKind::from_tag(kind.to_tag()), Some(kind));
        }
    }

    #[test]
    fn unknown_mouse_tag_is_none() {
        assert_eq!(MouseKind::from_tag(255), None);
    }
}
