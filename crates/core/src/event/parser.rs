//! Event parser (`spec.md` §4.4): decodes an opaque backend event batch into
//! a typed event sequence, with monotonic time unwrapping.
//!
//! The wire format is a small fixed binary layout (batch header, then a
//! tagged record per event) rather than a free-form grammar, so it is
//! decoded with a plain byte cursor instead of a parser-combinator crate —
//! there is no grammar here for `nom` to buy anything.

use crate::event::types::{
    Event, EventKind, FLAG_TRUNCATED, KeyCode, KeyEvent, Mods, MouseButtons, MouseEvent, MouseKind,
};
use crate::{CoreError, Result};

const KIND_KEY: u8 = 1;
const KIND_TEXT: u8 = 2;
const KIND_PASTE: u8 = 3;
const KIND_MOUSE: u8 = 4;
const KIND_RESIZE: u8 = 5;
const KIND_TICK: u8 = 6;
const KIND_FOCUS: u8 = 7;
const KIND_BLUR: u8 = 8;

const KEY_CHAR: u8 = 0;
const KEY_ENTER: u8 = 1;
const KEY_BACKSPACE: u8 = 2;
const KEY_DELETE: u8 = 3;
const KEY_TAB: u8 = 4;
const KEY_BACKTAB: u8 = 5;
const KEY_ESC: u8 = 6;
const KEY_LEFT: u8 = 7;
const KEY_RIGHT: u8 = 8;
const KEY_UP: u8 = 9;
const KEY_DOWN: u8 = 10;
const KEY_HOME: u8 = 11;
const KEY_END: u8 = 12;
const KEY_PAGE_UP: u8 = 13;
const KEY_PAGE_DOWN: u8 = 14;
const KEY_F: u8 = 15;

/// Monotonic-time-unwrap state carried across an entire session.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeUnwrap {
    epoch_ms: u64,
    last_raw_ms: u32,
}

impl TimeUnwrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one raw (bounded, wrapping) millisecond reading and returns
    /// a session-monotonic non-decreasing `time_ms`.
    fn unwrap(&mut self, raw_ms: u32) -> u64 {
        if raw_ms < self.last_raw_ms {
            self.epoch_ms += 1u64 << 32;
        }
        self.last_raw_ms = raw_ms;
        self.epoch_ms + raw_ms as u64
    }
}

pub struct ParsedBatch {
    pub events: Vec<Event>,
    pub flags: u32,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::ProtocolError("unexpected end of batch".into()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Unsigned LEB128 varint.
    fn varint(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            if shift >= 64 {
                return Err(CoreError::ProtocolError("varint too long".into()));
            }
            let byte = self.u8()?;
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }
}

/// Decodes one event batch. `max_total_size` is a hard cap on the input
/// byte slice; oversize input fails with a protocol error and no partial
/// parse is ever returned.
pub fn parse_batch(bytes: &[u8], max_total_size: usize, time: &mut TimeUnwrap) -> Result<ParsedBatch> {
    if bytes.len() > max_total_size {
        return Err(CoreError::ProtocolError(format!(
            "batch of {} bytes exceeds max_total_size {}",
            bytes.len(),
            max_total_size
        )));
    }

    let mut cursor = Cursor::new(bytes);
    let flags = cursor.u32()?;
    let event_count = cursor.varint()?;

    let mut events = Vec::with_capacity(event_count as usize);
    for _ in 0..event_count {
        events.push(parse_event(&mut cursor, time)?);
    }

    Ok(ParsedBatch { events, flags })
}

fn parse_event(cursor: &mut Cursor, time: &mut TimeUnwrap) -> Result<Event> {
    let kind_tag = cursor.u8()?;
    let raw_ms = cursor.u32()?;
    let time_ms = time.unwrap(raw_ms);

    let kind = match kind_tag {
        KIND_KEY => EventKind::Key(parse_key(cursor)?),
        KIND_TEXT => {
            let codepoint = cursor.u32()?;
            let ch = char::from_u32(codepoint)
                .ok_or_else(|| CoreError::ProtocolError("invalid text codepoint".into()))?;
            EventKind::Text(ch)
        }
        KIND_PASTE => {
            let len = cursor.varint()? as usize;
            let raw = cursor.take(len)?;
            let text = std::str::from_utf8(raw)
                .map_err(|_| CoreError::ProtocolError("paste payload is not valid utf-8".into()))?;
            EventKind::Paste(text.to_string())
        }
        KIND_MOUSE => EventKind::Mouse(parse_mouse(cursor)?),
        KIND_RESIZE => {
            let width = cursor.u16()?;
            let height = cursor.u16()?;
            EventKind::Resize { width, height }
        }
        KIND_TICK => EventKind::Tick,
        KIND_FOCUS => EventKind::Focus,
        KIND_BLUR => EventKind::Blur,
        other => {
            return Err(CoreError::ProtocolError(format!(
                "unknown event kind tag {other}"
            )));
        }
    };

    Ok(Event { kind, time_ms })
}

fn parse_key(cursor: &mut Cursor) -> Result<KeyEvent> {
    let tag = cursor.u8()?;
    let code = match tag {
        KEY_CHAR => {
            let codepoint = cursor.u32()?;
            let ch = char::from_u32(codepoint)
                .ok_or_else(|| CoreError::ProtocolError("invalid key codepoint".into()))?;
            KeyCode::Char(ch)
        }
        KEY_ENTER => KeyCode::Enter,
        KEY_BACKSPACE => KeyCode::Backspace,
        KEY_DELETE => KeyCode::Delete,
        KEY_TAB => KeyCode::Tab,
        KEY_BACKTAB => KeyCode::BackTab,
        KEY_ESC => KeyCode::Esc,
        KEY_LEFT => KeyCode::Left,
        KEY_RIGHT => KeyCode::Right,
        KEY_UP => KeyCode::Up,
        KEY_DOWN => KeyCode::Down,
        KEY_HOME => KeyCode::Home,
        KEY_END => KeyCode::End,
        KEY_PAGE_UP => KeyCode::PageUp,
        KEY_PAGE_DOWN => KeyCode::PageDown,
        KEY_F => KeyCode::F(cursor.u8()?),
        other => {
            return Err(CoreError::ProtocolError(format!(
                "unknown key code tag {other}"
            )));
        }
    };
    let mods = Mods::from_bits_truncate(cursor.u8()?);
    Ok(KeyEvent { code, mods })
}

fn parse_mouse(cursor: &mut Cursor) -> Result<MouseEvent> {
    let kind_tag = cursor.u8()?;
    let kind = MouseKind::from_tag(kind_tag)
        .ok_or_else(|| CoreError::ProtocolError(format!("unknown mouse kind tag {kind_tag}")))?;
    let buttons = MouseButtons::from_bits_truncate(cursor.u8()?);
    let mods = Mods::from_bits_truncate(cursor.u8()?);
    let x = cursor.u16()?;
    let y = cursor.u16()?;
    let wheel_x = cursor.i32()?;
    let wheel_y = cursor.i32()?;
    Ok(MouseEvent {
        kind,
        buttons,
        mods,
        x,
        y,
        wheel_x,
        wheel_y,
    })
}

pub fn is_truncated(flags: u32) -> bool {
    flags & FLAG_TRUNCATED != 0
}
