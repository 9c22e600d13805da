//! Drawlist opcode builder (`spec.md` §6 "Drawlist output").
//!
//! Byte-exact layout is a backend concern; the core only commits to valid
//! `push_clip`/`pop_clip` balancing per frame, rects expressed in integer
//! terminal cells, and at most one cursor-set per frame. The wire encoding
//! mirrors the event parser's byte-cursor style (`spec.md` §4.4) rather than
//! pulling in a serialization crate for a handful of fixed opcodes.

use crate::error::{CoreError, Result};
use crate::layout::Rect;

const OP_FILL_RECT: u8 = 1;
const OP_DRAW_TEXT_SLICE: u8 = 2;
const OP_DRAW_TEXT_RUN: u8 = 3;
const OP_PUSH_CLIP: u8 = 4;
const OP_POP_CLIP: u8 = 5;
const OP_SET_CURSOR: u8 = 6;
const OP_HIDE_CURSOR: u8 = 7;
const OP_BLIT_CANVAS: u8 = 8;

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn write_rect(out: &mut Vec<u8>, rect: &Rect) {
    write_varint(out, rect.x as u64);
    write_varint(out, rect.y as u64);
    write_varint(out, rect.width.max(0) as u64);
    write_varint(out, rect.height.max(0) as u64);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_varint(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

/// A single canvas/image blit's backend-opaque payload, addressed by a
/// handle the backend assigned when the asset was registered.
pub struct CanvasBlit {
    pub handle: u64,
    pub rect: Rect,
}

/// Accumulates opcodes for one frame and encodes them into the byte stream
/// `Backend::request_frame` takes ownership of.
pub struct DrawlistBuilder {
    bytes: Vec<u8>,
    op_count: u32,
    clip_depth: u32,
    cursor_set: bool,
}

impl DrawlistBuilder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            op_count: 0,
            clip_depth: 0,
            cursor_set: false,
        }
    }

    fn push_op(&mut self, tag: u8) {
        self.bytes.push(tag);
        self.op_count += 1;
    }

    pub fn fill_rect(&mut self, rect: Rect, bg_color: u32) {
        self.push_op(OP_FILL_RECT);
        write_rect(&mut self.bytes, &rect);
        write_varint(&mut self.bytes, bg_color as u64);
    }

    pub fn draw_text_slice(&mut self, x: i32, y: i32, text: &str, fg: u32, bg: u32) {
        self.push_op(OP_DRAW_TEXT_SLICE);
        write_varint(&mut self.bytes, x as u64);
        write_varint(&mut self.bytes, y as u64);
        write_str(&mut self.bytes, text);
        write_varint(&mut self.bytes, fg as u64);
        write_varint(&mut self.bytes, bg as u64);
    }

    /// Draws a pre-shaped run of (grapheme, width) pairs — used for rich
    /// text spans where per-run styling is cheaper than per-slice
    /// (`spec.md` §3 "rich-text").
    pub fn draw_text_run(&mut self, x: i32, y: i32, segments: &[(String, u32, u32)]) {
        self.push_op(OP_DRAW_TEXT_RUN);
        write_varint(&mut self.bytes, x as u64);
        write_varint(&mut self.bytes, y as u64);
        write_varint(&mut self.bytes, segments.len() as u64);
        for (text, fg, bg) in segments {
            write_str(&mut self.bytes, text);
            write_varint(&mut self.bytes, *fg as u64);
            write_varint(&mut self.bytes, *bg as u64);
        }
    }

    pub fn push_clip(&mut self, rect: Rect) {
        self.push_op(OP_PUSH_CLIP);
        write_rect(&mut self.bytes, &rect);
        self.clip_depth += 1;
    }

    /// Returns an error rather than panicking on an unbalanced pop so a
    /// single malformed widget render cannot corrupt an otherwise-valid
    /// frame (`spec.md` §7 tier classification: `DRAWLIST_BUILD_ERROR` is
    /// fatal, but it is raised here rather than unwinding).
    pub fn pop_clip(&mut self) -> Result<()> {
        if self.clip_depth == 0 {
            return Err(CoreError::DrawlistBuildError("pop_clip with no matching push_clip".into()));
        }
        self.clip_depth -= 1;
        self.push_op(OP_POP_CLIP);
        Ok(())
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) -> Result<()> {
        if self.cursor_set {
            return Err(CoreError::DrawlistBuildError("at most one cursor-set is allowed per frame".into()));
        }
        self.cursor_set = true;
        self.push_op(OP_SET_CURSOR);
        write_varint(&mut self.bytes, x as u64);
        write_varint(&mut self.bytes, y as u64);
        Ok(())
    }

    pub fn hide_cursor(&mut self) {
        self.push_op(OP_HIDE_CURSOR);
    }

    pub fn blit_canvas(&mut self, blit: &CanvasBlit) {
        self.push_op(OP_BLIT_CANVAS);
        write_varint(&mut self.bytes, blit.handle);
        write_rect(&mut self.bytes, &blit.rect);
    }

    /// Finalizes the stream, validating clip balance, and prepends the
    /// opcode count header. Fails with `DrawlistBuildError` if any
    /// `push_clip` was never matched by a `pop_clip`.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.clip_depth != 0 {
            return Err(CoreError::DrawlistBuildError(format!(
                "{} push_clip call(s) left unmatched at end of frame",
                self.clip_depth
            )));
        }
        let mut out = Vec::with_capacity(self.bytes.len() + 5);
        write_varint(&mut out, self.op_count as u64);
        out.extend_from_slice(&self.bytes);
        Ok(out)
    }
}

impl Default for DrawlistBuilder {
    fn default() -> Self {
        Self::new()
    }
}
