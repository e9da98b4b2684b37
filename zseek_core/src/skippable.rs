//! The generic skippable-frame envelope.
//!
//! Any compliant decoder steps over a frame whose magic is
//! `SKIPPABLE_MAGIC_BASE | tag` by reading the 4-byte length and skipping that
//! many bytes, which is how the seek table rides along at the end of an
//! otherwise ordinary compressed stream.
//!
//! ```text
//! [magic: u32 LE = 0x184D2A50 | tag] [frame_size: u32 LE] [payload: frame_size bytes]
//! ```

use crate::error::{Error, Result};
use crate::format::{
    MAX_FRAME_SIZE, MAX_SKIPPABLE_TAG, SKIPPABLE_HEADER_SIZE, SKIPPABLE_MAGIC_BASE,
    SKIPPABLE_MAGIC_MASK,
};

/// A decoded skippable frame borrowing its payload from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippableFrame<'a> {
    pub tag: u8,
    pub payload: &'a [u8],
}

impl SkippableFrame<'_> {
    /// Bytes the frame occupies on the wire, header included.
    pub fn encoded_len(&self) -> usize {
        SKIPPABLE_HEADER_SIZE + self.payload.len()
    }
}

/// Wrap `payload` in a skippable frame with the given tag.
///
/// An empty payload yields an empty buffer: a zero-length frame is a no-op
/// and is simply not emitted.
pub fn encode(tag: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if tag > MAX_SKIPPABLE_TAG {
        return Err(Error::InvalidTag(tag));
    }
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    if payload.len() as u64 > MAX_FRAME_SIZE {
        return Err(Error::ChunkTooLarge {
            size: payload.len() as u64,
        });
    }

    let mut frame = Vec::with_capacity(SKIPPABLE_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(SKIPPABLE_MAGIC_BASE | tag as u32).to_le_bytes());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Parse the skippable frame at the start of `buf`.
///
/// Returns `Ok(None)` for an empty buffer, the inverse of encoding an empty
/// payload. Bytes after the declared payload are left to the caller.
pub fn decode(buf: &[u8]) -> Result<Option<SkippableFrame<'_>>> {
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.len() < SKIPPABLE_HEADER_SIZE {
        return Err(Error::MalformedFrame(format!(
            "{} bytes is shorter than the {}-byte header",
            buf.len(),
            SKIPPABLE_HEADER_SIZE
        )));
    }

    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic & SKIPPABLE_MAGIC_MASK != SKIPPABLE_MAGIC_BASE {
        return Err(Error::MalformedFrame(format!(
            "magic {:#010x} is not a skippable frame",
            magic
        )));
    }
    let tag = (magic & !SKIPPABLE_MAGIC_MASK) as u8;

    let frame_size = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    let available = buf.len() - SKIPPABLE_HEADER_SIZE;
    if available < frame_size {
        return Err(Error::MalformedFrame(format!(
            "declared {} payload bytes but only {} available",
            frame_size, available
        )));
    }

    Ok(Some(SkippableFrame {
        tag,
        payload: &buf[SKIPPABLE_HEADER_SIZE..SKIPPABLE_HEADER_SIZE + frame_size],
    }))
}
