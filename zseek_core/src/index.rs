use log::{debug, warn};

use crate::error::{Error, Result};
use crate::format::{
    SeekTableDescriptor, SeekTableEntry, SeekTableFooter, ENTRY_SIZE, FOOTER_SIZE, SEEKABLE_TAG,
};
use crate::skippable;

/// One frame located in both the compressed and the decompressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOffsetEntry {
    /// Zero-based position of the frame in write order.
    pub id: i64,
    /// Byte offset of the frame's first byte in the compressed stream.
    pub comp_offset: u64,
    /// Logical offset of the frame's first byte once decompressed.
    pub decomp_offset: u64,
    pub comp_size: u32,
    pub decomp_size: u32,
    /// Low 32 bits of the XXH64 of the decompressed frame.
    pub checksum: u32,
}

impl FrameOffsetEntry {
    /// Whether `off` falls inside this frame's decompressed range.
    pub fn contains(&self, off: u64) -> bool {
        off >= self.decomp_offset && off - self.decomp_offset < self.decomp_size as u64
    }
}

/// In-memory seek table.
///
/// Frames are stored densely in id order. Because every frame starts where
/// the previous one ended, the same vector is also sorted by `decomp_offset`,
/// so it serves both access patterns:
/// - [`by_id`](Self::by_id) is a direct positional lookup, O(1).
/// - [`by_decomp_offset`](Self::by_decomp_offset) is a binary predecessor
///   search ("greatest `decomp_offset` ≤ off"), O(log n).
#[derive(Debug, Clone)]
pub struct FrameIndex {
    entries: Vec<FrameOffsetEntry>,
    descriptor: SeekTableDescriptor,
    total_compressed: u64,
    total_decompressed: u64,
}

impl Default for FrameIndex {
    fn default() -> Self {
        Self::new(SeekTableDescriptor::with_checksums())
    }
}

impl FrameIndex {
    pub fn new(descriptor: SeekTableDescriptor) -> Self {
        Self {
            entries: Vec::new(),
            descriptor,
            total_compressed: 0,
            total_decompressed: 0,
        }
    }

    /// Record the next frame, deriving its offsets from the running totals.
    pub fn append(&mut self, comp_size: u32, decomp_size: u32, checksum: u32) -> FrameOffsetEntry {
        let entry = FrameOffsetEntry {
            id: self.entries.len() as i64,
            comp_offset: self.total_compressed,
            decomp_offset: self.total_decompressed,
            comp_size,
            decomp_size,
            checksum,
        };
        self.total_compressed += comp_size as u64;
        self.total_decompressed += decomp_size as u64;
        self.entries.push(entry);
        entry
    }

    /// The frame containing decompressed offset `off`, or `None` past the end.
    pub fn by_decomp_offset(&self, off: u64) -> Option<&FrameOffsetEntry> {
        if off >= self.total_decompressed {
            return None;
        }
        // entries[0] starts at 0, so at least one entry satisfies the predicate.
        // Taking the last match skips zero-length frames sharing the offset.
        let pos = self.entries.partition_point(|e| e.decomp_offset <= off);
        self.entries.get(pos.checked_sub(1)?)
    }

    pub fn by_id(&self, id: i64) -> Option<&FrameOffsetEntry> {
        let pos = usize::try_from(id).ok()?;
        self.entries.get(pos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all decompressed frame sizes.
    #[inline]
    pub fn total_decompressed_size(&self) -> u64 {
        self.total_decompressed
    }

    /// Sum of all compressed frame sizes (the seek table itself excluded).
    #[inline]
    pub fn total_compressed_size(&self) -> u64 {
        self.total_compressed
    }

    pub fn descriptor(&self) -> SeekTableDescriptor {
        self.descriptor
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameOffsetEntry> {
        self.entries.iter()
    }

    // ── Seek table (de)serialization ───────────────────────────────────────

    /// Serialize into a complete skippable frame holding the seek table.
    ///
    /// ```text
    /// [skippable header: 8 bytes, tag 0xE]
    /// [entry × N: 12 bytes each (8 without checksums)]
    /// [footer: number_of_frames:u32, descriptor:u8, magic:u32]
    /// ```
    pub fn to_seek_table(&self) -> Result<Vec<u8>> {
        let number_of_frames = u32::try_from(self.entries.len())
            .map_err(|_| Error::TooManyFrames(self.entries.len()))?;
        let entry_size = self.descriptor.entry_size();

        let mut table = Vec::with_capacity(self.entries.len() * entry_size + FOOTER_SIZE);
        let mut buf = [0u8; ENTRY_SIZE];
        for e in &self.entries {
            SeekTableEntry {
                compressed_size: e.comp_size,
                decompressed_size: e.decomp_size,
                checksum: e.checksum,
            }
            .write_to(&mut buf);
            table.extend_from_slice(&buf[..entry_size]);
        }
        let footer = SeekTableFooter::new(number_of_frames, self.descriptor);
        table.extend_from_slice(&footer.to_bytes());

        skippable::encode(SEEKABLE_TAG, &table)
    }

    /// Rebuild an index from a seek table skippable frame.
    ///
    /// `buf` must be exactly the frame: skippable header, entries, footer.
    pub fn from_seek_table(buf: &[u8]) -> Result<Self> {
        if buf.len() < FOOTER_SIZE {
            return Err(Error::FooterNotFound(format!(
                "{} bytes is too short for a seek table",
                buf.len()
            )));
        }
        let mut footer_buf = [0u8; FOOTER_SIZE];
        footer_buf.copy_from_slice(&buf[buf.len() - FOOTER_SIZE..]);
        let footer = SeekTableFooter::from_bytes(&footer_buf)?;

        let frame = skippable::decode(buf)
            .map_err(|e| match e {
                Error::MalformedFrame(msg) => Error::MalformedFooter(msg),
                other => other,
            })?
            .ok_or_else(|| Error::FooterNotFound("empty seek table".into()))?;
        if frame.tag != SEEKABLE_TAG {
            return Err(Error::MalformedFooter(format!(
                "skippable frame tag {:#x} != {:#x}",
                frame.tag, SEEKABLE_TAG
            )));
        }
        if frame.encoded_len() != buf.len() {
            return Err(Error::MalformedFooter(format!(
                "skippable frame covers {} of {} bytes",
                frame.encoded_len(),
                buf.len()
            )));
        }
        if footer.table_size() != frame.payload.len() as u64 {
            return Err(Error::MalformedFooter(format!(
                "{} frames of {} bytes need a {}-byte table, found {}",
                footer.number_of_frames,
                footer.descriptor.entry_size(),
                footer.table_size(),
                frame.payload.len()
            )));
        }
        if footer.descriptor.reserved_bits() != 0 {
            warn!(
                "seek table descriptor has reserved bits set ({:#04x}); preserving them",
                footer.descriptor.reserved_bits()
            );
        }

        let entries = &frame.payload[..frame.payload.len() - FOOTER_SIZE];
        let mut index = Self::new(footer.descriptor);
        index.entries.reserve(footer.number_of_frames as usize);
        for chunk in entries.chunks_exact(footer.descriptor.entry_size()) {
            let e = SeekTableEntry::from_bytes(chunk, footer.descriptor)?;
            index.append(e.compressed_size, e.decompressed_size, e.checksum);
        }

        debug!(
            "parsed seek table: {} frames, {} compressed / {} decompressed bytes",
            index.len(),
            index.total_compressed,
            index.total_decompressed
        );
        Ok(index)
    }
}
