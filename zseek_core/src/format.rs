use xxhash_rust::xxh64::xxh64;

use crate::error::{Error, Result};

// ── Skippable frame envelope ───────────────────────────────────────────────

/// Base magic shared by all skippable frames; the low nibble carries the tag.
pub const SKIPPABLE_MAGIC_BASE: u32 = 0x184D_2A50;

/// Mask selecting the part of a skippable magic that must equal the base.
pub const SKIPPABLE_MAGIC_MASK: u32 = 0xFFFF_FFF0;

/// Largest tag that fits in the magic's low nibble.
pub const MAX_SKIPPABLE_TAG: u8 = 0xF;

/// Size of the skippable frame header in bytes.
///   magic:u32 + frame_size:u32 = 8
pub const SKIPPABLE_HEADER_SIZE: usize = 8;

// ── Seek table ─────────────────────────────────────────────────────────────

/// Skippable frame tag reserved for the seek table.
pub const SEEKABLE_TAG: u8 = 0xE;

/// Magic number closing every seek table footer.
pub const SEEKABLE_MAGIC_NUMBER: u32 = 0x8F92_EAB1;

/// Size of the seek table footer in bytes.
///   number_of_frames:u32 + descriptor:u8 + magic:u32 = 4 + 1 + 4 = 9
pub const FOOTER_SIZE: usize = 9;

/// Size of one seek table entry when checksums are present.
///   compressed_size:u32 + decompressed_size:u32 + checksum:u32 = 12
pub const ENTRY_SIZE: usize = 12;

/// Size of one seek table entry without the checksum field.
pub const ENTRY_SIZE_NO_CHECKSUM: usize = 8;

/// Largest chunk (raw or compressed) a single frame can describe.
pub const MAX_FRAME_SIZE: u64 = u32::MAX as u64;

/// Low 32 bits of the XXH64 (seed 0) of a decompressed chunk.
pub fn frame_checksum(raw: &[u8]) -> u32 {
    xxh64(raw, 0) as u32
}

// ── Descriptor ─────────────────────────────────────────────────────────────

/// The single flag byte of the seek table footer.
///
/// Bit 7 says whether entries carry a checksum. The remaining bits are
/// reserved: written as zero, but kept verbatim when read so a re-serialized
/// table matches the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekTableDescriptor(u8);

impl SeekTableDescriptor {
    pub const CHECKSUM_FLAG: u8 = 1 << 7;
    pub const RESERVED_MASK: u8 = !Self::CHECKSUM_FLAG;

    /// Descriptor as produced by the writer: checksums on, reserved bits clear.
    pub fn with_checksums() -> Self {
        Self(Self::CHECKSUM_FLAG)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn checksum_flag(self) -> bool {
        self.0 & Self::CHECKSUM_FLAG != 0
    }

    pub fn reserved_bits(self) -> u8 {
        self.0 & Self::RESERVED_MASK
    }

    /// Bytes per seek table entry implied by the checksum flag.
    pub fn entry_size(self) -> usize {
        if self.checksum_flag() {
            ENTRY_SIZE
        } else {
            ENTRY_SIZE_NO_CHECKSUM
        }
    }
}

// ── Footer ─────────────────────────────────────────────────────────────────

/// Decoded representation of the 9-byte footer closing the seek table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTableFooter {
    pub number_of_frames: u32,
    pub descriptor: SeekTableDescriptor,
    pub magic_number: u32,
}

impl SeekTableFooter {
    pub fn new(number_of_frames: u32, descriptor: SeekTableDescriptor) -> Self {
        Self {
            number_of_frames,
            descriptor,
            magic_number: SEEKABLE_MAGIC_NUMBER,
        }
    }

    /// Serialize to exactly `FOOTER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..4].copy_from_slice(&self.number_of_frames.to_le_bytes());
        buf[4] = self.descriptor.bits();
        buf[5..9].copy_from_slice(&self.magic_number.to_le_bytes());
        buf
    }

    /// Deserialize from `FOOTER_SIZE` bytes, checking the seekable magic.
    pub fn from_bytes(buf: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let magic_number = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);
        if magic_number != SEEKABLE_MAGIC_NUMBER {
            return Err(Error::FooterNotFound(format!(
                "footer magic {:#010x} != {:#010x}",
                magic_number, SEEKABLE_MAGIC_NUMBER
            )));
        }
        Ok(Self {
            number_of_frames: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            descriptor: SeekTableDescriptor::from_bits(buf[4]),
            magic_number,
        })
    }

    /// Length of the seek table payload this footer closes.
    pub fn table_size(&self) -> u64 {
        self.number_of_frames as u64 * self.descriptor.entry_size() as u64 + FOOTER_SIZE as u64
    }

    /// Length of the whole skippable frame holding the seek table.
    pub fn frame_size(&self) -> u64 {
        self.table_size() + SKIPPABLE_HEADER_SIZE as u64
    }
}

// ── Seek table entry ───────────────────────────────────────────────────────

/// One on-disk seek table entry. Offsets are not stored; they are rebuilt by
/// prefix-summing sizes in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekTableEntry {
    pub compressed_size: u32,
    pub decompressed_size: u32,
    /// Absent (zero) when the descriptor's checksum flag is clear.
    pub checksum: u32,
}

impl SeekTableEntry {
    /// Serialize into a full-width (checksummed) entry.
    pub fn write_to(&self, buf: &mut [u8; ENTRY_SIZE]) {
        buf[0..4].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.decompressed_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.checksum.to_le_bytes());
    }

    /// Deserialize an entry of `descriptor.entry_size()` bytes.
    pub fn from_bytes(buf: &[u8], descriptor: SeekTableDescriptor) -> Result<Self> {
        let size = descriptor.entry_size();
        if buf.len() != size {
            return Err(Error::MalformedFooter(format!(
                "entry is {} bytes, expected {}",
                buf.len(),
                size
            )));
        }
        let read = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Ok(Self {
            compressed_size: read(0),
            decompressed_size: read(4),
            checksum: if descriptor.checksum_flag() { read(8) } else { 0 },
        })
    }
}
