use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use log::{info, trace};

use crate::codec::FrameCodec;
use crate::env::{Detached, FrameSource, IoSource};
use crate::error::{Error, Result};
use crate::format::{frame_checksum, SeekTableDescriptor};
use crate::index::{FrameIndex, FrameOffsetEntry};

struct DataSource<S> {
    source: S,
    codec: Arc<dyn FrameCodec>,
}

struct CachedFrame {
    id: i64,
    data: Vec<u8>,
}

/// Random-access reader for seekable compressed streams.
///
/// # Open sequence
/// 1. Ask the [`FrameSource`] for the trailing seek table skippable frame.
/// 2. Parse it into a [`FrameIndex`], rebuilding every frame's compressed
///    and decompressed offset by prefix-summing the stored sizes.
///
/// The index is immutable from then on and shared behind an `Arc`, so the
/// lookup methods ([`index_by_decomp_offset`](Self::index_by_decomp_offset),
/// [`index_by_id`](Self::index_by_id), [`size`](Self::size),
/// [`num_frames`](Self::num_frames)) take `&self` and are safe to call from
/// many threads at once.
///
/// # Access pattern
/// Reads resolve the logical position to its frame, fetch only that frame's
/// compressed bytes, decompress it whole, verify its checksum, and copy out
/// the requested slice, moving on to the next frame when the range crosses a
/// boundary. The most recently decompressed frame is cached, so sequential
/// reads inside one frame cost a single decompression.
///
/// Reads mutate the cursor and the cache and therefore need `&mut self`. For
/// independent concurrent readers over one stream, give each caller its own
/// [`fork`](Self::fork); forks share the index.
pub struct Reader<S> {
    index: Arc<FrameIndex>,
    data: Option<DataSource<S>>,
    cache: Option<CachedFrame>,
    offset: u64,
    closed: bool,
}

/// Reader built from a seek table alone: lookups work, range reads fail with
/// [`Error::NoDataSource`].
pub type Decoder = Reader<Detached>;

impl<R: Read + Seek> Reader<IoSource<R>> {
    /// Open a seekable stream held in any `Read + Seek`.
    pub fn new(reader: R, codec: Arc<dyn FrameCodec>) -> Result<Self> {
        Self::with_source(IoSource::new(reader), codec)
    }
}

impl Reader<Detached> {
    /// Build a decoder from seek table bytes persisted apart from the stream,
    /// as produced by [`Encoder::end_stream`](crate::Encoder::end_stream) or
    /// written by [`Writer::close`](crate::Writer::close).
    pub fn from_seek_table(seek_table: &[u8]) -> Result<Self> {
        let index = FrameIndex::from_seek_table(seek_table)?;
        Ok(Self::from_parts(Arc::new(index), None))
    }
}

impl<S: FrameSource> Reader<S> {
    /// Open a stream through a custom [`FrameSource`].
    pub fn with_source(mut source: S, codec: Arc<dyn FrameCodec>) -> Result<Self> {
        let seek_table = source.read_footer()?;
        let index = FrameIndex::from_seek_table(&seek_table)?;
        info!(
            "opened seekable stream: {} frames, {} bytes decompressed ({})",
            index.len(),
            index.total_decompressed_size(),
            codec.name()
        );
        Ok(Self::from_parts(
            Arc::new(index),
            Some(DataSource { source, codec }),
        ))
    }

    /// Fill `buf` from decompressed offset `offset` without moving the cursor.
    ///
    /// Returns the number of bytes copied, which is short only at the end of
    /// the stream and zero at or past it.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.ensure_readable()?;

        let mut filled = 0;
        while filled < buf.len() {
            let Some(pos) = offset.checked_add(filled as u64) else {
                break;
            };
            let Some(entry) = self.index.by_decomp_offset(pos).copied() else {
                break;
            };
            let frame = self.load_frame(&entry)?;
            let start = (pos - entry.decomp_offset) as usize;
            let n = (frame.len() - start).min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&frame[start..start + n]);
            filled += n;
        }
        Ok(filled)
    }

    /// Decompress and return up to `len` bytes starting at decompressed
    /// offset `start`, clamped to the end of the stream.
    pub fn read_range(&mut self, start: u64, len: u64) -> Result<Vec<u8>> {
        self.ensure_readable()?;
        let available = self.size().saturating_sub(start).min(len);
        let mut out = vec![0u8; available as usize];
        let n = self.read_at(&mut out, start)?;
        out.truncate(n);
        Ok(out)
    }

    /// Return the decompressed bytes of `entry`, from the cache if it is the
    /// frame decoded last.
    fn load_frame(&mut self, entry: &FrameOffsetEntry) -> Result<&[u8]> {
        let cached = match self.cache.take() {
            Some(cached) if cached.id == entry.id => {
                trace!("frame {} served from cache", entry.id);
                cached
            }
            _ => CachedFrame {
                id: entry.id,
                data: self.fetch_frame(entry)?,
            },
        };
        Ok(&self.cache.insert(cached).data)
    }

    fn fetch_frame(&mut self, entry: &FrameOffsetEntry) -> Result<Vec<u8>> {
        let data = self.data.as_mut().ok_or(Error::NoDataSource)?;

        trace!(
            "fetching frame {} at [{}, {})",
            entry.id,
            entry.comp_offset,
            entry.comp_offset + entry.comp_size as u64
        );
        let compressed = data
            .source
            .read_frame_range(entry.comp_offset, entry.comp_size)?;
        if compressed.len() != entry.comp_size as usize {
            return Err(Error::FrameSizeMismatch {
                frame: entry.id,
                what: "compressed",
                expected: entry.comp_size as u64,
                actual: compressed.len() as u64,
            });
        }

        let raw = data
            .codec
            .decompress(&compressed, entry.decomp_size as usize)?;
        if raw.len() != entry.decomp_size as usize {
            return Err(Error::FrameSizeMismatch {
                frame: entry.id,
                what: "decompressed",
                expected: entry.decomp_size as u64,
                actual: raw.len() as u64,
            });
        }

        if self.index.descriptor().checksum_flag() {
            let actual = frame_checksum(&raw);
            if actual != entry.checksum {
                return Err(Error::ChecksumMismatch {
                    frame: entry.id,
                    expected: entry.checksum,
                    actual,
                });
            }
        }
        Ok(raw)
    }

    /// A new reader over `source` with its own cursor and cache, sharing
    /// this reader's index and codec.
    pub fn fork(&self, source: S) -> Self {
        let data = self.data.as_ref().map(|d| DataSource {
            source,
            codec: Arc::clone(&d.codec),
        });
        let mut forked = Self::from_parts(Arc::clone(&self.index), data);
        forked.closed = self.closed;
        forked
    }
}

impl<S> Reader<S> {
    fn from_parts(index: Arc<FrameIndex>, data: Option<DataSource<S>>) -> Self {
        Self {
            index,
            data,
            cache: None,
            offset: 0,
            closed: false,
        }
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.closed {
            return Err(Error::StreamClosed);
        }
        if self.data.is_none() {
            return Err(Error::NoDataSource);
        }
        Ok(())
    }

    /// Total decompressed size of the stream.
    #[inline]
    pub fn size(&self) -> u64 {
        self.index.total_decompressed_size()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.index.len()
    }

    /// The frame containing decompressed offset `off`; `None` at or past [`size`](Self::size).
    pub fn index_by_decomp_offset(&self, off: u64) -> Option<&FrameOffsetEntry> {
        self.index.by_decomp_offset(off)
    }

    /// The `id`-th frame in write order; `None` when `id` is negative or out of range.
    pub fn index_by_id(&self, id: i64) -> Option<&FrameOffsetEntry> {
        self.index.by_id(id)
    }

    /// Total compressed size of all frames (excluding the seek table).
    pub fn compressed_size(&self) -> u64 {
        self.index.total_compressed_size()
    }

    /// Compression ratio (decompressed / compressed).
    pub fn ratio(&self) -> f64 {
        let compressed = self.compressed_size();
        if compressed == 0 {
            return 1.0;
        }
        self.size() as f64 / compressed as f64
    }

    pub fn descriptor(&self) -> SeekTableDescriptor {
        self.index.descriptor()
    }

    /// Shared handle to the immutable frame index.
    pub fn frame_index(&self) -> Arc<FrameIndex> {
        Arc::clone(&self.index)
    }

    /// Re-serialize the seek table, e.g. to persist it apart from the stream.
    pub fn seek_table(&self) -> Result<Vec<u8>> {
        self.index.to_seek_table()
    }

    /// Current cursor position in the decompressed stream.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Move the cursor. Positions past [`size`](Self::size) are allowed and
    /// read as end of data; negative positions fail with [`Error::InvalidOffset`].
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        if self.closed {
            return Err(Error::StreamClosed);
        }
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(delta) => self.offset as i128 + delta as i128,
            SeekFrom::End(delta) => self.size() as i128 + delta as i128,
        };
        self.offset = u64::try_from(target).map_err(|_| Error::InvalidOffset(target))?;
        Ok(self.offset)
    }

    /// Drop the cached frame, the data source and the index.
    ///
    /// Later reads fail with [`Error::StreamClosed`]; lookups see an empty
    /// stream. Closing again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.cache = None;
        self.data = None;
        self.index = Arc::new(FrameIndex::default());
        self.closed = true;
        Ok(())
    }
}

impl<S: FrameSource> Read for Reader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_at(buf, self.offset)?;
        self.offset += n as u64;
        Ok(n)
    }
}

impl<S> Seek for Reader<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}
