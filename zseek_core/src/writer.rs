use std::io::{self, Write};
use std::sync::Arc;

use log::debug;

use crate::codec::FrameCodec;
use crate::env::{FrameSink, IoSink};
use crate::error::{Error, Result};
use crate::format::{frame_checksum, MAX_FRAME_SIZE};
use crate::index::FrameIndex;

/// Byte-oriented frame encoder.
///
/// [`encode`](Self::encode) turns one chunk into one compressed frame and
/// records it in the seek table; [`end_stream`](Self::end_stream) returns the
/// seek table skippable frame. Nothing is written anywhere: the caller places
/// the returned bytes, in order, wherever it likes. [`Writer`] is this plus a
/// sink.
pub struct Encoder {
    codec: Box<dyn FrameCodec>,
    index: FrameIndex,
}

impl Encoder {
    pub fn new(codec: Box<dyn FrameCodec>) -> Self {
        Self {
            codec,
            index: FrameIndex::default(),
        }
    }

    /// Compress `src` into a single frame.
    ///
    /// Chunks are never split or coalesced. An empty chunk yields an empty
    /// buffer and no frame.
    pub fn encode(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        if src.len() as u64 > MAX_FRAME_SIZE {
            return Err(Error::ChunkTooLarge {
                size: src.len() as u64,
            });
        }
        if src.is_empty() {
            return Ok(Vec::new());
        }

        let frame = self.codec.compress(src)?;
        if frame.len() as u64 > MAX_FRAME_SIZE {
            return Err(Error::ChunkTooLarge {
                size: frame.len() as u64,
            });
        }

        let entry = self
            .index
            .append(frame.len() as u32, src.len() as u32, frame_checksum(src));
        debug!(
            "appending frame {}: {} -> {} bytes, checksum {:#010x}",
            entry.id, entry.decomp_size, entry.comp_size, entry.checksum
        );
        Ok(frame)
    }

    /// Serialize the seek table for every frame encoded so far.
    pub fn end_stream(&self) -> Result<Vec<u8>> {
        self.index.to_seek_table()
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }
}

enum State {
    Open,
    /// Failures collected by the one finalize run, replayed on later closes.
    Closed(Option<Arc<[Error]>>),
}

/// Streaming writer for seekable compressed streams.
///
/// # Write contract
/// Every [`write`](Self::write) call becomes exactly one independent
/// compressed frame. [`close`](Self::close) appends the seek table.
///
/// # Layout written
/// ```text
/// [FRAME 0] [FRAME 1] ... [FRAME N-1]        ← one per non-empty write
/// [SKIPPABLE FRAME, tag 0xE: seek table]     ← on close
/// ```
///
/// A failed write leaves the frame recorded in the seek table even though
/// the sink may not hold it; the stream is corrupt past that point and the
/// chunk must not be retried.
pub struct Writer<S> {
    encoder: Encoder,
    sink: S,
    state: State,
}

impl<W: Write> Writer<IoSink<W>> {
    /// Write frames and the seek table, in order, to `writer`.
    pub fn new(writer: W, codec: Box<dyn FrameCodec>) -> Self {
        Self::with_sink(IoSink::new(writer), codec)
    }
}

impl<S: FrameSink> Writer<S> {
    pub fn with_sink(sink: S, codec: Box<dyn FrameCodec>) -> Self {
        Self {
            encoder: Encoder::new(codec),
            sink,
            state: State::Open,
        }
    }

    /// Compress `chunk` as one frame and hand it to the sink.
    ///
    /// Returns the number of input bytes consumed, which is always
    /// `chunk.len()` on success.
    pub fn write(&mut self, chunk: &[u8]) -> Result<usize> {
        if let State::Closed(_) = self.state {
            return Err(Error::StreamClosed);
        }

        let frame = self.encoder.encode(chunk)?;
        if frame.is_empty() {
            return Ok(0);
        }

        let written = self.sink.write_frame(&frame)?;
        if written != frame.len() {
            return Err(Error::PartialWrite {
                written,
                expected: frame.len(),
            });
        }
        Ok(chunk.len())
    }

    /// Write the seek table and release the codec.
    ///
    /// Idempotent: the footer is written and the codec released on the first
    /// call only, and every call reports the same outcome. Failures from
    /// writing the footer and from releasing the codec are returned together.
    /// The underlying sink is not closed.
    pub fn close(&mut self) -> Result<()> {
        if let State::Open = self.state {
            let mut failures = Vec::new();
            if let Err(e) = self.write_seek_table() {
                failures.push(e);
            }
            if let Err(e) = self.encoder.codec.close() {
                failures.push(Error::Codec(e));
            }
            self.encoder.index = FrameIndex::default();
            self.state = State::Closed((!failures.is_empty()).then(|| Arc::from(failures)));
        }

        match &self.state {
            State::Closed(Some(failures)) => Err(Error::Close(Arc::clone(failures))),
            _ => Ok(()),
        }
    }

    fn write_seek_table(&mut self) -> Result<()> {
        let table = self.encoder.end_stream()?;
        let written = self.sink.write_footer(&table)?;
        if written != table.len() {
            return Err(Error::PartialWrite {
                written,
                expected: table.len(),
            });
        }
        self.sink.flush()?;
        debug!(
            "wrote seek table: {} frames, {} bytes",
            self.encoder.index.len(),
            table.len()
        );
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed(_))
    }

    /// Frames written so far. Zero once closed.
    pub fn num_frames(&self) -> usize {
        self.encoder.index.len()
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Give back the sink. Does not close the writer; call [`close`](Self::close) first.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Each `write` call produces one frame, exactly like [`Writer::write`].
impl<S: FrameSink> Write for Writer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
