//! Byte-device collaborators consumed by [`Writer`](crate::Writer) and
//! [`Reader`](crate::Reader).
//!
//! The default implementations wrap `std::io` types. Custom implementations
//! let callers route frames and the seek table to different places, or serve
//! frame ranges from something that is not a seekable file (object storage,
//! a chunk cache, ...).

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::format::{SeekTableFooter, FOOTER_SIZE};

// ── Sink ───────────────────────────────────────────────────────────────────

/// Destination for compressed frames and the trailing seek table.
pub trait FrameSink {
    /// Write one compressed frame, returning the number of bytes accepted.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Write the seek table skippable frame, returning the number of bytes accepted.
    fn write_footer(&mut self, footer: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// [`FrameSink`] appending everything, in order, to a `std::io::Write`.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameSink for IoSink<W> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.inner.write_all(frame)?;
        Ok(frame.len())
    }

    fn write_footer(&mut self, footer: &[u8]) -> io::Result<usize> {
        self.inner.write_all(footer)?;
        Ok(footer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ── Source ─────────────────────────────────────────────────────────────────

/// Origin of the seek table and of compressed frame bytes.
pub trait FrameSource {
    /// Return the complete seek table skippable frame.
    fn read_footer(&mut self) -> Result<Vec<u8>>;

    /// Return the `comp_size` bytes starting at `comp_offset` in the
    /// compressed stream. Returning fewer bytes is reported by the reader as
    /// a size mismatch.
    fn read_frame_range(&mut self, comp_offset: u64, comp_size: u32) -> Result<Vec<u8>>;
}

/// [`FrameSource`] over a seekable stream whose last bytes are the seek table.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read + Seek> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> FrameSource for IoSource<R> {
    /// Locate the seek table from the end of the stream.
    ///
    /// The final 9 bytes must be a footer ending in the seekable magic; its
    /// frame count and descriptor give the size of the enclosing skippable
    /// frame, which is then read in one piece.
    fn read_footer(&mut self) -> Result<Vec<u8>> {
        let end = self.inner.seek(SeekFrom::End(0))?;
        if end < FOOTER_SIZE as u64 {
            return Err(Error::FooterNotFound(format!(
                "stream of {} bytes cannot hold a footer",
                end
            )));
        }

        self.inner.seek(SeekFrom::Start(end - FOOTER_SIZE as u64))?;
        let mut footer_buf = [0u8; FOOTER_SIZE];
        self.inner.read_exact(&mut footer_buf)?;
        let footer = SeekTableFooter::from_bytes(&footer_buf)?;

        let frame_size = footer.frame_size();
        if frame_size > end {
            return Err(Error::MalformedFooter(format!(
                "seek table of {} bytes does not fit in a {}-byte stream",
                frame_size, end
            )));
        }
        self.inner.seek(SeekFrom::Start(end - frame_size))?;
        let mut table = vec![0u8; frame_size as usize];
        self.inner.read_exact(&mut table)?;
        Ok(table)
    }

    fn read_frame_range(&mut self, comp_offset: u64, comp_size: u32) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(comp_offset))?;
        let mut frame = Vec::with_capacity(comp_size as usize);
        self.inner
            .by_ref()
            .take(comp_size as u64)
            .read_to_end(&mut frame)?;
        Ok(frame)
    }
}

/// Source type of a reader built from a seek table alone.
///
/// Uninhabited: a [`Decoder`](crate::Decoder) never holds one, so every range
/// read on it fails with [`Error::NoDataSource`].
#[derive(Debug, Clone, Copy)]
pub enum Detached {}

impl FrameSource for Detached {
    fn read_footer(&mut self) -> Result<Vec<u8>> {
        match *self {}
    }

    fn read_frame_range(&mut self, _comp_offset: u64, _comp_size: u32) -> Result<Vec<u8>> {
        match *self {}
    }
}
