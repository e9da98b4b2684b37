/// Core compression abstraction.
///
/// Each `FrameCodec` implementation:
/// - Compresses one whole chunk into one self-contained frame, and decompresses
///   one whole frame back. Frames must decode independently of each other;
///   this is the invariant that makes random access possible.
/// - Is injected into [`Writer`](crate::Writer) and [`Reader`](crate::Reader),
///   so the seek table logic never links a specific compressor.
///
/// Errors are plain `anyhow` errors; the core passes them to its caller
/// unchanged as [`Error::Codec`](crate::Error::Codec).
pub trait FrameCodec: Send + Sync {
    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Compress a single chunk into one frame.
    ///
    /// Takes `&mut self` so encoders can keep a reusable context around
    /// between frames.
    fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decompress a single frame.
    ///
    /// `decompressed_size` is the size recorded in the seek table. Codecs may
    /// use it to pre-size their output; the reader checks the result length
    /// against it either way.
    fn decompress(&self, compressed: &[u8], decompressed_size: usize) -> anyhow::Result<Vec<u8>>;

    /// Release encoder resources. Called exactly once, when a writer closes.
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
