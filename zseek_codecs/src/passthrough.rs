use zseek_core::FrameCodec;

/// No-op codec: stores frames verbatim, with no compression.
///
/// Useful for:
/// - Verifying the seek table round-trip independently of any codec.
/// - Data that is already compressed (e.g., JPEG, MP4) where further
///   compression would expand the stream.
pub struct PassThroughCodec;

impl FrameCodec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8], _decompressed_size: usize) -> anyhow::Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}
