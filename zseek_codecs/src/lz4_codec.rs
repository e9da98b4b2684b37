use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use zseek_core::FrameCodec;

/// LZ4 frame codec.
///
/// Fastest decompression of all bundled codecs. Streams written with it keep
/// the seek table layout but are not readable by a stock zstd decoder.
///
/// Best for: hot data, low-latency random access workloads.
pub struct Lz4Codec;

impl FrameCodec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(compress_prepend_size(raw))
    }

    fn decompress(&self, compressed: &[u8], _decompressed_size: usize) -> anyhow::Result<Vec<u8>> {
        let raw = decompress_size_prepended(compressed)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        Ok(raw)
    }
}
