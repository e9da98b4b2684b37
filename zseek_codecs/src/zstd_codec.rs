use anyhow::Context;
use zseek_core::FrameCodec;

/// Zstandard frame codec, the reference codec of the seekable format.
///
/// Each chunk is compressed into one standalone zstd frame at the configured
/// level (default: 3), so any frame can be decompressed without touching its
/// neighbours, and a stock zstd decoder reads the whole stream end to end.
///
/// The compression context is created on first use, reused for every frame
/// after that, and dropped by [`close`](FrameCodec::close).
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
    compressor: Option<zstd::bulk::Compressor<'static>>,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            compressor: None,
        }
    }
}

impl FrameCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&mut self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let compressor = match self.compressor.take() {
            Some(compressor) => compressor,
            None => zstd::bulk::Compressor::new(self.level)
                .with_context(|| format!("creating zstd compressor at level {}", self.level))?,
        };
        Ok(self.compressor.insert(compressor).compress(raw)?)
    }

    fn decompress(&self, compressed: &[u8], decompressed_size: usize) -> anyhow::Result<Vec<u8>> {
        // The seek table knows the exact frame size, so the output buffer is
        // allocated once and anything larger is rejected by zstd itself.
        let raw = zstd::bulk::decompress(compressed, decompressed_size)?;
        Ok(raw)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if self.compressor.take().is_some() {
            log::debug!("released zstd compression context");
        }
        Ok(())
    }
}
