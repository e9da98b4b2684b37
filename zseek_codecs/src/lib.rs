mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zstd_codec::ZstdCodec;

use zseek_core::FrameCodec;

/// Names accepted by [`codec_by_name`], canonical name first.
pub const CODEC_NAMES: &[&str] = &["zstd", "lz4", "passthrough"];

/// Resolve a codec from its CLI name.
///
/// The seek table does not record which codec produced the frames, so
/// readers must be given the same codec the writer used; zstd is the
/// format's default.
pub fn codec_by_name(name: &str, zstd_level: i32) -> anyhow::Result<Box<dyn FrameCodec>> {
    match name {
        "zstd" | "z" => Ok(Box::new(ZstdCodec::new(zstd_level))),
        "lz4" | "l" => Ok(Box::new(Lz4Codec)),
        "passthrough" | "pass" | "none" => Ok(Box::new(PassThroughCodec)),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: {}",
            other,
            CODEC_NAMES.join(", ")
        ),
    }
}
