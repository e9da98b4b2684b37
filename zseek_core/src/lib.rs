//! Random access into streams of independently compressed frames.
//!
//! A [`Writer`] compresses each chunk it is given into its own frame and, on
//! close, appends a seek table wrapped in a skippable frame so that ordinary
//! decoders pass over it. A [`Reader`] parses that table back and serves
//! arbitrary byte ranges of the decompressed stream by decompressing only
//! the frames the range touches.

pub mod codec;
pub mod env;
pub mod error;
pub mod format;
pub mod index;
pub mod reader;
pub mod skippable;
pub mod writer;

pub use codec::FrameCodec;
pub use env::{Detached, FrameSink, FrameSource, IoSink, IoSource};
pub use error::{Error, Result};
pub use format::{SeekTableDescriptor, SeekTableEntry, SeekTableFooter, SEEKABLE_MAGIC_NUMBER};
pub use index::{FrameIndex, FrameOffsetEntry};
pub use reader::{Decoder, Reader};
pub use writer::{Encoder, Writer};
