//! Codec engines the adapters can drive.
//!
//! The reference pair is always available. The FFmpeg pair needs the
//! `ffmpeg` feature and the FFmpeg development libraries.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod reference;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegDecoder, FfmpegEncoder};
pub use reference::{ReferenceDecoder, ReferenceEncoder};
