//! AAC Coding Module
//!
//! Adapts an AAC codec engine to a media pipeline: encoder and decoder
//! handles over caller-owned buffers, multi-frame packet decoding,
//! packet-loss concealment, and duration/redundancy inspection of packets.
//!
//! The codec itself sits behind the [`aac::EncoderEngine`] and
//! [`aac::DecoderEngine`] traits. [`engines::reference`] provides an
//! always-available implementation; the `ffmpeg` feature adds one backed by
//! FFmpeg.

pub mod aac;
pub mod audio;
pub mod common;
pub mod engines;
pub mod error;
pub mod settings;

// Re-export commonly used types
pub use error::{CodecError, Result};

pub use aac::{
    AacDecoder, AacEncoder, AdapterState, AudioObjectType, BitrateMode, DecoderEngine,
    EncoderConfig, EncoderEngine, EngineError, StreamInfo, TransportType,
};
pub use audio::{AudioDecoder, AudioEncoder, AudioFrame, AudioSample};
pub use engines::{ReferenceDecoder, ReferenceEncoder};
pub use settings::CodecSettings;
