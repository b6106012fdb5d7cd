//! AAC adaptation layer
//!
//! Encoder and decoder adapters over a pluggable codec engine, plus the
//! ADTS and RFC 2198 framing helpers they rely on.

pub mod adts;
pub mod assembler;
pub mod concealment;
pub mod config;
pub mod decoder;
pub mod duration;
pub mod encoder;
pub mod engine;
pub mod red;
pub mod state;
pub mod stream_info;
pub mod types;

pub use config::EncoderConfig;
pub use decoder::AacDecoder;
pub use encoder::AacEncoder;
pub use engine::{DecoderEngine, EncoderEngine, EngineError};
pub use state::AdapterState;
pub use stream_info::StreamInfo;
pub use types::{AudioObjectType, BitrateMode, TransportType};
