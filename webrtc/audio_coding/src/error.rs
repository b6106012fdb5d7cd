//! Error types for codec operations.
//!
//! Engine status codes are mapped onto this taxonomy by the adapters. The
//! engine's "not enough bits" status never shows up here: it only ever means
//! "call again with more data".

use crate::aac::engine::{ConfigStep, EncoderParam, EngineError};
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Error type for codec operations
#[derive(Debug)]
pub enum CodecError {
    /// Bringing an engine online failed; nothing stays allocated
    EngineInit {
        step: ConfigStep,
        source: EngineError,
    },
    /// A live parameter change was refused; the handle keeps its settings
    ParameterRejected {
        parameter: EncoderParam,
        value: i32,
        source: EngineError,
    },
    /// Output capacity cannot hold a single frame; nothing was written
    BufferOverflow {
        /// Samples (decode) or bytes (encode) one frame needs, when known
        required: Option<usize>,
        available: usize,
    },
    /// Operation invoked before its preconditions hold
    State(String),
    /// Unrecoverable engine fault; the handle must be reopened
    EngineFatal(i32),
    /// Encode call failed
    Encode(EngineError),
    /// Decode call failed
    Decode(EngineError),
    /// First concealment frame failed
    Conceal(EngineError),
    /// Caller input does not match the handle
    InvalidInput(String),
    /// Handle used after close
    Closed,
    /// Configuration error
    Config(String),
    /// Logging error
    Logging(String),
    /// I/O error
    Io(io::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::EngineInit { step, source } => {
                write!(f, "Engine init error at {}: {}", step, source)
            }
            CodecError::ParameterRejected {
                parameter,
                value,
                source,
            } => write!(f, "Parameter rejected: {}={} ({})", parameter, value, source),
            CodecError::BufferOverflow {
                required: Some(required),
                available,
            } => write!(
                f,
                "Buffer overflow: {} required, {} available",
                required, available
            ),
            CodecError::BufferOverflow {
                required: None,
                available,
            } => write!(f, "Buffer overflow: {} available", available),
            CodecError::State(msg) => write!(f, "State error: {}", msg),
            CodecError::EngineFatal(code) => write!(f, "Fatal engine error: 0x{:04x}", code),
            CodecError::Encode(err) => write!(f, "Encode error: {}", err),
            CodecError::Decode(err) => write!(f, "Decode error: {}", err),
            CodecError::Conceal(err) => write!(f, "Concealment error: {}", err),
            CodecError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CodecError::Closed => write!(f, "Codec handle already closed"),
            CodecError::Config(msg) => write!(f, "Config error: {}", msg),
            CodecError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CodecError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err)
    }
}

impl From<config_loader::ConfigError> for CodecError {
    fn from(err: config_loader::ConfigError) -> Self {
        CodecError::Config(err.to_string())
    }
}

impl From<logging::LoggingError> for CodecError {
    fn from(err: logging::LoggingError) -> Self {
        CodecError::Logging(err.to_string())
    }
}
