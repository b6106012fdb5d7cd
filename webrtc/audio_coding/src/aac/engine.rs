//! Contract of the wrapped codec engine.
//!
//! The adapters never see the codec algorithm. They talk to an engine
//! through the narrow verb sets below, which lets every loop and failure
//! path in this crate run against a scripted fake as well as a real codec.

use super::stream_info::StreamInfo;
use super::types::TransportType;
use std::fmt;

/// Status codes an engine call can return instead of success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The internal bitstream buffer does not yet hold a complete frame.
    /// Nothing was consumed; feed more bytes and call again.
    NotEnoughBits,
    /// The encoder has been drained completely.
    EndOfStream,
    /// The output slice cannot hold one frame. Nothing was consumed.
    OutputTooSmall,
    /// The engine does not implement the requested setting or operation.
    Unsupported,
    /// Recoverable failure with an engine-specific code.
    Failed(i32),
    /// The engine instance is unusable from now on.
    Fatal(i32),
}

impl EngineError {
    pub fn is_fatal(self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotEnoughBits => write!(f, "not enough bits"),
            EngineError::EndOfStream => write!(f, "end of stream"),
            EngineError::OutputTooSmall => write!(f, "output buffer too small"),
            EngineError::Unsupported => write!(f, "unsupported"),
            EngineError::Failed(code) => write!(f, "engine error 0x{:04x}", code),
            EngineError::Fatal(code) => write!(f, "fatal engine error 0x{:04x}", code),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Encoder parameters, in the order they are applied at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderParam {
    AudioObjectType,
    SbrMode,
    GranuleLength,
    SampleRate,
    ChannelMode,
    ChannelOrder,
    BitrateMode,
    Bitrate,
    Transmux,
    Afterburner,
}

impl fmt::Display for EncoderParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderParam::AudioObjectType => "audio object type",
            EncoderParam::SbrMode => "SBR mode",
            EncoderParam::GranuleLength => "granule length",
            EncoderParam::SampleRate => "sample rate",
            EncoderParam::ChannelMode => "channel mode",
            EncoderParam::ChannelOrder => "channel order",
            EncoderParam::BitrateMode => "bitrate mode",
            EncoderParam::Bitrate => "bitrate",
            EncoderParam::Transmux => "transport",
            EncoderParam::Afterburner => "afterburner",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderParam {
    ConcealMethod,
}

/// Stage of bringing an engine online; names the step an open failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    /// Allocating the engine instance
    Allocate,
    /// Opening a decoder for a transport framing
    Transport,
    Param(EncoderParam),
    ConcealMethod,
    /// The zero-input call that reports frame geometry
    Probe,
}

impl fmt::Display for ConfigStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigStep::Allocate => write!(f, "allocate"),
            ConfigStep::Transport => write!(f, "transport"),
            ConfigStep::Param(param) => write!(f, "{}", param),
            ConfigStep::ConcealMethod => write!(f, "conceal method"),
            ConfigStep::Probe => write!(f, "probe"),
        }
    }
}

/// Geometry an encoder reports after configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderInfo {
    /// Samples per channel consumed per frame
    pub frame_length: usize,
    /// Upper bound on bytes one encode call produces for one frame
    pub max_output_bytes: usize,
    pub input_channels: u32,
    /// Samples of algorithmic delay
    pub encoder_delay: usize,
    /// AudioSpecificConfig bytes
    pub config_header: Vec<u8>,
}

/// Encoder half of the engine.
pub trait EncoderEngine {
    /// Allocates the engine instance.
    fn open(&mut self) -> EngineResult<()>;

    fn set_param(&mut self, param: EncoderParam, value: i32) -> EngineResult<()>;

    /// Applies the parameters set so far and reports the resulting geometry.
    fn probe(&mut self) -> EngineResult<EncoderInfo>;

    /// Encodes interleaved PCM into `output`, returning bytes written.
    ///
    /// The engine buffers input until a full frame is available, so zero
    /// bytes is a normal result. `None` drains buffered input; once nothing
    /// is left the engine answers [`EngineError::EndOfStream`]. When
    /// `output` is too small nothing is consumed.
    fn encode(&mut self, pcm: Option<&[i16]>, output: &mut [u8]) -> EngineResult<usize>;

    /// Releases the engine instance.
    fn close(&mut self);
}

/// Decoder half of the engine.
pub trait DecoderEngine {
    /// Allocates the engine instance for a transport framing.
    fn open(&mut self, transport: TransportType) -> EngineResult<()>;

    fn set_param(&mut self, param: DecoderParam, value: i32) -> EngineResult<()>;

    /// Copies as much of `input` as fits into the internal bitstream buffer.
    ///
    /// Returns the number of bytes *not* taken (the "valid" count).
    fn fill(&mut self, input: &[u8]) -> EngineResult<usize>;

    /// Decodes one frame from the internal buffer into `output`.
    ///
    /// Writes `frame_size * channels` interleaved samples as reported by
    /// [`DecoderEngine::stream_info`] afterwards. On `NotEnoughBits` and
    /// `OutputTooSmall` no bits are consumed.
    fn decode_frame(&mut self, output: &mut [i16]) -> EngineResult<()>;

    /// Synthesizes one frame for a lost packet. Same output contract as
    /// [`DecoderEngine::decode_frame`].
    fn conceal_frame(&mut self, output: &mut [i16]) -> EngineResult<()>;

    /// Stream facts, known once a frame has been decoded.
    fn stream_info(&self) -> Option<StreamInfo>;

    /// Samples per channel carried by `packet`, if the framing allows
    /// finding out without a decode.
    fn estimate_duration(&self, _packet: &[u8]) -> Option<usize> {
        None
    }

    /// Drops every buffered bitstream byte. Transport and concealment
    /// settings stay as configured.
    fn reset(&mut self);

    /// Releases the engine instance.
    fn close(&mut self);
}
