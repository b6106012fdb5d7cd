//! Encoder configuration and its ordered engine parameter list.

use super::engine::EncoderParam;
use super::types::{AudioObjectType, BitrateMode, TransportType, channel_mode};
use crate::common::constants::aac::{CHANNEL_ORDER_WAV, LOW_DELAY_GRANULE, SBR_MODE_DEFAULT};
use crate::error::{CodecError, Result};

/// Settings of one encoder handle. Applied once at open; a different
/// configuration needs a new encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub object_type: AudioObjectType,
    pub sample_rate: u32,
    pub channels: u32,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    pub bitrate_mode: BitrateMode,
    pub transport: TransportType,
    pub afterburner: bool,
}

impl EncoderConfig {
    /// Configuration with the defaults of the given object type.
    ///
    /// # Examples
    ///
    /// ```
    /// use audio_coding::{AudioObjectType, EncoderConfig, TransportType};
    ///
    /// let config = EncoderConfig::new(AudioObjectType::Eld, 48000, 1);
    /// assert_eq!(config.bitrate, 24000);
    /// assert_eq!(config.transport, TransportType::Loas);
    /// ```
    pub fn new(object_type: AudioObjectType, sample_rate: u32, channels: u32) -> Self {
        Self {
            object_type,
            sample_rate,
            channels,
            bitrate: object_type.default_bitrate(),
            bitrate_mode: object_type.default_bitrate_mode(),
            transport: object_type.default_transport(),
            afterburner: true,
        }
    }

    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_bitrate_mode(mut self, mode: BitrateMode) -> Self {
        self.bitrate_mode = mode;
        self
    }

    pub fn with_transport(mut self, transport: TransportType) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_afterburner(mut self, afterburner: bool) -> Self {
        self.afterburner = afterburner;
        self
    }

    /// Checks values that no engine could accept.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CodecError::Config("sample rate must be positive".to_string()));
        }
        if channel_mode(self.channels).is_none() {
            return Err(CodecError::Config(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.bitrate == 0 || i32::try_from(self.bitrate).is_err() {
            return Err(CodecError::Config(format!(
                "bitrate out of range: {}",
                self.bitrate
            )));
        }
        if !self.bitrate_mode.is_valid() {
            return Err(CodecError::Config(format!(
                "invalid bitrate mode: {:?}",
                self.bitrate_mode
            )));
        }
        Ok(())
    }

    /// Engine parameters in the order they must be applied.
    ///
    /// Object type first, then the SBR/granule overrides the object type
    /// needs, then sample rate, channel mode, channel order, bitrate mode,
    /// bitrate, transport and afterburner. Call [`EncoderConfig::validate`]
    /// first; out-of-range values are passed through for the engine to
    /// reject.
    pub fn parameter_sequence(&self) -> Vec<(EncoderParam, i32)> {
        let mut params = vec![(EncoderParam::AudioObjectType, self.object_type.mpeg4_id())];

        if self.object_type.requires_sbr_override() {
            params.push((EncoderParam::SbrMode, SBR_MODE_DEFAULT));
            params.push((EncoderParam::GranuleLength, LOW_DELAY_GRANULE as i32));
        }

        params.extend([
            (
                EncoderParam::SampleRate,
                i32::try_from(self.sample_rate).unwrap_or(i32::MAX),
            ),
            (
                EncoderParam::ChannelMode,
                channel_mode(self.channels).unwrap_or(0),
            ),
            (EncoderParam::ChannelOrder, CHANNEL_ORDER_WAV),
            (EncoderParam::BitrateMode, self.bitrate_mode.engine_value()),
            (
                EncoderParam::Bitrate,
                i32::try_from(self.bitrate).unwrap_or(i32::MAX),
            ),
            (EncoderParam::Transmux, self.transport.engine_id()),
            (EncoderParam::Afterburner, i32::from(self.afterburner)),
        ]);
        params
    }
}
