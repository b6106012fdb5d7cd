//! AAC stream parameters shared by the encoder and decoder adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio object type (profile) an encoder is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioObjectType {
    /// AAC-LC, the baseline profile
    Lc,
    /// HE-AAC (LC + SBR)
    HeV1,
    /// HE-AAC v2 (LC + SBR + PS)
    HeV2,
    /// AAC-LD
    Ld,
    /// AAC-ELD
    Eld,
}

impl AudioObjectType {
    /// MPEG-4 audio object type identifier, as carried in an
    /// AudioSpecificConfig and passed to the engine.
    pub fn mpeg4_id(self) -> i32 {
        match self {
            AudioObjectType::Lc => 2,
            AudioObjectType::HeV1 => 5,
            AudioObjectType::HeV2 => 29,
            AudioObjectType::Ld => 23,
            AudioObjectType::Eld => 39,
        }
    }

    pub fn from_mpeg4_id(id: i32) -> Option<Self> {
        match id {
            2 => Some(AudioObjectType::Lc),
            5 => Some(AudioObjectType::HeV1),
            29 => Some(AudioObjectType::HeV2),
            23 => Some(AudioObjectType::Ld),
            39 => Some(AudioObjectType::Eld),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AudioObjectType::Lc => "AAC-LC",
            AudioObjectType::HeV1 => "HE-AAC",
            AudioObjectType::HeV2 => "HE-AACv2",
            AudioObjectType::Ld => "AAC-LD",
            AudioObjectType::Eld => "AAC-ELD",
        }
    }

    /// Low-delay profiles frame on a 480/512 granule.
    pub fn is_low_delay(self) -> bool {
        matches!(self, AudioObjectType::Ld | AudioObjectType::Eld)
    }

    /// ELD needs explicit SBR and granule settings before the sample rate.
    pub fn requires_sbr_override(self) -> bool {
        self == AudioObjectType::Eld
    }

    pub fn default_bitrate(self) -> u32 {
        match self {
            AudioObjectType::Eld => 24_000,
            _ => 32_000,
        }
    }

    pub fn default_bitrate_mode(self) -> BitrateMode {
        match self {
            AudioObjectType::Eld => BitrateMode::LowDelayVariable,
            _ => BitrateMode::Constant,
        }
    }

    /// RTP/UDP carriage needs a self-delimiting framing: ADTS for the
    /// classic profiles, LOAS for ELD.
    pub fn default_transport(self) -> TransportType {
        match self {
            AudioObjectType::Eld => TransportType::Loas,
            _ => TransportType::Adts,
        }
    }
}

impl fmt::Display for AudioObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packaging convention of the compressed bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Bare access units; boundaries come from the packet itself
    Raw,
    Adif,
    Adts,
    /// LATM with in-band StreamMuxConfig
    LatmMcp1,
    /// LATM with out-of-band StreamMuxConfig
    LatmMcp0,
    Loas,
}

impl TransportType {
    /// Transport identifier understood by the engine.
    pub fn engine_id(self) -> i32 {
        match self {
            TransportType::Raw => 0,
            TransportType::Adif => 1,
            TransportType::Adts => 2,
            TransportType::LatmMcp1 => 6,
            TransportType::LatmMcp0 => 7,
            TransportType::Loas => 10,
        }
    }

    pub fn from_engine_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(TransportType::Raw),
            1 => Some(TransportType::Adif),
            2 => Some(TransportType::Adts),
            6 => Some(TransportType::LatmMcp1),
            7 => Some(TransportType::LatmMcp0),
            10 => Some(TransportType::Loas),
            _ => None,
        }
    }

    /// Framings in which every frame announces its own length.
    pub fn is_self_delimiting(self) -> bool {
        matches!(self, TransportType::Adts | TransportType::Loas)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportType::Raw => "raw",
            TransportType::Adif => "ADIF",
            TransportType::Adts => "ADTS",
            TransportType::LatmMcp1 => "LATM (MCP1)",
            TransportType::LatmMcp0 => "LATM (MCP0)",
            TransportType::Loas => "LOAS",
        };
        f.write_str(name)
    }
}

/// Rate control of the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitrateMode {
    Constant,
    /// Quality-driven VBR, 1 (lowest) to 5 (highest)
    Variable(u8),
    /// VBR flavour reserved for the low-delay profiles
    LowDelayVariable,
}

impl BitrateMode {
    pub fn engine_value(self) -> i32 {
        match self {
            BitrateMode::Constant => 0,
            BitrateMode::Variable(quality) => i32::from(quality),
            BitrateMode::LowDelayVariable => 8,
        }
    }

    pub fn is_valid(self) -> bool {
        match self {
            BitrateMode::Variable(quality) => (1..=5).contains(&quality),
            _ => true,
        }
    }
}

/// Engine channel mode for an interleaved channel count.
///
/// 1..=6 channels map onto modes 1..=6; 7.1 (8 channels) is mode 7.
pub fn channel_mode(channels: u32) -> Option<i32> {
    match channels {
        1..=6 => Some(channels as i32),
        8 => Some(7),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_ids_round_trip() {
        for aot in [
            AudioObjectType::Lc,
            AudioObjectType::HeV1,
            AudioObjectType::HeV2,
            AudioObjectType::Ld,
            AudioObjectType::Eld,
        ] {
            assert_eq!(AudioObjectType::from_mpeg4_id(aot.mpeg4_id()), Some(aot));
        }
        assert_eq!(AudioObjectType::from_mpeg4_id(1), None);
    }

    #[test]
    fn test_eld_defaults() {
        let eld = AudioObjectType::Eld;
        assert_eq!(eld.default_bitrate(), 24_000);
        assert_eq!(eld.default_bitrate_mode(), BitrateMode::LowDelayVariable);
        assert_eq!(eld.default_transport(), TransportType::Loas);
        assert!(eld.requires_sbr_override());
    }

    #[test]
    fn test_baseline_defaults() {
        let lc = AudioObjectType::Lc;
        assert_eq!(lc.default_bitrate(), 32_000);
        assert_eq!(lc.default_bitrate_mode(), BitrateMode::Constant);
        assert_eq!(lc.default_transport(), TransportType::Adts);
        assert!(!lc.is_low_delay());
    }

    #[test]
    fn test_bitrate_mode_validation() {
        assert!(BitrateMode::Variable(3).is_valid());
        assert!(!BitrateMode::Variable(0).is_valid());
        assert!(!BitrateMode::Variable(6).is_valid());
        assert_eq!(BitrateMode::LowDelayVariable.engine_value(), 8);
    }

    #[test]
    fn test_channel_mode() {
        assert_eq!(channel_mode(1), Some(1));
        assert_eq!(channel_mode(2), Some(2));
        assert_eq!(channel_mode(8), Some(7));
        assert_eq!(channel_mode(0), None);
        assert_eq!(channel_mode(7), None);
    }

    #[test]
    fn test_transport_ids() {
        assert_eq!(TransportType::Adts.engine_id(), 2);
        assert_eq!(TransportType::from_engine_id(10), Some(TransportType::Loas));
        assert!(TransportType::Adts.is_self_delimiting());
        assert!(!TransportType::Raw.is_self_delimiting());
    }

    #[test]
    fn test_settings_names() {
        assert_eq!(serde_json::to_string(&AudioObjectType::HeV2).unwrap(), "\"he_v2\"");
        assert_eq!(
            serde_json::from_str::<TransportType>("\"latm_mcp1\"").unwrap(),
            TransportType::LatmMcp1
        );
        assert_eq!(
            serde_json::from_str::<BitrateMode>("{\"variable\":4}").unwrap(),
            BitrateMode::Variable(4)
        );
    }
}
