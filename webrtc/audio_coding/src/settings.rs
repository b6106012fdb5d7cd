//! Codec settings loaded from a JSON file.
//!
//! Every section and field is optional:
//!
//! ```json
//! {
//!   "encoder": { "object_type": "lc", "sample_rate": 48000, "channels": 1, "bitrate": 64000 },
//!   "decoder": { "transport": "adts" },
//!   "logging": { "path": "audio_coding.log", "level": "debug", "console": false }
//! }
//! ```

use crate::aac::config::EncoderConfig;
use crate::aac::types::{AudioObjectType, BitrateMode, TransportType};
use crate::error::Result;
use logging::{LogLevel, Logger};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name searched for by [`CodecSettings::discover`].
pub const FILE_NAME: &str = "audio_coding.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    pub encoder: EncoderSettings,
    pub decoder: DecoderSettings,
    pub logging: LoggingSettings,
}

impl CodecSettings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(config_loader::load_json(path)?)
    }

    /// Loads [`FILE_NAME`] from the standard locations, falling back to
    /// defaults when no file exists. A file that exists but does not parse
    /// is an error.
    pub fn discover() -> Result<Self> {
        match config_loader::find_config_file(FILE_NAME) {
            Ok(path) => Self::load_from_file(path),
            Err(config_loader::ConfigError::FileNotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Encoder section. Unset fields take the object type's defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub object_type: AudioObjectType,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: Option<u32>,
    pub bitrate_mode: Option<BitrateMode>,
    pub transport: Option<TransportType>,
    pub afterburner: Option<bool>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            object_type: AudioObjectType::Lc,
            sample_rate: 48000,
            channels: 1,
            bitrate: None,
            bitrate_mode: None,
            transport: None,
            afterburner: None,
        }
    }
}

impl EncoderSettings {
    pub fn to_config(&self) -> EncoderConfig {
        let mut config = EncoderConfig::new(self.object_type, self.sample_rate, self.channels);
        if let Some(bitrate) = self.bitrate {
            config = config.with_bitrate(bitrate);
        }
        if let Some(mode) = self.bitrate_mode {
            config = config.with_bitrate_mode(mode);
        }
        if let Some(transport) = self.transport {
            config = config.with_transport(transport);
        }
        if let Some(afterburner) = self.afterburner {
            config = config.with_afterburner(afterburner);
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderSettings {
    pub transport: TransportType,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            transport: TransportType::Adts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub path: PathBuf,
    /// Level name; unknown names mean "info"
    pub level: String,
    pub component: String,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("audio_coding.log"),
            level: "info".to_string(),
            component: "AAC".to_string(),
            console: false,
        }
    }
}

impl LoggingSettings {
    pub fn log_level(&self) -> LogLevel {
        self.level.parse().unwrap_or(LogLevel::Info)
    }

    /// Opens the log file and returns a logger tagged with the component.
    pub fn build_logger(&self) -> Result<Logger> {
        Ok(Logger::with_component(
            self.path.clone(),
            self.log_level(),
            self.component.clone(),
            self.console,
        )?)
    }
}
