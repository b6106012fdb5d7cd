use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while locating, reading or parsing a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// No file at the given path, or none found in the search locations.
    FileNotFound(String),
    /// The file exists but could not be read.
    ReadError(String),
    /// The content is not valid JSON for the requested type.
    Parse { origin: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::ReadError(msg) => {
                write!(f, "Could not read configuration file: {}", msg)
            }
            ConfigError::Parse { origin, message } => {
                write!(f, "Invalid configuration in {}: {}", origin, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
