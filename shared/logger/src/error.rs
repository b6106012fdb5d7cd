//! Error types for logger construction.

use std::fmt;
use std::io;

/// Result type for logging operations.
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Errors raised while setting up a log sink. Writing a record never fails
/// from the caller's point of view.
#[derive(Debug)]
pub enum LoggingError {
    /// The log file could not be opened or the writer thread not started.
    Io(io::Error),
    /// Invalid logger settings.
    Settings(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Io(err) => write!(f, "Log sink I/O error: {}", err),
            LoggingError::Settings(msg) => write!(f, "Invalid logger settings: {}", msg),
        }
    }
}

impl std::error::Error for LoggingError {}

impl From<io::Error> for LoggingError {
    fn from(err: io::Error) -> Self {
        LoggingError::Io(err)
    }
}
