//! Component-tagged, non-blocking logging for the audio coding stack.

pub mod error;
mod log_level;
mod log_message;
mod log_writer;
mod logger;

pub use error::{LoggingError, Result};
pub use log_level::LogLevel;
pub use log_writer::MemoryLog;
pub use logger::Logger;
