//! Component-tagged logger.
//!
//! This module provides the main [`Logger`] interface. Records are handed to
//! a sink without blocking the caller on file I/O, which keeps logging usable
//! from a real-time audio path.

use crate::error::Result;
use crate::log_level::LogLevel;
use crate::log_message::LogMessage;
use crate::log_writer::{LogSink, MemoryLog};
use std::path::PathBuf;
use std::sync::Arc;

/// Thread-safe, non-blocking logger.
///
/// Clones and [`Logger::for_component`] children share the same sink, so a
/// whole codec stack writes through one file handle and one writer thread.
///
/// # Examples
///
/// ```
/// use logging::{Logger, LogLevel};
///
/// let (logger, captured) = Logger::in_memory(LogLevel::Info);
/// let decoder_log = logger.for_component("AAC-DEC");
/// decoder_log.info("decoder opened");
/// assert!(captured.contains("[AAC-DEC]: decoder opened"));
/// ```
#[derive(Clone)]
pub struct Logger {
    sink: LogSink,
    level: LogLevel,
    component: Option<Arc<str>>,
    console_output: bool,
}

impl Logger {
    /// Creates a new logger writing to `log_path` from a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be created or opened.
    pub fn new(log_path: PathBuf, level: LogLevel) -> Result<Self> {
        Ok(Logger {
            sink: LogSink::file(&log_path)?,
            level,
            component: None,
            console_output: false,
        })
    }

    /// Creates a new file logger tagged with a component name.
    ///
    /// # Arguments
    ///
    /// * `log_path` - Path to log file (created if it doesn't exist)
    /// * `level` - Minimum log level to record
    /// * `component` - Component name (e.g., "AAC-ENC", "AAC-DEC")
    /// * `console_output` - Mirror every record to stdout
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be created or opened.
    pub fn with_component(
        log_path: PathBuf,
        level: LogLevel,
        component: String,
        console_output: bool,
    ) -> Result<Self> {
        Ok(Logger {
            sink: LogSink::file(&log_path)?,
            level,
            component: Some(Arc::from(component)),
            console_output,
        })
    }

    /// Creates a logger that keeps records in memory.
    ///
    /// Returns the logger together with the handle used to read what it
    /// captured. Intended for tests.
    pub fn in_memory(level: LogLevel) -> (Self, MemoryLog) {
        let memory = MemoryLog::new();
        let logger = Logger {
            sink: memory.sink(),
            level,
            component: None,
            console_output: false,
        };
        (logger, memory)
    }

    /// Derives a logger for another component that shares this logger's sink
    /// and level.
    pub fn for_component(&self, component: &str) -> Self {
        Logger {
            sink: self.sink.clone(),
            level: self.level,
            component: Some(Arc::from(component)),
            console_output: self.console_output,
        }
    }

    /// Minimum level this logger records.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns true if a record at `level` would be kept. Lets hot paths
    /// skip building a message nobody will read.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let msg = LogMessage::new(level, self.component.clone(), message.to_string());
        if self.console_output {
            print!("{}", msg.format());
        }
        self.sink.submit(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn wait_for_write() {
        thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn test_logger_creates_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let logger = Logger::new(log_path.clone(), LogLevel::Debug).unwrap();
        logger.info("Test message");
        wait_for_write();

        let content = fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn test_logger_respects_level() {
        let (logger, captured) = Logger::in_memory(LogLevel::Warn);
        logger.trace("Trace message");
        logger.debug("Debug message");
        logger.info("Info message");
        logger.warn("Warn message");

        assert!(!captured.contains("Trace message"));
        assert!(!captured.contains("Debug message"));
        assert!(!captured.contains("Info message"));
        assert!(captured.contains("Warn message"));
    }

    #[test]
    fn test_for_component_shares_sink() {
        let (logger, captured) = Logger::in_memory(LogLevel::Debug);
        let encoder_log = logger.for_component("AAC-ENC");
        let decoder_log = logger.for_component("AAC-DEC");

        encoder_log.info("encoder ready");
        decoder_log.error("decoder fault");

        let lines = captured.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO [AAC-ENC]: encoder ready"));
        assert!(lines[1].contains("ERROR [AAC-DEC]: decoder fault"));
    }

    #[test]
    fn test_for_component_shares_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let logger =
            Logger::with_component(log_path.clone(), LogLevel::Info, "CODEC".into(), false)
                .unwrap();
        let child = logger.for_component("AAC-DEC");

        thread::spawn(move || child.info("Message from thread"));
        logger.info("Message from main");
        wait_for_write();

        let content = fs::read_to_string(log_path).unwrap();
        assert!(content.contains("[AAC-DEC]: Message from thread"));
        assert!(content.contains("[CODEC]: Message from main"));
    }

    #[test]
    fn test_enabled() {
        let (logger, _captured) = Logger::in_memory(LogLevel::Debug);
        assert!(!logger.enabled(LogLevel::Trace));
        assert!(logger.enabled(LogLevel::Debug));
        assert!(logger.enabled(LogLevel::Error));
        assert_eq!(logger.level(), LogLevel::Debug);
    }
}
