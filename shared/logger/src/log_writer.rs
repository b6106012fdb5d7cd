//! Log sinks: a background file writer and an in-memory capture buffer.

use crate::error::{LoggingError, Result};
use crate::log_message::LogMessage;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

/// Where formatted records end up.
#[derive(Clone)]
pub(crate) enum LogSink {
    /// Records are queued to a dedicated writer thread.
    File(Sender<LogMessage>),
    /// Records are kept in memory; used by tests that assert on log output.
    Memory(Arc<Mutex<Vec<String>>>),
}

impl LogSink {
    /// Opens (or creates) `log_path` in append mode and starts its writer thread.
    pub fn file(log_path: &Path) -> Result<Self> {
        if log_path.as_os_str().is_empty() {
            return Err(LoggingError::Settings("empty log path".to_string()));
        }

        let (sender, receiver) = channel();
        let writer = FileWriter::open(log_path)?;
        std::thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || writer.run(receiver))?;
        Ok(LogSink::File(sender))
    }

    pub fn submit(&self, message: LogMessage) {
        match self {
            // A closed channel means the writer thread is gone; dropping the
            // record is the only option left.
            LogSink::File(sender) => {
                let _ = sender.send(message);
            }
            LogSink::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(message.format());
                }
            }
        }
    }
}

struct FileWriter {
    file: File,
}

impl FileWriter {
    fn open(log_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self { file })
    }

    fn write_message(&mut self, message: &LogMessage) {
        if let Err(e) = self.file.write_all(message.format().as_bytes()) {
            eprintln!("Error writing log: {}", e);
            return;
        }
        if let Err(e) = self.file.flush() {
            eprintln!("Error flushing log: {}", e);
        }
    }

    /// Drains the channel until every sender is dropped.
    fn run(mut self, receiver: Receiver<LogMessage>) {
        for message in receiver {
            self.write_message(&message);
        }
    }
}

/// Handle to the lines captured by an in-memory logger.
#[derive(Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn sink(&self) -> LogSink {
        LogSink::Memory(Arc::clone(&self.lines))
    }

    /// Snapshot of every formatted line captured so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Returns true if any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .map(|l| l.iter().any(|line| line.contains(needle)))
            .unwrap_or(false)
    }
}
