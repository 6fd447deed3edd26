//! In-memory logger for assertions in tests

use parking_lot::Mutex;

use super::traits::Logger;

/// Records every line as `LEVEL message`
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// True if any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    fn record(&self, level: &str, message: &str) {
        self.lines.lock().push(format!("{} {}", level, message));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.record("DEBUG", message);
    }

    fn info(&self, message: &str) {
        self.record("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.record("WARN", message);
    }

    fn error(&self, message: &str) {
        self.record("ERROR", message);
    }
}
