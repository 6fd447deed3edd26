//! Silent logger

use super::traits::Logger;

/// Discards every message; the default when no logger is injected
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Shared no-op logger, handy as a constructor default
pub fn noop() -> super::SharedLogger {
    std::sync::Arc::new(NoOpLogger)
}
