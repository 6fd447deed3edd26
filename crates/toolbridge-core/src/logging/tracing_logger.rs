//! Logger backed by the `tracing` ecosystem

use super::traits::Logger;

/// Forwards messages to `tracing` events tagged with a component name.
///
/// Binaries install a `tracing-subscriber`; the library never does.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("toolbridge")
    }
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }
}
