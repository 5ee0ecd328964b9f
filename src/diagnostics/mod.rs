//! Diagnostic events emitted by the connector.
//!
//! Components never decide on their own whether to log. They hand messages to
//! [`Diagnostics`], which forwards them to the configured [`DiagnosticsSink`]
//! only when request logging is enabled.

use std::sync::{Arc, Mutex};

/// Log target used for diagnostics forwarded to `tracing`.
pub const LOG_TARGET: &str = "sharepoint_connector";

/// Receiver of human-readable diagnostic messages.
pub trait DiagnosticsSink: Send + Sync {
    fn log_info(&self, message: &str);
    fn log_warning(&self, message: &str);
    fn log_error(&self, message: &str);
}

/// Forwards diagnostics to `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log_info(&self, message: &str) {
        tracing::info!(target: LOG_TARGET, "{}", message);
    }

    fn log_warning(&self, message: &str) {
        tracing::warn!(target: LOG_TARGET, "{}", message);
    }

    fn log_error(&self, message: &str) {
        tracing::error!(target: LOG_TARGET, "{}", message);
    }
}

/// Severity of a captured diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A diagnostic captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub level: Level,
    pub message: String,
}

/// Keeps every diagnostic in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(DiagnosticEvent {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn log_info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn log_warning(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn log_error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}

/// A sink plus the logging-enabled flag.
///
/// When disabled, every call is a no-op.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    enabled: bool,
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticsSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            self.sink.log_info(message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.enabled {
            self.sink.log_warning(message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled {
            self.sink.log_error(message);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_forwards_all_levels() {
        let sink = Arc::new(MemorySink::new());
        let diagnostics = Diagnostics::new(sink.clone(), true);

        diagnostics.info("posted");
        diagnostics.warning("slow");
        diagnostics.error("failed");

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].level, Level::Info);
        assert_eq!(events[0].message, "posted");
        assert_eq!(events[1].level, Level::Warning);
        assert_eq!(events[2].level, Level::Error);
        assert_eq!(events[2].message, "failed");
    }

    #[test]
    fn test_disabled_is_silent() {
        let sink = Arc::new(MemorySink::new());
        let diagnostics = Diagnostics::new(sink.clone(), false);

        diagnostics.info("posted");
        diagnostics.warning("slow");
        diagnostics.error("failed");

        assert!(sink.events().is_empty());
        assert!(!diagnostics.is_enabled());
    }
}
