// src/diagnostics.rs

use log::Level;
use parking_lot::Mutex;

/// Log target used by [`LogDiagnostics`].
pub const LOG_TARGET: &str = "amplicon_tester";

/// Sink for progress and warning messages.
///
/// Every component that reports something receives one of these explicitly,
/// so the library itself never touches a global logger.
pub trait Diagnostics {
    fn emit(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);
    }
}

/// Keeps messages in memory. Handy in tests and for callers that want to
/// surface warnings themselves.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    messages: Mutex<Vec<(Level, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().clone()
    }

    /// Only the warning-level messages.
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn emit(&self, level: Level, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }
}
