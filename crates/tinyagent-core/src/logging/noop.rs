//! Silent logger

use super::traits::Logger;

/// Discards every message
///
/// The default logger in tests and for the scripted model client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&self, _: &str) {}

    fn info(&self, _: &str) {}

    fn warn(&self, _: &str) {}

    fn error(&self, _: &str) {}
}
