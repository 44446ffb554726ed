//! Transient user-facing acknowledgments.

use std::time::Duration;

use tracing::info;

/// A channel for short-lived acknowledgments such as "Diagram copied".
///
/// The implementation owns the dismiss timer; callers only say how long.
pub trait Notifier {
    fn notify(&self, message: &str, dismiss_label: &str, duration: Duration);
}

/// Notifier that records acknowledgments in the log. Used headless and by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, dismiss_label: &str, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        info!(message, dismiss_label, duration_ms, "notification");
    }
}
