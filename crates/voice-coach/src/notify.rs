//! Transient user notifications.
//!
//! Desktop toasts via notify-rust, mirrored to the log so headless runs
//! still see every message. Notification failures are logged and swallowed;
//! a missing notification daemon must never break a recording flow.

use notify_rust::Notification;
use tracing::{debug, info, warn};

/// Notification sink for transient success/error messages.
#[derive(Debug, Clone, Default)]
pub struct Notifier;

impl Notifier {
    /// Create a notifier.
    pub fn new() -> Self {
        Self
    }

    /// Surface a success message.
    pub fn success(&self, title: &str, body: &str) {
        info!(title, body, "notification");
        self.show(title, body);
    }

    /// Surface an informational message.
    pub fn info(&self, title: &str, body: &str) {
        info!(title, body, "notification");
        self.show(title, body);
    }

    /// Surface an error message.
    pub fn error(&self, title: &str, body: &str) {
        warn!(title, body, "notification");
        self.show(title, body);
    }

    fn show(&self, title: &str, body: &str) {
        if let Err(e) = Notification::new()
            .summary(title)
            .body(body)
            .appname("voice-coach")
            .show()
        {
            debug!(error = %e, "Desktop notification unavailable");
        }
    }
}
