//! Console notifier: the aggregate notification printed to stderr.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use photo_sieve_core::{summary_title, Detection, Notifier};
use tracing::debug;

/// Prints the running summary of watcher detections.
pub struct ConsoleNotifier {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleNotifier {
    /// Creates a notifier writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Creates a notifier writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn emit(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            debug!("Failed to write notification: {e}");
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn detections_changed(&self, detections: &[Detection]) {
        let mut line = format!("[notify] {}", summary_title(detections.len()));
        if let Some(last) = detections.last() {
            line.push_str(&format!(" (latest: {})", last.image));
        }
        self.emit(&line);
    }

    fn cleared(&self) {
        self.emit("[notify] dismissed");
    }
}
