//! Result output port for writing detections.

use crate::domain::Detection;

/// Port for outputting detections.
pub trait ResultOutput: Send + Sync {
    /// Writes a single detection.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, detection: &Detection) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
