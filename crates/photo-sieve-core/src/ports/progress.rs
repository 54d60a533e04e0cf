//! Progress reporting port for deep scans.

use crate::domain::{Detection, ImageRef};

/// Events emitted during a deep scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// The scan enumerated its images.
    Started {
        /// Number of images to scan.
        total: usize,
    },
    /// One image was processed.
    Progress {
        /// Position of the image (1-based).
        current: usize,
        /// Number of images to scan.
        total: usize,
        /// The processed image.
        image: ImageRef,
        /// Whether the image was detected.
        detected: bool,
    },
    /// The scan ended, naturally or by cancellation.
    Finished {
        /// Images processed.
        scanned: usize,
        /// Images enumerated.
        total: usize,
        /// Accumulated detections, in enumeration order.
        detections: Vec<Detection>,
        /// Whether the scan was cancelled.
        cancelled: bool,
    },
}

/// Port for receiving scan progress.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ScanEvent);
}
