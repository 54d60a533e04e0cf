//! Deep scan over selected albums.
//!
//! Enumerates every image of the chosen albums (most recent first) and scores
//! them one after another. Cancellation is checked before each image, so a
//! cancel request can wait up to one image's processing time.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::domain::{AlbumId, Detection, ImageRef};
use crate::error::SieveError;
use crate::ports::{PhotoLibrary, ProgressSink, ScanEvent};
use crate::scoring::{Detector, Verdict};

/// Outcome of a deep scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Images enumerated.
    pub total: usize,
    /// Images processed before the scan ended.
    pub scanned: usize,
    /// Detections in enumeration order.
    pub detections: Vec<Detection>,
    /// Images whose evaluation failed.
    pub failures: Vec<(ImageRef, SieveError)>,
    /// Whether the scan stopped on a cancel request.
    pub cancelled: bool,
    /// Why the library could not be enumerated, if it could not.
    pub query_error: Option<SieveError>,
}

impl ScanReport {
    /// Images of the detections, in order.
    #[must_use]
    pub fn detected_images(&self) -> Vec<ImageRef> {
        self.detections.iter().map(|d| d.image.clone()).collect()
    }
}

/// Scans the given albums on the current thread.
pub fn run_scan(
    library: &dyn PhotoLibrary,
    detector: &Detector,
    albums: &[AlbumId],
    token: &CancellationToken,
    progress: &dyn ProgressSink,
) -> ScanReport {
    let mut report = ScanReport::default();

    let images = match library.images_in(albums) {
        Ok(images) => images,
        Err(e) => {
            let error = SieveError::query(e);
            warn!("{error}: {}", error.causes());
            report.query_error = Some(error);
            finish(&report, progress);
            return report;
        }
    };

    report.total = images.len();
    info!("Scanning {} image(s) in {} album(s)", report.total, albums.len());
    progress.on_event(ScanEvent::Started {
        total: report.total,
    });

    for image in images {
        if token.is_cancelled() {
            info!("Scan cancelled after {} image(s)", report.scanned);
            report.cancelled = true;
            break;
        }

        let verdict = detector.evaluate(library, &image);
        let detected = verdict.is_detected();
        match verdict {
            Verdict::Detected(score) => {
                report.detections.push(Detection::now(image.clone(), score));
            }
            Verdict::Clear(_) => {}
            Verdict::Failed(e) => report.failures.push((image.clone(), e)),
        }

        report.scanned += 1;
        progress.on_event(ScanEvent::Progress {
            current: report.scanned,
            total: report.total,
            image,
            detected,
        });
    }

    finish(&report, progress);
    report
}

fn finish(report: &ScanReport, progress: &dyn ProgressSink) {
    debug!(
        "Scan finished: {}/{} scanned, {} detected, {} failed",
        report.scanned,
        report.total,
        report.detections.len(),
        report.failures.len()
    );
    progress.on_event(ScanEvent::Finished {
        scanned: report.scanned,
        total: report.total,
        detections: report.detections.clone(),
        cancelled: report.cancelled,
    });
}

/// Handle of a scan running on its own thread.
pub struct ScanHandle {
    token: CancellationToken,
    handle: JoinHandle<ScanReport>,
}

impl ScanHandle {
    /// Token that cancels this scan.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for the scan and returns its report.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan thread panicked.
    pub fn join(self) -> Result<ScanReport> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("Scan thread panicked"))
    }
}

/// Starts a scan on a background thread.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_scan(
    library: Arc<dyn PhotoLibrary>,
    detector: Detector,
    albums: Vec<AlbumId>,
    progress: Arc<dyn ProgressSink>,
) -> Result<ScanHandle> {
    let token = CancellationToken::new();
    let thread_token = token.clone();
    let handle = thread::Builder::new()
        .name("sieve-scan".into())
        .spawn(move || run_scan(&*library, &detector, &albums, &thread_token, &*progress))
        .context("Failed to spawn scan thread")?;

    Ok(ScanHandle { token, handle })
}
