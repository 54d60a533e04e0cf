//! Facade tying the library, change feed, detector and notifier together.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::{Album, AlbumId, Detection, DetectionList, ImageRef};
use crate::export::{export, ExportReport};
use crate::ports::{ChangeFeed, Destination, Notifier, PhotoLibrary, ProgressSink};
use crate::scan::{spawn_scan, ScanHandle};
use crate::scoring::Detector;
use crate::watch::{WatchHandle, WatchState, Watcher};

/// Entry point for the interactive surfaces.
///
/// Owns the detection list shared by the watcher and the caller.
pub struct Sieve {
    library: Arc<dyn PhotoLibrary>,
    feed: Arc<dyn ChangeFeed>,
    detector: Detector,
    notifier: Arc<dyn Notifier>,
    detections: DetectionList,
    watch: Option<WatchHandle>,
}

impl Sieve {
    /// Creates a facade with an empty detection list.
    #[must_use]
    pub fn new(
        library: Arc<dyn PhotoLibrary>,
        feed: Arc<dyn ChangeFeed>,
        detector: Detector,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            library,
            feed,
            detector,
            notifier,
            detections: DetectionList::new(),
            watch: None,
        }
    }

    /// Starts watching the library. Does nothing if already watching.
    ///
    /// # Errors
    ///
    /// Returns an error if the change feed subscription fails.
    pub fn start_watch(&mut self) -> Result<()> {
        if self.watch.is_some() {
            return Ok(());
        }
        let watcher = Watcher::new(
            Arc::clone(&self.library),
            Arc::clone(&self.feed),
            self.detector.clone(),
            Arc::clone(&self.notifier),
            self.detections.clone(),
        );
        self.watch = Some(watcher.start().context("Failed to start watcher")?);
        Ok(())
    }

    /// Stops watching. Does nothing if not watching.
    pub fn stop_watch(&mut self) {
        if let Some(handle) = self.watch.take() {
            handle.stop();
        }
    }

    /// Returns true while the watcher runs.
    #[must_use]
    pub const fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Current watcher state.
    #[must_use]
    pub fn watch_state(&self) -> WatchState {
        self.watch.as_ref().map_or(WatchState::Idle, WatchHandle::state)
    }

    /// Starts a deep scan of the given albums on a background thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan thread cannot be spawned.
    pub fn start_scan(
        &self,
        albums: Vec<AlbumId>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<ScanHandle> {
        spawn_scan(
            Arc::clone(&self.library),
            self.detector.clone(),
            albums,
            progress,
        )
    }

    /// Detections gathered by the watcher, oldest first.
    #[must_use]
    pub fn detections(&self) -> Vec<Detection> {
        self.detections.snapshot()
    }

    /// Images of [`Self::detections`].
    #[must_use]
    pub fn detected_images(&self) -> Vec<ImageRef> {
        self.detections
            .snapshot()
            .into_iter()
            .map(|d| d.image)
            .collect()
    }

    /// Empties the detection list and dismisses the notification.
    pub fn clear_detections(&self) {
        self.detections.clear();
        self.notifier.cleared();
        info!("Cleared detections");
    }

    /// Copies images into `destination`.
    #[must_use]
    pub fn export(&self, selected: &[ImageRef], destination: &dyn Destination) -> ExportReport {
        export(&*self.library, selected, destination)
    }

    /// Albums of the library.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be queried.
    pub fn albums(&self) -> Result<Vec<Album>> {
        self.library.albums()
    }
}

impl Drop for Sieve {
    fn drop(&mut self) {
        self.stop_watch();
    }
}
