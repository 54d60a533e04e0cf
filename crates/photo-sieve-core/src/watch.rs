//! Change watcher.
//!
//! Subscribes to the library change feed, re-queries the newest item on every
//! event and hands new items to a single scoring worker.
//!
//! ```text
//!   feed --ChangeEvent--> [consumer] --ImageRef (depth 1)--> [worker] --> DetectionList
//!                              |                                  |
//!                        ChangeTracker                        Notifier
//! ```
//!
//! The hand-off channel holds one item. An item that arrives while the slot is
//! taken is dropped; it is only picked up if a later change event reports a
//! different newest item.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::domain::{Detection, DetectionList, ImageRef};
use crate::error::SieveError;
use crate::ports::{ChangeEvent, ChangeFeed, Notifier, PhotoLibrary, Subscription};
use crate::scoring::{Detector, Verdict};

/// How often the watcher threads check for a stop request while idle.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle of the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not subscribed.
    Idle,
    /// Subscribed and waiting for change events.
    AwaitingNotification,
    /// Scoring a new item.
    Scoring,
}

/// Remembers the last item seen so repeated events do not trigger a rescore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    last_seen: Option<String>,
}

impl ChangeTracker {
    /// Creates a tracker seeded with the id of the current newest item.
    #[must_use]
    pub const fn new(last_seen: Option<String>) -> Self {
        Self { last_seen }
    }

    /// Id of the last item seen.
    #[must_use]
    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Returns `latest` if it differs from the last item seen, and records it.
    pub fn observe(&mut self, latest: Option<ImageRef>) -> Option<ImageRef> {
        let latest = latest?;
        if self.last_seen.as_deref() == Some(latest.id.as_str()) {
            return None;
        }
        self.last_seen = Some(latest.id.clone());
        Some(latest)
    }
}

/// Collaborators of a running watcher.
#[derive(Clone)]
pub struct Watcher {
    library: Arc<dyn PhotoLibrary>,
    feed: Arc<dyn ChangeFeed>,
    detector: Detector,
    notifier: Arc<dyn Notifier>,
    detections: DetectionList,
}

impl Watcher {
    /// Creates a watcher that appends detections to `detections`.
    #[must_use]
    pub fn new(
        library: Arc<dyn PhotoLibrary>,
        feed: Arc<dyn ChangeFeed>,
        detector: Detector,
        notifier: Arc<dyn Notifier>,
        detections: DetectionList,
    ) -> Self {
        Self {
            library,
            feed,
            detector,
            notifier,
            detections,
        }
    }

    /// Seeds the tracker from the library, subscribes and starts the threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription or a thread cannot be started.
    pub fn start(self) -> Result<WatchHandle> {
        let seed = query_latest(&*self.library)
            .ok()
            .flatten()
            .map(|image| image.id);
        let tracker = ChangeTracker::new(seed);
        debug!("Watcher seeded with {:?}", tracker.last_seen());

        let state = Arc::new(Mutex::new(WatchState::Idle));
        let stop = CancellationToken::new();

        let (event_tx, event_rx) = mpsc::channel();
        let subscription = self
            .feed
            .subscribe(event_tx)
            .context("Failed to subscribe to library changes")?;
        set_state(&state, WatchState::AwaitingNotification);

        let (work_tx, work_rx) = mpsc::sync_channel::<ImageRef>(1);

        let worker = {
            let state = Arc::clone(&state);
            let stop = stop.clone();
            let watcher = self.clone();
            thread::Builder::new()
                .name("sieve-score".into())
                .spawn(move || watcher.score_loop(&work_rx, &state, &stop))
                .context("Failed to spawn scoring worker")?
        };

        let consumer = {
            let stop = stop.clone();
            let library = Arc::clone(&self.library);
            thread::Builder::new()
                .name("sieve-watch".into())
                .spawn(move || consume_events(&*library, tracker, &event_rx, &work_tx, &stop))
                .context("Failed to spawn change consumer")?
        };

        info!("Watching for new images");

        Ok(WatchHandle {
            subscription: Some(subscription),
            stop,
            state,
            threads: vec![consumer, worker],
        })
    }

    fn score_loop(&self, work: &Receiver<ImageRef>, state: &Mutex<WatchState>, stop: &CancellationToken) {
        while !stop.is_cancelled() {
            let image = match work.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(image) => image,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            set_state(state, WatchState::Scoring);
            if let Verdict::Detected(score) = self.detector.evaluate(&*self.library, &image) {
                info!("Detected {} (score {:.3})", image.uri, score.value());
                let all = self.detections.push(Detection::now(image, score));
                self.notifier.detections_changed(&all);
            }
            set_state(state, WatchState::AwaitingNotification);
        }
        debug!("Scoring worker stopped");
    }
}

/// Receives change events one at a time and dispatches new items.
fn consume_events(
    library: &dyn PhotoLibrary,
    mut tracker: ChangeTracker,
    events: &Receiver<ChangeEvent>,
    work: &SyncSender<ImageRef>,
    stop: &CancellationToken,
) {
    while !stop.is_cancelled() {
        match events.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let Ok(latest) = query_latest(library) else {
            continue;
        };

        let Some(image) = tracker.observe(latest) else {
            debug!("Change event without a new item");
            continue;
        };

        match work.try_send(image) {
            Ok(()) => {}
            Err(TrySendError::Full(image)) => {
                debug!("Scoring worker busy, missed {}", image.uri);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    debug!("Change consumer stopped");
}

/// Newest library item; a failure is logged and returned as a query error.
fn query_latest(library: &dyn PhotoLibrary) -> Result<Option<ImageRef>, SieveError> {
    library.latest().map_err(|e| {
        let error = SieveError::query(e);
        warn!("{error}: {}", error.causes());
        error
    })
}

fn set_state(state: &Mutex<WatchState>, next: WatchState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

/// Handle of a running watcher. Dropping it stops the watcher.
pub struct WatchHandle {
    subscription: Option<Subscription>,
    stop: CancellationToken,
    state: Arc<Mutex<WatchState>>,
    threads: Vec<JoinHandle<()>>,
}

impl WatchHandle {
    /// Current state of the watcher.
    #[must_use]
    pub fn state(&self) -> WatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unsubscribes, stops both threads and waits for them.
    ///
    /// An image being scored is finished first.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.stop.cancel();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                warn!("Watcher thread panicked");
            }
        }
        set_state(&self.state, WatchState::Idle);
        info!("Stopped watching");
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.shutdown();
        }
    }
}
