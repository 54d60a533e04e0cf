//! Polling change feed for a filesystem library.
//!
//! Each subscription owns a thread that rescans the library root at a fixed
//! interval and sends a [`ChangeEvent`] whenever the library fingerprint
//! (file count, newest modification time, total size) changes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use photo_sieve_core::{ChangeEvent, ChangeFeed, Subscription};
use tracing::{debug, trace, warn};

use crate::fs::scan_library;

/// Default time between two library scans.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Granularity at which a sleeping poller notices a stop request.
const SLEEP_CHUNK: Duration = Duration::from_millis(50);

/// Summary of the library contents used to detect changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Fingerprint {
    count: usize,
    newest: Option<SystemTime>,
    total_len: u64,
}

fn fingerprint(root: &std::path::Path) -> Result<Fingerprint> {
    let files = scan_library(root)?;
    Ok(Fingerprint {
        count: files.len(),
        newest: files.iter().map(|f| f.modified).max(),
        total_len: files.iter().map(|f| f.len).sum(),
    })
}

/// Change feed that polls a library root.
#[derive(Debug, Clone)]
pub struct PollingChangeFeed {
    root: PathBuf,
    interval: Duration,
}

impl PollingChangeFeed {
    /// Creates a feed for `root` polling every `interval`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            root: root.into(),
            interval,
        }
    }
}

impl ChangeFeed for PollingChangeFeed {
    fn subscribe(&self, sink: Sender<ChangeEvent>) -> Result<Subscription> {
        let mut last = fingerprint(&self.root).context("Failed to scan library")?;
        let root = self.root.clone();
        let interval = self.interval;

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("sieve-poll".into())
            .spawn(move || {
                debug!("Polling {} every {interval:?}", root.display());
                loop {
                    if sleep_with_cancellation(&flag, interval) {
                        break;
                    }
                    let current = match fingerprint(&root) {
                        Ok(current) => current,
                        Err(e) => {
                            warn!("Library poll failed: {e:#}");
                            continue;
                        }
                    };
                    if current == last {
                        trace!("No library change");
                        continue;
                    }
                    last = current;
                    if sink.send(ChangeEvent::now()).is_err() {
                        debug!("Change receiver dropped");
                        break;
                    }
                }
                debug!("Poller stopped");
            })
            .context("Failed to spawn library poller")?;

        Ok(Subscription::new(move || {
            stop.store(true, Ordering::Relaxed);
            if handle.join().is_err() {
                warn!("Library poller panicked");
            }
        }))
    }
}

/// Sleeps for `duration` in small steps. Returns true if `flag` was raised.
fn sleep_with_cancellation(flag: &AtomicBool, duration: Duration) -> bool {
    let mut elapsed = Duration::ZERO;
    while elapsed < duration {
        if flag.load(Ordering::Relaxed) {
            return true;
        }
        let step = SLEEP_CHUNK.min(duration - elapsed);
        thread::sleep(step);
        elapsed += step;
    }
    flag.load(Ordering::Relaxed)
}
