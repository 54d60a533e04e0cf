//! Mock implementations of core port traits.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use photo_sieve_core::{
    summary_title, Album, AlbumId, CancellationToken, ChangeEvent, ChangeFeed, CreatedFile,
    Destination, Detection, ImageRef, Notifier, PhotoLibrary, ProgressSink, ResultOutput,
    ScanEvent, Subscription,
};

struct Entry {
    image: ImageRef,
    bytes: Vec<u8>,
    name: Option<String>,
}

/// In-memory photo library.
///
/// Items are kept newest first. Clones share the same contents, so a test
/// can keep a handle and add items while a watcher holds another.
#[derive(Clone, Default)]
pub struct MockPhotoLibrary {
    entries: Arc<Mutex<Vec<Entry>>>,
    fail_queries: Arc<AtomicBool>,
    latest_calls: Arc<AtomicUsize>,
}

impl MockPhotoLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item that becomes the newest.
    pub fn add_newest(&self, image: ImageRef, bytes: Vec<u8>) {
        self.insert(image, bytes, None);
    }

    /// Adds an item with a known file name that becomes the newest.
    pub fn add_named(&self, image: ImageRef, bytes: Vec<u8>, name: impl Into<String>) {
        self.insert(image, bytes, Some(name.into()));
    }

    fn insert(&self, image: ImageRef, bytes: Vec<u8>, name: Option<String>) {
        self.lock().insert(0, Entry { image, bytes, name });
    }

    /// Removes an item by id.
    pub fn remove(&self, id: &str) {
        self.lock().retain(|e| e.image.id != id);
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true for an empty library.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every query fail (or succeed again).
    pub fn set_query_failure(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of `latest()` calls so far.
    #[must_use]
    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_query(&self) -> anyhow::Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            bail!("library unavailable");
        }
        Ok(())
    }
}

impl PhotoLibrary for MockPhotoLibrary {
    fn latest(&self) -> anyhow::Result<Option<ImageRef>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.check_query()?;
        Ok(self.lock().first().map(|e| e.image.clone()))
    }

    fn albums(&self) -> anyhow::Result<Vec<Album>> {
        self.check_query()?;
        let mut counts: BTreeMap<AlbumId, usize> = BTreeMap::new();
        for entry in self.lock().iter() {
            if let Some(album) = &entry.image.album {
                *counts.entry(album.clone()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(id, image_count)| Album {
                name: id.to_string(),
                id,
                image_count,
            })
            .collect())
    }

    fn images_in(&self, albums: &[AlbumId]) -> anyhow::Result<Vec<ImageRef>> {
        self.check_query()?;
        Ok(self
            .lock()
            .iter()
            .filter(|e| {
                albums.is_empty()
                    || e.image.album.as_ref().is_some_and(|a| albums.contains(a))
            })
            .map(|e| e.image.clone())
            .collect())
    }

    fn open(&self, image: &ImageRef) -> anyhow::Result<Box<dyn Read + Send>> {
        match self.lock().iter().find(|e| e.image.id == image.id) {
            Some(entry) => Ok(Box::new(Cursor::new(entry.bytes.clone()))),
            None => bail!("no such image: {}", image.id),
        }
    }

    fn display_name(&self, image: &ImageRef) -> Option<String> {
        self.lock()
            .iter()
            .find(|e| e.image.id == image.id)
            .and_then(|e| e.name.clone())
    }
}

type Sinks = Arc<Mutex<Vec<(usize, Sender<ChangeEvent>)>>>;

/// Change feed fired by hand from the test.
#[derive(Clone, Default)]
pub struct ManualChangeFeed {
    sinks: Sinks,
    next_id: Arc<AtomicUsize>,
}

impl ManualChangeFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends one change event to every subscriber and returns how many
    /// received it.
    pub fn fire(&self) -> usize {
        let sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        sinks
            .iter()
            .filter(|(_, sink)| sink.send(ChangeEvent::now()).is_ok())
            .count()
    }

    /// Returns true while at least one subscription is active.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ChangeFeed for ManualChangeFeed {
    fn subscribe(&self, sink: Sender<ChangeEvent>) -> anyhow::Result<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sink));

        let sinks = Arc::clone(&self.sinks);
        Ok(Subscription::new(move || {
            sinks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(other, _)| *other != id);
        }))
    }
}

/// Notifier that records every call.
#[derive(Clone, Default)]
pub struct MockNotifier {
    updates: Arc<Mutex<Vec<Vec<Detection>>>>,
    cleared: Arc<AtomicUsize>,
}

impl MockNotifier {
    /// Creates a notifier with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detection lists received, one per call.
    #[must_use]
    pub fn updates(&self) -> Vec<Vec<Detection>> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Title of the most recent notification.
    #[must_use]
    pub fn last_title(&self) -> Option<String> {
        self.updates().last().map(|list| summary_title(list.len()))
    }

    /// Number of `cleared()` calls.
    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl Notifier for MockNotifier {
    fn detections_changed(&self, detections: &[Detection]) {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(detections.to_vec());
    }

    fn cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Progress sink that records events and can cancel a scan mid-way.
#[derive(Default)]
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ScanEvent>>>,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl MockProgressSink {
    /// Creates a sink that only records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that cancels `token` once `after` images are processed.
    #[must_use]
    pub fn cancelling(token: CancellationToken, after: usize) -> Self {
        Self {
            events: Arc::default(),
            cancel_at: Some((after, token)),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ScanEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Positions reported by `Progress` events.
    #[must_use]
    pub fn progress_positions(&self) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { current, .. } => Some(*current),
                _ => None,
            })
            .collect()
    }

    /// `(scanned, total, cancelled)` from the `Finished` event, if any.
    #[must_use]
    pub fn finished(&self) -> Option<(usize, usize, bool)> {
        self.events().iter().find_map(|e| match e {
            ScanEvent::Finished {
                scanned,
                total,
                cancelled,
                ..
            } => Some((*scanned, *total, *cancelled)),
            _ => None,
        })
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ScanEvent) {
        if let (ScanEvent::Progress { current, .. }, Some((after, token))) =
            (&event, &self.cancel_at)
        {
            if current >= after {
                token.cancel();
            }
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

type Files = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// In-memory export destination.
#[derive(Clone, Default)]
pub struct MemoryDestination {
    files: Files,
    fail_create: Arc<Mutex<HashSet<String>>>,
    fail_write: Arc<Mutex<HashSet<String>>>,
}

impl MemoryDestination {
    /// Creates an empty destination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes creating a file with this name fail.
    pub fn fail_create(&self, name: impl Into<String>) {
        self.fail_create
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    /// Makes writing into a file with this name fail after it is created.
    pub fn fail_write(&self, name: impl Into<String>) {
        self.fail_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    /// Names and contents of every file, sorted by name.
    #[must_use]
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contents of one file.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl Destination for MemoryDestination {
    fn create(&self, file_name: &str) -> anyhow::Result<CreatedFile> {
        if self
            .fail_create
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(file_name)
        {
            bail!("cannot create {file_name}");
        }

        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let mut name = file_name.to_string();
        let mut n = 1;
        while files.contains_key(&name) {
            name = format!("{file_name} ({n})");
            n += 1;
        }
        files.insert(name.clone(), Vec::new());

        let failing = self
            .fail_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(file_name);

        Ok(CreatedFile {
            name: name.clone(),
            writer: Box::new(MemoryFile {
                name,
                files: Arc::clone(&self.files),
                failing,
            }),
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemoryFile {
    name: String,
    files: Files,
    failing: bool,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failing {
            return Err(io::Error::other("device full"));
        }
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mock implementation of `ResultOutput` for testing.
#[derive(Default)]
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<Detection>>>,
    flush_count: Arc<AtomicUsize>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured detections.
    #[must_use]
    pub fn results(&self) -> Vec<Detection> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, detection: &Detection) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(detection.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_library_orders_newest_first() {
        let library = MockPhotoLibrary::new();
        library.add_newest(ImageRef::new("1", "mock://1"), vec![1]);
        library.add_newest(ImageRef::new("2", "mock://2"), vec![2]);

        assert_eq!(library.latest().unwrap().unwrap().id, "2");
        let ids: Vec<_> = library
            .images_in(&[])
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn test_library_filters_albums() {
        let library = MockPhotoLibrary::new();
        let camera = AlbumId::new("camera");
        library.add_newest(ImageRef::new("1", "mock://1").in_album(camera.clone()), vec![]);
        library.add_newest(
            ImageRef::new("2", "mock://2").in_album(AlbumId::new("screenshots")),
            vec![],
        );

        let images = library.images_in(&[camera]).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(library.albums().unwrap().len(), 2);
    }

    #[test]
    fn test_library_query_failure() {
        let library = MockPhotoLibrary::new();
        library.set_query_failure(true);
        assert!(library.latest().is_err());
        assert!(library.images_in(&[]).is_err());
        assert_eq!(library.latest_calls(), 1);
    }

    #[test]
    fn test_manual_feed_unsubscribes() {
        let feed = ManualChangeFeed::new();
        let (tx, rx) = mpsc::channel();
        let subscription = feed.subscribe(tx).unwrap();

        assert_eq!(feed.fire(), 1);
        assert!(rx.try_recv().is_ok());

        drop(subscription);
        assert!(!feed.is_subscribed());
        assert_eq!(feed.fire(), 0);
    }

    #[test]
    fn test_memory_destination_never_overwrites() {
        let dest = MemoryDestination::new();
        let mut a = dest.create("a.jpg").unwrap();
        a.writer.write_all(b"first").unwrap();
        let b = dest.create("a.jpg").unwrap();

        assert_eq!(b.name, "a.jpg (1)");
        assert_eq!(dest.file("a.jpg").unwrap(), b"first");
    }

    #[test]
    fn test_progress_sink_cancels() {
        let token = CancellationToken::new();
        let sink = MockProgressSink::cancelling(token.clone(), 2);
        sink.on_event(ScanEvent::Progress {
            current: 1,
            total: 3,
            image: ImageRef::new("1", "mock://1"),
            detected: false,
        });
        assert!(!token.is_cancelled());
        sink.on_event(ScanEvent::Progress {
            current: 2,
            total: 3,
            image: ImageRef::new("2", "mock://2"),
            detected: false,
        });
        assert!(token.is_cancelled());
    }
}
