//! Scores, detections and the shared detection list.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ImageRef;

/// Classifier output in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f32);

impl Score {
    /// Wraps a raw model output, rejecting NaN and values outside `[0, 1]`.
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// An image whose score crossed the decision threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The detected image.
    pub image: ImageRef,
    /// Score that triggered the detection.
    pub score: Score,
    /// Time of detection (RFC 3339, UTC).
    pub timestamp: String,
}

impl Detection {
    /// Creates a detection stamped with the current time.
    #[must_use]
    pub fn now(image: ImageRef, score: Score) -> Self {
        Self {
            image,
            score,
            timestamp: iso_timestamp(),
        }
    }
}

/// Insertion-ordered list of detections shared between the scoring worker
/// and the interactive surface.
///
/// Clones share the same list. There is no deduplication and nothing is
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct DetectionList {
    inner: Arc<Mutex<Vec<Detection>>>,
}

impl DetectionList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a detection and returns a snapshot of the whole list.
    pub fn push(&self, detection: Detection) -> Vec<Detection> {
        let mut list = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        list.push(detection);
        debug!("Detection list now holds {} item(s)", list.len());
        list.clone()
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Detection> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes every detection.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of detections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Title of the aggregate notification for `count` detections.
#[must_use]
pub fn summary_title(count: usize) -> String {
    if count == 1 {
        "1 new image observed".to_string()
    } else {
        format!("{count} new images observed")
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
