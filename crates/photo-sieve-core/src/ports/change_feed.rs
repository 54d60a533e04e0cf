//! Change feed port for library change notifications.

use std::fmt;
use std::sync::mpsc::Sender;
use std::time::SystemTime;

/// Notification that the library changed.
///
/// Carries no payload beyond the time it was observed; consumers re-query
/// the library to find out what changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// When the change was observed.
    pub observed_at: SystemTime,
}

impl ChangeEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            observed_at: SystemTime::now(),
        }
    }
}

/// Port for subscribing to library changes.
///
/// Events are delivered as discrete messages on the given queue so the
/// consumer never handles two changes at once.
pub trait ChangeFeed: Send + Sync {
    /// Starts delivering change events to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    fn subscribe(&self, sink: Sender<ChangeEvent>) -> anyhow::Result<Subscription>;
}

/// Token returned by [`ChangeFeed::subscribe`].
///
/// Dropping the token unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when unsubscribed.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops event delivery.
    pub fn unsubscribe(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
