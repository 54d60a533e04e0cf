//! Notifier port for surfacing detections to the user.

use crate::domain::Detection;

/// Port for the aggregate "new images observed" notification.
pub trait Notifier: Send + Sync {
    /// Called after a detection is appended, with the full current list.
    fn detections_changed(&self, detections: &[Detection]);

    /// Called when the user dismisses the notification or clears the list.
    fn cleared(&self);
}
