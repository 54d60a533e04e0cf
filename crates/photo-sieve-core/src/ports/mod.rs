//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod change_feed;
mod destination;
mod notifier;
mod photo_library;
mod progress;
mod result_output;

pub use change_feed::{ChangeEvent, ChangeFeed, Subscription};
pub use destination::{CreatedFile, Destination};
pub use notifier::Notifier;
pub use photo_library::PhotoLibrary;
pub use progress::{ProgressSink, ScanEvent};
pub use result_output::ResultOutput;
