//! Output formatting for CLI.

mod json;
mod notifier;
mod progress;

pub use json::JsonOutput;
pub use notifier::ConsoleNotifier;
pub use progress::ProgressBar;
