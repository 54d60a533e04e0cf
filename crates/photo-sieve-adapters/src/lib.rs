//! Photo Sieve Adapters - External adapters for photo-sieve.
//!
//! This crate provides adapters for:
//! - Filesystem photo library and polling change feed
//! - Filesystem export destination
//! - Persisted preferences
//! - Data directory and model location

pub mod destination;
pub mod feed;
pub mod fs;
pub mod models;
pub mod prefs;

pub use destination::FsDestination;
pub use feed::{PollingChangeFeed, DEFAULT_POLL_INTERVAL};
pub use fs::FsPhotoLibrary;
pub use models::{data_dir, inspect_model, model_path, models_dir, ModelStatus};
pub use prefs::Preferences;
