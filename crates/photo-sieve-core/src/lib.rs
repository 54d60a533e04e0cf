//! Photo Sieve Core - Domain logic and classification pipeline
//!
//! This crate contains the domain types, the ports that connect the core to a
//! photo library, change feed, notifier and export destination, and the
//! pipeline built on top of them: preprocessing, model scoring, the change
//! watcher, deep scans and export.

pub mod cancel;
pub mod domain;
pub mod error;
pub mod export;
pub mod inference;
pub mod ports;
pub mod preprocess;
pub mod scan;
pub mod scoring;
pub mod service;
pub mod watch;

pub use cancel::CancellationToken;
pub use domain::{
    summary_title, Album, AlbumId, DecisionRule, Detection, DetectionList, ImageRef, Polarity,
    Score,
};
pub use error::{FailureKind, SieveError};
pub use export::{export, ExportReport, ExportedItem};
pub use ports::{
    ChangeEvent, ChangeFeed, CreatedFile, Destination, Notifier, PhotoLibrary, ProgressSink,
    ResultOutput, ScanEvent, Subscription,
};
pub use preprocess::{ChannelOrder, Preprocessor};
pub use scan::{run_scan, spawn_scan, ScanHandle, ScanReport};
pub use scoring::{Detector, ModelScorer, Scorer, Verdict};
pub use service::Sieve;
pub use watch::{ChangeTracker, WatchHandle, WatchState, Watcher};
