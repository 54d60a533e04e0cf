//! Test support utilities for photo-sieve.
//!
//! Provides mocks of every core port, stub scorers, synthetic image builders
//! and a writer for tiny model weight files.
//!
//! # Example
//!
//! ```
//! use photo_sieve_core::ImageRef;
//! use photo_sieve_test_support::{MockPhotoLibrary, SyntheticImageBuilder};
//!
//! let library = MockPhotoLibrary::new();
//! let png = SyntheticImageBuilder::png_bytes(&SyntheticImageBuilder::solid(16, 16, [255, 0, 0]));
//! library.add_newest(ImageRef::new("1", "mock://1.png"), png);
//! assert_eq!(library.len(), 1);
//! ```

mod builders;
mod mocks;
mod scorers;

pub use builders::SyntheticImageBuilder;
pub use mocks::{
    ManualChangeFeed, MemoryDestination, MockNotifier, MockPhotoLibrary, MockProgressSink,
    MockResultOutput,
};
pub use scorers::{
    write_constant_model, write_zero_model, GatedScorer, PixelScorer, SequenceScorer,
};
