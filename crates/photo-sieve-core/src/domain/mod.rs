//! Core domain types for photo-sieve.

mod decision;
mod detection;
mod image_ref;

pub use decision::{DecisionRule, Polarity};
pub use detection::{summary_title, Detection, DetectionList, Score};
pub use image_ref::{Album, AlbumId, ImageRef};
