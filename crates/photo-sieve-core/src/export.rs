//! Copying selected images into the destination folder.
//!
//! Each image is streamed into a newly created destination file. A failed copy
//! counts as a non-success and is not rolled back, so a partially written file
//! can remain.

use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::domain::ImageRef;
use crate::error::SieveError;
use crate::ports::{Destination, PhotoLibrary};

/// An image copied to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedItem {
    /// The source image.
    pub source: ImageRef,
    /// File name in the destination.
    pub file_name: String,
    /// Bytes written.
    pub bytes: u64,
}

/// Outcome of an export.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Number of images selected.
    pub requested: usize,
    /// Successful copies.
    pub copied: Vec<ExportedItem>,
    /// Failed copies.
    pub failed: Vec<(ImageRef, SieveError)>,
}

impl ExportReport {
    /// Number of images copied.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.copied.len()
    }
}

/// Copies every selected image into `destination`.
pub fn export(
    library: &dyn PhotoLibrary,
    selected: &[ImageRef],
    destination: &dyn Destination,
) -> ExportReport {
    let mut report = ExportReport {
        requested: selected.len(),
        ..ExportReport::default()
    };

    for image in selected {
        match copy_one(library, image, destination) {
            Ok(item) => {
                debug!("Copied {} -> {}", image.uri, item.file_name);
                report.copied.push(item);
            }
            Err(e) => {
                warn!("{e}: {}", e.causes());
                report.failed.push((image.clone(), e));
            }
        }
    }

    info!(
        "Copied {} of {} image(s) to {}",
        report.success_count(),
        report.requested,
        destination.describe()
    );
    report
}

fn copy_one(
    library: &dyn PhotoLibrary,
    image: &ImageRef,
    destination: &dyn Destination,
) -> Result<ExportedItem, SieveError> {
    let file_name = library
        .display_name(image)
        .unwrap_or_else(generated_file_name);

    let mut reader = library
        .open(image)
        .map_err(|e| SieveError::export(&image.uri, e))?;
    let mut created = destination
        .create(&file_name)
        .map_err(|e| SieveError::export(&image.uri, e))?;

    let bytes = io::copy(&mut reader, &mut created.writer)
        .and_then(|n| created.writer.flush().map(|()| n))
        .map_err(|e| SieveError::export(&image.uri, e))?;

    Ok(ExportedItem {
        source: image.clone(),
        file_name: created.name,
        bytes,
    })
}

/// Name used when the library does not know the original file name.
fn generated_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    format!("image_{millis}.jpg")
}
