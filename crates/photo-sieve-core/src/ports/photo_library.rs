//! Photo library port for querying and reading images.

use std::io::Read;

use crate::domain::{Album, AlbumId, ImageRef};

/// Port for a photo library that groups images into albums.
pub trait PhotoLibrary: Send + Sync {
    /// Returns the most recently added image, or `None` for an empty library.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be queried.
    fn latest(&self) -> anyhow::Result<Option<ImageRef>>;

    /// Lists the albums of the library.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be enumerated.
    fn albums(&self) -> anyhow::Result<Vec<Album>>;

    /// Lists the images of the given albums, most recent first.
    ///
    /// An empty `albums` slice selects the whole library.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be enumerated.
    fn images_in(&self, albums: &[AlbumId]) -> anyhow::Result<Vec<ImageRef>>;

    /// Opens an image for reading its encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be opened.
    fn open(&self, image: &ImageRef) -> anyhow::Result<Box<dyn Read + Send>>;

    /// Returns the original file name of an image, if the library knows it.
    fn display_name(&self, image: &ImageRef) -> Option<String>;
}
