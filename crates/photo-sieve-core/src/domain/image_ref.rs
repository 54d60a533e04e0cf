//! Image and album references.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an album (a source-folder grouping of library items).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub String);

impl AlbumId {
    /// Creates an album identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An album in the photo library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Album identifier.
    pub id: AlbumId,
    /// Human-readable name.
    pub name: String,
    /// Number of images in the album.
    pub image_count: usize,
}

/// Opaque locator of a photo-library item.
///
/// Captured once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// Stable identifier assigned by the library.
    pub id: String,
    /// Readable location of the image.
    pub uri: String,
    /// Album the image belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<AlbumId>,
}

impl ImageRef {
    /// Creates an image reference with no album.
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            album: None,
        }
    }

    /// Sets the album of this reference.
    #[must_use]
    pub fn in_album(mut self, album: AlbumId) -> Self {
        self.album = Some(album);
        self
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
