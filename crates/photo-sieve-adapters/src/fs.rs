//! Filesystem photo library.
//!
//! A library is a root directory. Every folder holding images is an album,
//! identified by its path relative to the root (`.` for the root itself).
//! Images are ordered by modification time, newest first.
//!
//! Modification time stands in for "date added". A file copied in with its
//! original time preserved (`cp -p`, most camera importers) sorts among the
//! old images, so [`PhotoLibrary::latest`] does not return it and the
//! watcher never scores it. A deep scan still covers it.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use photo_sieve_core::{Album, AlbumId, ImageRef, PhotoLibrary};
use tracing::{debug, warn};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Album id of images stored directly in the library root.
pub const ROOT_ALBUM: &str = ".";

/// One image file found under the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LibraryFile {
    pub path: PathBuf,
    pub relative: String,
    pub album: String,
    pub modified: SystemTime,
    pub len: u64,
}

/// Photo library backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FsPhotoLibrary {
    root: PathBuf,
}

impl FsPhotoLibrary {
    /// Creates a library rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reference to a file given by path, relative to the root or absolute.
    ///
    /// Paths inside the root get the same id as [`PhotoLibrary::images_in`]
    /// would assign; other paths keep their full form as id.
    #[must_use]
    pub fn image_at(&self, path: &Path) -> ImageRef {
        let full = self.root.join(path);
        let id = full
            .strip_prefix(&self.root)
            .map_or_else(|_| full.to_string_lossy().into_owned(), to_slash);
        ImageRef::new(id, full.to_string_lossy())
    }

    fn album_name(&self, album: &str) -> String {
        if album == ROOT_ALBUM {
            self.root
                .file_name()
                .map_or_else(|| ROOT_ALBUM.to_string(), |n| n.to_string_lossy().into_owned())
        } else {
            album.rsplit('/').next().unwrap_or(album).to_string()
        }
    }

    fn resolve(&self, image: &ImageRef) -> PathBuf {
        self.root.join(&image.id)
    }
}

impl PhotoLibrary for FsPhotoLibrary {
    fn latest(&self) -> Result<Option<ImageRef>> {
        let files = scan_library(&self.root)?;
        Ok(files.first().map(image_ref))
    }

    fn albums(&self) -> Result<Vec<Album>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for file in scan_library(&self.root)? {
            *counts.entry(file.album).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(id, image_count)| Album {
                name: self.album_name(&id),
                id: AlbumId::new(id),
                image_count,
            })
            .collect())
    }

    fn images_in(&self, albums: &[AlbumId]) -> Result<Vec<ImageRef>> {
        let files = scan_library(&self.root)?;
        Ok(files
            .iter()
            .filter(|f| albums.is_empty() || albums.iter().any(|a| a.as_str() == f.album))
            .map(image_ref)
            .collect())
    }

    fn open(&self, image: &ImageRef) -> Result<Box<dyn Read + Send>> {
        let path = self.resolve(image);
        let file =
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn display_name(&self, image: &ImageRef) -> Option<String> {
        Path::new(&image.id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

fn image_ref(file: &LibraryFile) -> ImageRef {
    ImageRef::new(&file.relative, file.path.to_string_lossy()).in_album(AlbumId::new(&file.album))
}

/// Lists every image under `root`, newest first.
///
/// Ties on modification time are broken by relative path so the order is
/// stable between calls.
pub(crate) fn scan_library(root: &Path) -> Result<Vec<LibraryFile>> {
    if !root.is_dir() {
        anyhow::bail!("Library root is not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    collect_from_dir(root, root, &mut files);
    files.sort_by(|a, b| {
        Reverse(a.modified)
            .cmp(&Reverse(b.modified))
            .then_with(|| a.relative.cmp(&b.relative))
    });
    debug!("Found {} image(s) under {}", files.len(), root.display());
    Ok(files)
}

fn collect_from_dir(root: &Path, dir: &Path, files: &mut Vec<LibraryFile>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            collect_from_dir(root, &path, files);
        } else if path.is_file() && is_supported_image(&path) {
            match library_file(root, path) {
                Ok(file) => files.push(file),
                Err(e) => warn!("Skipping file: {e:#}"),
            }
        }
    }
}

fn library_file(root: &Path, path: PathBuf) -> Result<LibraryFile> {
    let meta = std::fs::metadata(&path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let relative_path = path.strip_prefix(root).unwrap_or(&path);
    let relative = to_slash(relative_path);
    let album = relative_path
        .parent()
        .map(to_slash)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ROOT_ALBUM.to_string());

    Ok(LibraryFile {
        path,
        relative,
        album,
        modified,
        len: meta.len(),
    })
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.webp")));
        assert!(!is_supported_image(Path::new("test.cr2")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn test_hidden_entries() {
        assert!(is_hidden(Path::new("/lib/.thumbnails")));
        assert!(!is_hidden(Path::new("/lib/Camera")));
    }

    #[test]
    fn test_to_slash_joins_components() {
        assert_eq!(to_slash(Path::new("DCIM").join("Camera").as_path()), "DCIM/Camera");
    }

    #[test]
    fn test_image_at_inside_and_outside_root() {
        let library = FsPhotoLibrary::new("/lib");
        assert_eq!(library.image_at(Path::new("Camera/a.jpg")).id, "Camera/a.jpg");
        assert_eq!(library.image_at(Path::new("/lib/Camera/a.jpg")).id, "Camera/a.jpg");

        let outside = library.image_at(Path::new("/elsewhere/b.jpg"));
        assert_eq!(outside.id, "/elsewhere/b.jpg");
        assert_eq!(library.resolve(&outside), PathBuf::from("/elsewhere/b.jpg"));
        assert_eq!(library.display_name(&outside).as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(scan_library(Path::new("/nonexistent/photo-sieve-library")).is_err());
    }
}
