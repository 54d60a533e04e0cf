//! Filesystem export destination.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use photo_sieve_core::{CreatedFile, Destination};
use tracing::debug;

/// Upper bound on `name (n).ext` attempts for one file.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Destination folder on the local filesystem.
///
/// Files are created with `create_new`, so an existing file is never
/// overwritten. A taken name becomes `stem (1).ext`, `stem (2).ext`, ...
#[derive(Debug, Clone)]
pub struct FsDestination {
    dir: PathBuf,
}

impl FsDestination {
    /// Opens a destination folder.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or is not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            anyhow::bail!("Destination folder not found: {}", dir.display());
        }
        if !dir.is_dir() {
            anyhow::bail!("Target folder is inaccessible: {}", dir.display());
        }
        Ok(Self { dir })
    }

    /// Folder files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create_unique(&self, file_name: &str) -> Result<(String, File)> {
        let (stem, ext) = split_name(file_name);
        for n in 0..MAX_NAME_ATTEMPTS {
            let candidate = if n == 0 {
                file_name.to_string()
            } else {
                format!("{stem} ({n}){ext}")
            };
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&candidate))
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create {}", self.dir.join(&candidate).display())
                    })
                }
            }
        }
        anyhow::bail!("No free file name for {file_name} in {}", self.dir.display())
    }
}

impl Destination for FsDestination {
    fn create(&self, file_name: &str) -> Result<CreatedFile> {
        let file_name = sanitize(file_name);
        let (name, file) = self.create_unique(&file_name)?;
        debug!("Created {}", self.dir.join(&name).display());
        Ok(CreatedFile {
            name,
            writer: Box::new(BufWriter::new(file)),
        })
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Splits `photo.jpg` into `("photo", ".jpg")`. Leading dots are part of the stem.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Keeps only the final path component so a name cannot escape the folder.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        "image.jpg".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("a\\b.jpg"), "b.jpg");
        assert_eq!(sanitize(".."), "image.jpg");
        assert_eq!(sanitize("IMG_1.jpg"), "IMG_1.jpg");
    }
}
