//! Data directory and bundled model location.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PHOTO_SIEVE_DATA_DIR";

/// File name of the bundled classifier weights.
pub const MODEL_FILE: &str = "sieve.safetensors";

/// Returns the data directory.
///
/// Uses `$PHOTO_SIEVE_DATA_DIR` when set, otherwise
/// `XDG_DATA_HOME/photo-sieve` or `~/.local/share/photo-sieve`.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photo-sieve")
}

/// Returns the models directory path.
#[must_use]
pub fn models_dir() -> PathBuf {
    data_dir().join("models")
}

/// Returns the default path of the classifier weights.
#[must_use]
pub fn model_path() -> PathBuf {
    models_dir().join(MODEL_FILE)
}

/// Facts about a weights file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    /// Location of the file.
    pub path: PathBuf,
    /// Size in bytes, if the file exists.
    pub size: Option<u64>,
    /// Hex SHA-256 of the contents, if the file exists.
    pub sha256: Option<String>,
}

impl ModelStatus {
    /// Returns true if the file exists.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.size.is_some()
    }
}

/// Inspects the weights file at `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn inspect_model(path: &Path) -> Result<ModelStatus> {
    if !path.is_file() {
        debug!("No model at {}", path.display());
        return Ok(ModelStatus {
            path: path.to_path_buf(),
            size: None,
            sha256: None,
        });
    }

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok(ModelStatus {
        path: path.to_path_buf(),
        size: Some(size),
        sha256: Some(sha256_file(path)?),
    })
}

/// Computes the hex SHA-256 of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_file_name() {
        assert!(model_path().ends_with("models/sieve.safetensors"));
    }

    #[test]
    fn test_sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_inspect_missing_model() {
        let status = inspect_model(Path::new("/nonexistent/sieve.safetensors")).unwrap();
        assert!(!status.is_installed());
        assert!(status.sha256.is_none());
    }

    #[test]
    fn test_inspect_present_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);
        std::fs::write(&path, [0u8; 10]).unwrap();

        let status = inspect_model(&path).unwrap();
        assert_eq!(status.size, Some(10));
        assert_eq!(status.sha256.as_ref().map(String::len), Some(64));
    }
}
