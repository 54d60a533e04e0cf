//! Persisted user preferences.
//!
//! A single TOML file (`prefs.toml`) in the data directory. Only the
//! destination folder is stored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::data_dir;

/// File name of the preferences file.
pub const PREFS_FILE: &str = "prefs.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    destination_folder: Option<PathBuf>,
}

/// Key-value preference store backed by a TOML file.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Opens the preferences file in the data directory.
    #[must_use]
    pub fn open_default() -> Self {
        Self::at(data_dir().join(PREFS_FILE))
    }

    /// Opens a preferences file at `path`. The file need not exist.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the preferences file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved destination folder, if one was chosen.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn destination_folder(&self) -> Result<Option<PathBuf>> {
        Ok(self.load()?.destination_folder)
    }

    /// Saves the destination folder, replacing any previous choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn set_destination_folder(&self, folder: &Path) -> Result<()> {
        let mut prefs = self.load()?;
        prefs.destination_folder = Some(folder.to_path_buf());
        self.save(&prefs)?;
        info!("Destination folder set to {}", folder.display());
        Ok(())
    }

    fn load(&self) -> Result<PrefsFile> {
        if !self.path.exists() {
            debug!("No preferences at {}", self.path.display());
            return Ok(PrefsFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, prefs: &PrefsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let payload = toml::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        fs::write(&self.path, payload)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
