//! CLI command definitions and handlers.

pub mod albums;
pub mod classifier;
pub mod dest;
pub mod export;
pub mod models;
pub mod scan;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Photo Sieve - Watch a photo library and flag images with an on-device classifier
#[derive(Parser)]
#[command(name = "photo-sieve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// List the albums of a library
    Albums(albums::AlbumsArgs),
    /// Classify every image of selected albums
    Scan(scan::ScanArgs),
    /// Watch a library and classify new images as they arrive
    Watch(watch::WatchArgs),
    /// Copy images into the destination folder
    Export(export::ExportArgs),
    /// Show or choose the destination folder
    Dest(dest::DestArgs),
    /// Inspect the classifier weights
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Finished, nothing detected.
    Success = 0,
    /// Finished with at least one detection.
    Detected = 1,
    /// Failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Resolves the library root: CLI flag, then config.
fn library_root(flag: Option<&PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    let root = flag
        .cloned()
        .or_else(|| config.general.library.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No library specified. Pass --library or set general.library")
        })?;
    if !root.is_dir() {
        anyhow::bail!("Library not found: {}", root.display());
    }
    Ok(root)
}
