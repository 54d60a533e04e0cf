//! Dest command - persisted destination folder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use photo_sieve_adapters::{FsDestination, Preferences};
use tracing::info;

/// Arguments for the dest command
#[derive(Args)]
pub struct DestArgs {
    #[command(subcommand)]
    pub command: DestCommand,
}

/// Dest subcommands
#[derive(Subcommand)]
pub enum DestCommand {
    /// Choose the destination folder
    Set {
        /// Existing directory to copy images into
        dir: PathBuf,
    },
    /// Print the destination folder
    Show,
}

/// Run the dest command.
pub fn run(args: &DestArgs) -> Result<()> {
    let prefs = Preferences::open_default();
    match &args.command {
        DestCommand::Set { dir } => set(&prefs, dir),
        DestCommand::Show => show(&prefs),
    }
}

fn set(prefs: &Preferences, dir: &Path) -> Result<()> {
    // Validate before persisting.
    let destination = FsDestination::open(dir)?;
    let folder = destination
        .dir()
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;
    prefs.set_destination_folder(&folder)?;
    info!("Saved destination folder to {}", prefs.path().display());
    println!("Destination folder: {}", folder.display());
    Ok(())
}

fn show(prefs: &Preferences) -> Result<()> {
    match prefs.destination_folder()? {
        Some(folder) => println!("{}", folder.display()),
        None => println!("No destination folder set. Use `photo-sieve dest set DIR`."),
    }
    Ok(())
}

/// Resolves the export destination: `--dest` flag, then the saved folder.
///
/// # Errors
///
/// Returns an error if neither is set, or the folder is not an existing
/// directory.
pub fn resolve_destination(flag: Option<&PathBuf>) -> Result<FsDestination> {
    let folder = match flag {
        Some(dir) => dir.clone(),
        None => Preferences::open_default()
            .destination_folder()?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Destination folder not found! Pass --dest or run `photo-sieve dest set DIR`"
                )
            })?,
    };
    FsDestination::open(folder)
}
