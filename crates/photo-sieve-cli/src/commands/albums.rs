//! Albums command - list the albums of a library.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use photo_sieve_adapters::FsPhotoLibrary;
use photo_sieve_core::PhotoLibrary;

use super::library_root;
use crate::config::AppConfig;

/// Arguments for the albums command
#[derive(Args)]
pub struct AlbumsArgs {
    /// Photo library root (overrides config)
    #[arg(long, value_name = "DIR")]
    pub library: Option<PathBuf>,
}

/// Run the albums command.
pub fn run(args: &AlbumsArgs, config: &AppConfig) -> Result<()> {
    let root = library_root(args.library.as_ref(), config)?;
    let library = FsPhotoLibrary::new(&root);
    let albums = library.albums()?;

    if albums.is_empty() {
        println!("No albums in {}", root.display());
        return Ok(());
    }

    for album in &albums {
        println!("{}\t{}\t{}", album.id, album.name, album.image_count);
    }
    Ok(())
}
