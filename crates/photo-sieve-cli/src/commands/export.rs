//! Export command - copy image files into the destination folder.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use photo_sieve_adapters::FsPhotoLibrary;
use photo_sieve_core::{export, Destination, ImageRef};

use super::dest::resolve_destination;
use super::ExitCode;

/// Arguments for the export command
#[derive(Args)]
pub struct ExportArgs {
    /// Image files to copy
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Destination folder (overrides the saved one)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

/// Run the export command.
pub fn run(args: &ExportArgs) -> Result<ExitCode> {
    let destination = resolve_destination(args.dest.as_ref())?;
    let library = FsPhotoLibrary::new(std::env::current_dir()?);
    let selected: Vec<ImageRef> = args.images.iter().map(|p| library.image_at(p)).collect();

    let report = export(&library, &selected, &destination);
    println!(
        "{}",
        report_line(report.success_count(), report.requested, &destination.describe())
    );

    Ok(if report.failed.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::Error
    })
}

/// Export summary line.
pub fn report_line(copied: usize, requested: usize, destination: &str) -> String {
    format!("Copied {copied} of {requested} images to {destination}")
}
