//! Models command - inspect the classifier weights.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use photo_sieve_adapters::{inspect_model, model_path, models_dir};
use photo_sieve_core::{ModelScorer, Preprocessor};

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Print model directory path
    Path,
    /// Show location, size and fingerprint of the weights
    Info {
        /// Weights file to inspect (default: bundled location)
        #[arg(long, value_name = "FILE")]
        model: Option<PathBuf>,
    },
}

/// Run the models command.
pub fn run(args: &ModelsArgs) -> Result<()> {
    match &args.command {
        ModelsCommand::Path => {
            print_path();
            Ok(())
        }
        ModelsCommand::Info { model } => print_info(&model.clone().unwrap_or_else(model_path)),
    }
}

fn print_path() {
    println!("{}", models_dir().display());
}

fn print_info(path: &Path) -> Result<()> {
    let status = inspect_model(path)?;

    println!("Model: {}", status.path.display());
    let (Some(size), Some(sha256)) = (status.size, status.sha256.as_deref()) else {
        println!("  ✗ not installed");
        return Ok(());
    };
    println!("  ✓ installed");
    println!("  size:   {size} bytes");
    println!("  sha256: {sha256}");

    match ModelScorer::new(path, Preprocessor::default()).preload() {
        Ok(()) => println!("  loads:  yes"),
        Err(e) => println!("  loads:  no ({e:#})"),
    }
    Ok(())
}
