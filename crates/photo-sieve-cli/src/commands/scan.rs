//! Scan command - classify every image of selected albums.
//!
//! A `stop` line on stdin ends the scan early; the detections found up to
//! that point are still written.

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use photo_sieve_adapters::{FsPhotoLibrary, PollingChangeFeed, DEFAULT_POLL_INTERVAL};
use photo_sieve_core::{AlbumId, CancellationToken, Destination, ResultOutput, ScanReport, Sieve};
use tracing::{debug, info};

use super::classifier::ClassifierArgs;
use super::dest::resolve_destination;
use super::export::report_line;
use super::{library_root, ExitCode};
use crate::config::AppConfig;
use crate::output::{ConsoleNotifier, JsonOutput, ProgressBar};

/// Output format for detections.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Arguments for the scan command
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScanArgs {
    /// Photo library root (overrides config)
    #[arg(long, value_name = "DIR")]
    pub library: Option<PathBuf>,

    /// Album to scan (repeatable; default: whole library)
    #[arg(long = "album", value_name = "ID")]
    pub albums: Vec<String>,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Copy detected images into the destination folder
    #[arg(long)]
    pub export: bool,

    /// Destination folder for --export (overrides the saved one)
    #[arg(long, value_name = "DIR", requires = "export")]
    pub dest: Option<PathBuf>,
}

impl ScanArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.classifier = self.classifier.with_config(&config.model);

        if self.format.is_none() {
            self.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !self.pretty {
            self.pretty = config.output.pretty.unwrap_or(false);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }
        self
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Run the scan command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &ScanArgs, config: &AppConfig) -> Result<ExitCode> {
    let root = library_root(args.library.as_ref(), config)?;
    // Fail before scanning if the export target is unusable.
    let destination = if args.export {
        Some(resolve_destination(args.dest.as_ref())?)
    } else {
        None
    };
    let detector = args.classifier.build_detector()?;

    let library = Arc::new(FsPhotoLibrary::new(&root));
    let feed = Arc::new(PollingChangeFeed::new(&root, DEFAULT_POLL_INTERVAL));
    let sieve = Sieve::new(library, feed, detector, Arc::new(ConsoleNotifier::stderr()));

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = Arc::new(ProgressBar::new(args.quiet, show_progress));

    let albums: Vec<AlbumId> = args.albums.iter().map(AlbumId::new).collect();
    info!("Scanning {} in {} album(s)", root.display(), albums.len());
    let handle = sieve.start_scan(albums, progress)?;
    if !args.quiet && io::stdin().is_terminal() {
        eprintln!("Type `stop` and press Enter to end the scan early");
    }
    cancel_on_stop(handle.token().clone())?;
    let report = handle.join()?;

    write_detections(&report, args)?;
    if !args.quiet {
        print_summary(&report);
    }

    if let Some(destination) = destination {
        let exported = sieve.export(&report.detected_images(), &destination);
        println!(
            "{}",
            report_line(
                exported.success_count(),
                exported.requested,
                &destination.describe()
            )
        );
    }

    if let Some(error) = report.query_error {
        return Err(anyhow::Error::new(error)
            .context(format!("Failed to read library {}", root.display())));
    }

    Ok(if report.detections.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::Detected
    })
}

/// Cancels `token` once a `stop` line arrives on stdin.
///
/// The reader thread is detached; it ends with the process if no line comes.
fn cancel_on_stop(token: CancellationToken) -> Result<()> {
    thread::Builder::new()
        .name("scan-stop".into())
        .spawn(move || {
            if stop_requested(io::stdin().lock()) {
                info!("Stop requested, finishing scan");
                token.cancel();
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(())
}

/// Reads lines until `stop` (true) or end of input (false).
fn stop_requested(input: impl BufRead) -> bool {
    for line in input.lines() {
        let Ok(line) = line else {
            return false;
        };
        match line.trim() {
            "stop" | "cancel" => return true,
            "" => {}
            other => debug!("Ignoring input during scan: {other}"),
        }
    }
    false
}

fn write_detections(report: &ScanReport, args: &ScanArgs) -> Result<()> {
    if report.detections.is_empty() {
        if !args.quiet {
            eprintln!("No candidates found");
        }
        return Ok(());
    }

    let output = JsonOutput::stdout();
    match args.format() {
        OutputFormat::Jsonl => {
            for detection in &report.detections {
                output.write(detection)?;
            }
        }
        OutputFormat::Json => output.write_array(&report.detections, args.pretty)?,
    }
    output.flush()
}

fn print_summary(report: &ScanReport) {
    eprintln!(
        "Scanned {} of {} image(s): {} detected, {} failed{}",
        report.scanned,
        report.total,
        report.detections.len(),
        report.failures.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}
