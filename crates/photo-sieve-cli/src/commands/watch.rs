//! Watch command - classify new images as they arrive.
//!
//! The watcher runs in the background while stdin is read for commands:
//! `list`, `clear`, `export [N...]`, `status` and `quit`. End of input also
//! quits. `list` numbers the detections from 1; `export` takes those numbers
//! to copy a selection, or copies everything when given none.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use photo_sieve_adapters::{FsPhotoLibrary, PollingChangeFeed, DEFAULT_POLL_INTERVAL};
use photo_sieve_core::{Destination, Sieve};
use tracing::info;

use super::classifier::ClassifierArgs;
use super::dest::resolve_destination;
use super::export::report_line;
use super::{library_root, ExitCode};
use crate::config::AppConfig;
use crate::output::ConsoleNotifier;

/// Arguments for the watch command
#[derive(Args, Clone)]
pub struct WatchArgs {
    /// Photo library root (overrides config)
    #[arg(long, value_name = "DIR")]
    pub library: Option<PathBuf>,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    /// Library poll interval in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Destination folder for `export` (overrides the saved one)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

impl WatchArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.classifier = self.classifier.with_config(&config.model);
        self.poll_interval_ms = self
            .poll_interval_ms
            .or(config.watch.poll_interval_ms.filter(|ms| *ms > 0));
        self
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis)
    }
}

/// Run the watch command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &WatchArgs, config: &AppConfig) -> Result<ExitCode> {
    let root = library_root(args.library.as_ref(), config)?;
    let detector = args.classifier.build_detector()?;

    let library = Arc::new(FsPhotoLibrary::new(&root));
    let feed = Arc::new(PollingChangeFeed::new(&root, args.poll_interval()));
    let mut sieve = Sieve::new(library, feed, detector, Arc::new(ConsoleNotifier::stderr()));

    sieve.start_watch()?;
    info!("Watching {}", root.display());
    eprintln!(
        "Watching {} (commands: list, clear, export [N...], status, quit)",
        root.display()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&sieve, stdin.lock(), &mut stdout.lock(), args.dest.as_ref())?;

    sieve.stop_watch();
    Ok(ExitCode::Success)
}

/// Reads commands from `input` until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails. Failed
/// commands are reported on `out` and do not end the session.
pub fn run_session(
    sieve: &Sieve,
    input: impl BufRead,
    out: &mut impl Write,
    dest: Option<&PathBuf>,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        match command {
            "" => {}
            "list" => list(sieve, out)?,
            "clear" => {
                sieve.clear_detections();
                writeln!(out, "Cleared")?;
            }
            "export" => {
                let picks: Vec<&str> = words.collect();
                if let Err(e) = export(sieve, &picks, out, dest) {
                    writeln!(out, "error: {e:#}")?;
                }
            }
            "status" => writeln!(
                out,
                "{:?}, {} detected",
                sieve.watch_state(),
                sieve.detections().len()
            )?,
            "quit" | "exit" => break,
            other => writeln!(out, "Unknown command: {other}")?,
        }
        out.flush()?;
    }
    Ok(())
}

fn list(sieve: &Sieve, out: &mut impl Write) -> Result<()> {
    let detections = sieve.detections();
    if detections.is_empty() {
        writeln!(out, "No candidates found")?;
        return Ok(());
    }
    for (number, d) in detections.iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t{:.3}\t{}",
            number + 1,
            d.image,
            d.score.value(),
            d.timestamp
        )?;
    }
    Ok(())
}

/// Picks detections by their `list` numbers; no numbers picks all of them.
///
/// Numbers may repeat or come in any order; the selection keeps list order.
fn select<T: Clone>(items: &[T], picks: &[&str]) -> Result<Vec<T>> {
    if picks.is_empty() {
        return Ok(items.to_vec());
    }

    let mut chosen = vec![false; items.len()];
    for pick in picks {
        let number: usize = pick
            .parse()
            .map_err(|_| anyhow::anyhow!("'{pick}' is not a candidate number"))?;
        if number == 0 || number > items.len() {
            anyhow::bail!("No candidate {number} (have 1-{})", items.len());
        }
        chosen[number - 1] = true;
    }

    Ok(items
        .iter()
        .zip(chosen)
        .filter_map(|(item, keep)| keep.then(|| item.clone()))
        .collect())
}

fn export(
    sieve: &Sieve,
    picks: &[&str],
    out: &mut impl Write,
    dest: Option<&PathBuf>,
) -> Result<()> {
    let detected = sieve.detected_images();
    if detected.is_empty() {
        writeln!(out, "No candidates found")?;
        return Ok(());
    }
    let images = select(&detected, picks)?;
    let destination = resolve_destination(dest)?;
    let report = sieve.export(&images, &destination);
    writeln!(
        out,
        "{}",
        report_line(report.success_count(), report.requested, &destination.describe())
    )?;
    Ok(())
}
