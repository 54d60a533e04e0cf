//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use photo_sieve_core::{ProgressSink, ScanEvent};

/// Progress bar adapter for deep scans.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise print detections as they happen
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ScanEvent) {
        if self.quiet {
            return;
        }

        match event {
            ScanEvent::Started { total } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total as u64);
                    bar.set_position(0);
                }
            }
            ScanEvent::Progress {
                current,
                image,
                detected,
                ..
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(current as u64);
                    bar.set_message(image.id);
                } else if detected {
                    eprintln!("{}: detected", image.id);
                }
            }
            ScanEvent::Finished {
                scanned,
                total,
                detections,
                cancelled,
            } => {
                if let Some(bar) = &self.bar {
                    let verb = if cancelled { "Cancelled" } else { "Done" };
                    bar.finish_with_message(format!(
                        "{verb}: {scanned}/{total} scanned, {} detected",
                        detections.len()
                    ));
                }
            }
        }
    }
}
