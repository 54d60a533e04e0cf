//! Configuration file support for photo-sieve.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/photo-sieve/config.toml` (lowest priority)
//! - Project-local: `.photo-sieve.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use anyhow::Context;
use photo_sieve_core::preprocess::MIN_INPUT_SIZE;
use photo_sieve_core::{ChannelOrder, Polarity};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// File name of the project-local config.
const PROJECT_CONFIG: &str = ".photo-sieve.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Classifier settings.
    pub model: ModelConfig,
    /// Change watcher settings.
    pub watch: WatchConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Photo library root directory.
    pub library: Option<PathBuf>,
}

/// Classifier configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Weights file path.
    pub path: Option<PathBuf>,
    /// Model input resolution.
    pub input_size: Option<u32>,
    /// Channel order: "rgb" or "bgr".
    pub channel_order: Option<String>,
    /// Decision threshold (0.0-1.0).
    pub threshold: Option<f32>,
    /// Detected side of the threshold: "above" or "below".
    pub polarity: Option<String>,
}

/// Change watcher configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Library poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Layers are applied lowest priority first; a later layer only
    /// overrides the keys it sets. Unreadable or malformed files are skipped
    /// with a warning, and every out-of-range value is reported on stderr.
    pub fn load() -> Self {
        let mut config = Self::default();
        for path in config_layers() {
            match read_layer(&path) {
                Ok(layer) => {
                    info!("Loaded config: {}", path.display());
                    config.merge(layer);
                }
                Err(e) => warn!("Skipping config {}: {e:#}", path.display()),
            }
        }

        for problem in config.problems() {
            eprintln!("warning: {problem}");
        }
        config
    }

    /// Describes every value outside its accepted range.
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let model = &self.model;

        if let Some(t) = model.threshold.filter(|t| !(0.0..=1.0).contains(t)) {
            problems.push(format!("model.threshold must be 0.0-1.0, got {t}"));
        }
        if let Some(size) = model.input_size.filter(|s| *s < MIN_INPUT_SIZE) {
            problems.push(format!(
                "model.input_size must be at least {MIN_INPUT_SIZE}, got {size}"
            ));
        }
        if let Some(order) = model
            .channel_order
            .as_deref()
            .filter(|o| ChannelOrder::from_name(o).is_none())
        {
            problems.push(format!(
                "model.channel_order must be 'rgb' or 'bgr', got '{order}'"
            ));
        }
        if let Some(polarity) = model
            .polarity
            .as_deref()
            .filter(|p| Polarity::from_name(p).is_none())
        {
            problems.push(format!(
                "model.polarity must be 'above' or 'below', got '{polarity}'"
            ));
        }
        if self.watch.poll_interval_ms == Some(0) {
            problems.push("watch.poll_interval_ms must be positive".to_string());
        }
        if let Some(format) = self
            .output
            .format
            .as_deref()
            .filter(|f| !matches!(*f, "json" | "jsonl"))
        {
            problems.push(format!(
                "output.format must be 'json' or 'jsonl', got '{format}'"
            ));
        }

        problems
    }

    /// Overlays `other` onto `self`; keys `other` leaves unset keep their value.
    fn merge(&mut self, other: Self) {
        fn overlay<T>(base: &mut Option<T>, top: Option<T>) {
            if top.is_some() {
                *base = top;
            }
        }

        overlay(&mut self.general.library, other.general.library);

        overlay(&mut self.model.path, other.model.path);
        overlay(&mut self.model.input_size, other.model.input_size);
        overlay(&mut self.model.channel_order, other.model.channel_order);
        overlay(&mut self.model.threshold, other.model.threshold);
        overlay(&mut self.model.polarity, other.model.polarity);

        overlay(&mut self.watch.poll_interval_ms, other.watch.poll_interval_ms);

        overlay(&mut self.output.format, other.output.format);
        overlay(&mut self.output.pretty, other.output.pretty);
        overlay(&mut self.output.progress, other.output.progress);
    }
}

/// Existing config files, lowest priority first.
fn config_layers() -> Vec<PathBuf> {
    let xdg = dirs::config_dir().map(|d| d.join("photo-sieve").join("config.toml"));
    let project = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_in_parents(&cwd));

    [xdg, project]
        .into_iter()
        .flatten()
        .filter(|path| {
            let found = path.is_file();
            if !found {
                debug!("No config at {}", path.display());
            }
            found
        })
        .collect()
}

/// Nearest `.photo-sieve.toml` in `start` or one of its ancestors.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG))
        .find(|candidate| candidate.is_file())
}

fn read_layer(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path).context("read failed")?;
    toml::from_str(&text).context("invalid TOML")
}
