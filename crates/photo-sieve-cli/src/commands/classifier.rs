//! Classifier flags shared by `scan` and `watch`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use photo_sieve_adapters::model_path;
use photo_sieve_core::preprocess::{DEFAULT_INPUT_SIZE, MIN_INPUT_SIZE};
use photo_sieve_core::{ChannelOrder, DecisionRule, Detector, ModelScorer, Polarity, Preprocessor};
use tracing::{debug, info};

use crate::config::ModelConfig;

/// Hardcoded default values.
mod defaults {
    pub const THRESHOLD: f32 = 0.5;
}

/// Parse and validate a threshold value (0.0-1.0).
pub fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse and validate a model input size.
fn parse_input_size(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid size"))?;
    if value >= MIN_INPUT_SIZE {
        Ok(value)
    } else {
        Err(format!("{value} is smaller than {MIN_INPUT_SIZE}"))
    }
}

/// Color channel order of the model input.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChannelOrderArg {
    /// Red, green, blue
    Rgb,
    /// Blue, green, red
    Bgr,
}

impl From<ChannelOrderArg> for ChannelOrder {
    fn from(arg: ChannelOrderArg) -> Self {
        match arg {
            ChannelOrderArg::Rgb => Self::Rgb,
            ChannelOrderArg::Bgr => Self::Bgr,
        }
    }
}

/// Which side of the threshold counts as detected.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolarityArg {
    /// Detected when score >= threshold
    Above,
    /// Detected when score <= threshold
    Below,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Above => Self::AtOrAbove,
            PolarityArg::Below => Self::AtOrBelow,
        }
    }
}

/// Classifier arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct ClassifierArgs {
    /// Classifier weights (safetensors)
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Model input resolution
    #[arg(long, value_parser = parse_input_size)]
    pub input_size: Option<u32>,

    /// Channel order of the model input
    #[arg(long, value_enum)]
    pub channel_order: Option<ChannelOrderArg>,

    /// Decision threshold (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f32>,

    /// Side of the threshold that counts as detected
    #[arg(long, value_enum)]
    pub polarity: Option<PolarityArg>,
}

impl ClassifierArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &ModelConfig) -> Self {
        if self.model.is_none() {
            self.model.clone_from(&config.path);
        }
        self.input_size = self
            .input_size
            .or(config.input_size.filter(|s| *s >= MIN_INPUT_SIZE));
        if self.channel_order.is_none() {
            self.channel_order = config
                .channel_order
                .as_deref()
                .and_then(|s| match s {
                    "rgb" => Some(ChannelOrderArg::Rgb),
                    "bgr" => Some(ChannelOrderArg::Bgr),
                    _ => None,
                });
        }
        self.threshold = self
            .threshold
            .or(config.threshold.filter(|t| (0.0..=1.0).contains(t)));
        if self.polarity.is_none() {
            self.polarity = config.polarity.as_deref().and_then(|s| match s {
                "above" => Some(PolarityArg::Above),
                "below" => Some(PolarityArg::Below),
                _ => None,
            });
        }
        self
    }

    /// Weights path with fallback to the data directory.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.model.clone().unwrap_or_else(model_path)
    }

    /// Preprocessing settings.
    #[must_use]
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(
            self.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            self.channel_order.map(ChannelOrder::from).unwrap_or_default(),
        )
    }

    /// Decision rule.
    #[must_use]
    pub fn rule(&self) -> DecisionRule {
        DecisionRule::new(
            self.threshold.unwrap_or(defaults::THRESHOLD),
            self.polarity.map(Polarity::from).unwrap_or_default(),
        )
    }

    /// Loads the model and builds a detector.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or cannot be loaded.
    pub fn build_detector(&self) -> Result<Detector> {
        let path = self.model_path();
        if !path.is_file() {
            anyhow::bail!(
                "Model not found at {}. Place the classifier weights there or pass --model",
                path.display()
            );
        }

        let preprocessor = self.preprocessor();
        let rule = self.rule();
        debug!(
            "Classifier: {}x{} {:?}, threshold {} {:?}",
            preprocessor.input_size(),
            preprocessor.input_size(),
            preprocessor.channel_order(),
            rule.threshold,
            rule.polarity
        );

        let scorer = ModelScorer::new(&path, preprocessor);
        scorer
            .preload()
            .with_context(|| format!("Failed to load classifier from {}", path.display()))?;
        info!("Loaded classifier from {}", path.display());

        Ok(Detector::new(Arc::new(scorer), rule))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0.7").unwrap(), 0.7);
        assert!(parse_threshold("1.2").unwrap_err().contains("not in 0.0..=1.0"));
        assert!(parse_threshold("abc").unwrap_err().contains("not a valid number"));
    }

    #[test]
    fn test_parse_input_size() {
        assert_eq!(parse_input_size("512").unwrap(), 512);
        assert!(parse_input_size("4").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = ClassifierArgs::default();
        assert_eq!(args.rule(), DecisionRule::default());
        assert_eq!(args.preprocessor(), Preprocessor::default());
    }

    #[test]
    fn test_cli_wins_over_config() {
        let config = ModelConfig {
            threshold: Some(0.2),
            polarity: Some("below".into()),
            input_size: Some(512),
            channel_order: Some("bgr".into()),
            path: Some(PathBuf::from("/config/model.safetensors")),
        };
        let args = ClassifierArgs {
            threshold: Some(0.9),
            ..ClassifierArgs::default()
        }
        .with_config(&config);

        assert_eq!(args.rule().threshold, 0.9);
        assert_eq!(args.rule().polarity, Polarity::AtOrBelow);
        assert_eq!(args.preprocessor().input_size(), 512);
        assert_eq!(args.preprocessor().channel_order(), ChannelOrder::Bgr);
        assert_eq!(args.model_path(), PathBuf::from("/config/model.safetensors"));
    }

    #[test]
    fn test_invalid_config_values_fall_back() {
        let config = ModelConfig {
            threshold: Some(3.0),
            polarity: Some("sideways".into()),
            ..ModelConfig::default()
        };
        let args = ClassifierArgs::default().with_config(&config);
        assert_eq!(args.rule(), DecisionRule::default());
    }

    #[test]
    fn test_missing_model_is_error() {
        let args = ClassifierArgs {
            model: Some(PathBuf::from("/nonexistent/sieve.safetensors")),
            ..ClassifierArgs::default()
        };
        let err = args.build_detector().err().expect("expected an error");
        assert!(err.to_string().contains("Model not found"));
    }
}
