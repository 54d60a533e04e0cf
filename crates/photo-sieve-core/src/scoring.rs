//! Scoring images and turning scores into verdicts.
//!
//! Every failure (unreadable image, decode error, model error, unusable
//! score) becomes a [`Verdict::Failed`], which never counts as detected.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, warn};

use crate::domain::{DecisionRule, ImageRef, Score};
use crate::error::SieveError;
use crate::inference::{get_device, LazyModel, SieveNet};
use crate::ports::PhotoLibrary;
use crate::preprocess::Preprocessor;

/// Produces a probability for a decoded image.
pub trait Scorer: Send + Sync {
    /// Scores an image.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    fn score(&self, image: &DynamicImage) -> Result<f32>;
}

/// Scorer backed by the bundled [`SieveNet`] weights.
pub struct ModelScorer {
    preprocessor: Preprocessor,
    model: LazyModel<SieveNet>,
}

impl ModelScorer {
    /// Creates a scorer for the weights at `model_path`.
    ///
    /// The weights are loaded on first use or by [`Self::preload`].
    #[must_use]
    pub fn new(model_path: impl AsRef<Path>, preprocessor: Preprocessor) -> Self {
        Self {
            preprocessor,
            model: LazyModel::new(model_path, get_device(), SieveNet::new),
        }
    }

    /// Loads the weights now instead of on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights cannot be read or do not fit the network.
    pub fn preload(&self) -> Result<()> {
        self.model
            .load()
            .with_context(|| format!("Failed to load model {}", self.model.path().display()))
    }

    /// Preprocessing applied before inference.
    #[must_use]
    pub const fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}

impl Scorer for ModelScorer {
    fn score(&self, image: &DynamicImage) -> Result<f32> {
        let input = self.preprocessor.prepare(image);
        let size = self.preprocessor.input_size() as usize;
        self.model.with(|net| net.classify(&input, size))
    }
}

/// Outcome of evaluating one image.
#[derive(Debug)]
pub enum Verdict {
    /// The score is on the detected side of the threshold.
    Detected(Score),
    /// The score is on the other side.
    Clear(Score),
    /// Evaluation failed; treated as not detected.
    Failed(SieveError),
}

impl Verdict {
    /// Returns true only for [`Verdict::Detected`].
    #[must_use]
    pub const fn is_detected(&self) -> bool {
        matches!(self, Self::Detected(_))
    }

    /// Returns the score, if one was produced.
    #[must_use]
    pub const fn score(&self) -> Option<Score> {
        match self {
            Self::Detected(score) | Self::Clear(score) => Some(*score),
            Self::Failed(_) => None,
        }
    }
}

/// Scores library images and applies the decision rule.
#[derive(Clone)]
pub struct Detector {
    scorer: Arc<dyn Scorer>,
    rule: DecisionRule,
}

impl Detector {
    /// Creates a detector.
    #[must_use]
    pub fn new(scorer: Arc<dyn Scorer>, rule: DecisionRule) -> Self {
        Self { scorer, rule }
    }

    /// The decision rule in use.
    #[must_use]
    pub const fn rule(&self) -> DecisionRule {
        self.rule
    }

    /// Reads, decodes and scores an image.
    ///
    /// Never fails: errors are logged and returned as [`Verdict::Failed`].
    pub fn evaluate(&self, library: &dyn PhotoLibrary, image: &ImageRef) -> Verdict {
        let verdict = match self.try_evaluate(library, image) {
            Ok(score) if self.rule.is_detected(score) => Verdict::Detected(score),
            Ok(score) => Verdict::Clear(score),
            Err(e) => {
                warn!("{e}: {}", e.causes());
                Verdict::Failed(e)
            }
        };
        debug!("Evaluated {}: {:?}", image.uri, verdict.score());
        verdict
    }

    fn try_evaluate(&self, library: &dyn PhotoLibrary, image: &ImageRef) -> Result<Score, SieveError> {
        let decoded = decode(library, image)?;

        let raw = self
            .scorer
            .score(&decoded)
            .map_err(|e| SieveError::inference(&image.uri, e))?;

        Score::new(raw).ok_or_else(|| {
            SieveError::inference(&image.uri, format!("score {raw} is outside [0, 1]"))
        })
    }
}

/// Reads and decodes an image from the library.
fn decode(library: &dyn PhotoLibrary, image: &ImageRef) -> Result<DynamicImage, SieveError> {
    let mut bytes = Vec::new();
    library
        .open(image)
        .and_then(|mut reader| {
            reader
                .read_to_end(&mut bytes)
                .context("Failed to read image bytes")
        })
        .map_err(|e| SieveError::decode(&image.uri, e))?;

    image::load_from_memory(&bytes).map_err(|e| SieveError::decode(&image.uri, e))
}
