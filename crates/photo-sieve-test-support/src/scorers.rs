//! Stub scorers and model weight writers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use candle_core::{DType, Device, Tensor};
use image::DynamicImage;
use photo_sieve_core::inference::SieveNet;
use photo_sieve_core::Scorer;

/// Scores `1.0` for every `every`-th call (1-based) and `0.0` otherwise.
///
/// With `every = 3`, calls 1, 4, 7, ... are positive.
pub struct SequenceScorer {
    every: usize,
    calls: AtomicUsize,
}

impl SequenceScorer {
    /// Creates a scorer that is positive on every `every`-th call.
    #[must_use]
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of images scored.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scorer for SequenceScorer {
    fn score(&self, _image: &DynamicImage) -> anyhow::Result<f32> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(if index % self.every == 0 { 1.0 } else { 0.0 })
    }
}

/// Scores an image by the red channel of its top-left pixel, scaled to `[0, 1]`.
pub struct PixelScorer;

impl Scorer for PixelScorer {
    fn score(&self, image: &DynamicImage) -> anyhow::Result<f32> {
        if image.width() == 0 || image.height() == 0 {
            anyhow::bail!("empty image");
        }
        let red = image.to_rgb8().get_pixel(0, 0).0[0];
        Ok(f32::from(red) / 255.0)
    }
}

/// Holds every call until [`GatedScorer::open`], then scores `1.0`.
///
/// A closed gate gives up after 10 seconds so a failing test cannot hang a
/// watcher shutdown.
#[derive(Default)]
pub struct GatedScorer {
    calls: AtomicUsize,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedScorer {
    /// Creates a scorer with the gate closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls started, including those still waiting.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Releases waiting and future calls.
    pub fn open(&self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.opened.notify_all();
    }
}

impl Scorer for GatedScorer {
    fn score(&self, _image: &DynamicImage) -> anyhow::Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        let _open = self
            .opened
            .wait_timeout_while(open, Duration::from_secs(10), |open| !*open)
            .unwrap_or_else(PoisonError::into_inner);
        Ok(1.0)
    }
}

/// Writes a weights file whose network outputs `sigmoid(logit)` for any input.
///
/// Every tensor is zero except the output bias.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_constant_model(path: impl AsRef<Path>, logit: f32) -> anyhow::Result<()> {
    let device = Device::Cpu;
    let mut tensors = HashMap::new();
    for (name, shape) in SieveNet::PARAMETERS {
        let tensor = if *name == "fc.bias" {
            Tensor::new(&[logit], &device)?
        } else {
            Tensor::zeros(*shape, DType::F32, &device)?
        };
        tensors.insert((*name).to_string(), tensor);
    }
    candle_core::safetensors::save(&tensors, path.as_ref())?;
    Ok(())
}

/// Writes an all-zero weights file; the network scores exactly `0.5`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_zero_model(path: impl AsRef<Path>) -> anyhow::Result<()> {
    write_constant_model(path, 0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SyntheticImageBuilder;

    #[test]
    fn test_sequence_scorer_every_third() {
        let scorer = SequenceScorer::new(3);
        let img = SyntheticImageBuilder::solid(2, 2, [0, 0, 0]);
        let scores: Vec<f32> = (0..7).map(|_| scorer.score(&img).unwrap()).collect();
        assert_eq!(scores, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(scorer.calls(), 7);
    }

    #[test]
    fn test_pixel_scorer_reads_red() {
        let img = SyntheticImageBuilder::solid(2, 2, [255, 0, 0]);
        assert!((PixelScorer.score(&img).unwrap() - 1.0).abs() < f32::EPSILON);
        let img = SyntheticImageBuilder::solid(2, 2, [0, 255, 255]);
        assert!(PixelScorer.score(&img).unwrap().abs() < f32::EPSILON);
    }

    #[test]
    fn test_gated_scorer_waits_for_open() {
        let scorer = std::sync::Arc::new(GatedScorer::new());
        let worker = {
            let scorer = std::sync::Arc::clone(&scorer);
            std::thread::spawn(move || {
                scorer.score(&SyntheticImageBuilder::solid(2, 2, [0, 0, 0]))
            })
        };
        while scorer.calls() == 0 {
            std::thread::yield_now();
        }
        assert!(!worker.is_finished());

        scorer.open();
        assert!((worker.join().unwrap().unwrap() - 1.0).abs() < f32::EPSILON);
    }
}
