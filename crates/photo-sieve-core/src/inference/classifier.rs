//! Binary image classifier.
//!
//! A small CNN that maps a square RGB image to one probability. Global
//! average pooling before the head lets the same weights run at any input
//! resolution (224 and 512 are the two shipped model variants).

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

/// Classifier network.
///
/// Architecture: 3 conv blocks (3x3 conv, ReLU, 2x2 max pool) with
/// 16/32/64 channels, global average pooling, one linear layer.
/// Input: `(1, N, N, 3)` NHWC floats in `[0, 1]`
/// Output: probability of the positive class
pub struct SieveNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc: Linear,
    device: Device,
}

impl SieveNet {
    /// Tensor names and shapes stored in the weights file.
    pub const PARAMETERS: &'static [(&'static str, &'static [usize])] = &[
        ("conv1.weight", &[16, 3, 3, 3]),
        ("conv1.bias", &[16]),
        ("conv2.weight", &[32, 16, 3, 3]),
        ("conv2.bias", &[32]),
        ("conv3.weight", &[64, 32, 3, 3]),
        ("conv3.bias", &[64]),
        ("fc.weight", &[1, 64]),
        ("fc.bias", &[1]),
    ];

    /// Creates the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let cfg = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        let conv1 = conv2d(3, 16, 3, cfg, vb.pp("conv1"))?;
        let conv2 = conv2d(16, 32, 3, cfg, vb.pp("conv2"))?;
        let conv3 = conv2d(32, 64, 3, cfg, vb.pp("conv3"))?;
        let fc = linear(64, 1, vb.pp("fc"))?;

        Ok(Self {
            conv1,
            conv2,
            conv3,
            fc,
            device,
        })
    }

    /// Classifies one preprocessed image.
    ///
    /// # Arguments
    /// * `input` - `size * size * 3` floats in HWC layout
    /// * `size` - Side length of the square input
    ///
    /// # Returns
    /// Probability of the positive class
    ///
    /// # Errors
    ///
    /// Returns an error if the input length is wrong or inference fails.
    pub fn classify(&self, input: &[f32], size: usize) -> Result<f32> {
        let expected = size * size * 3;
        if input.len() != expected {
            anyhow::bail!(
                "Expected {size}x{size}x3 input ({expected} values), got {}",
                input.len()
            );
        }

        let x = Tensor::from_slice(input, (1, size, size, 3), &self.device)
            .context("Failed to create input tensor")?;
        let logit = self.forward(&x)?.squeeze(0)?.squeeze(0)?.to_scalar::<f32>()?;
        Ok(sigmoid(logit))
    }
}

/// Logistic function mapping a logit to a probability.
#[inline]
#[must_use]
pub fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

impl Module for SieveNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // NHWC -> NCHW
        let x = x.permute((0, 3, 1, 2))?.contiguous()?;

        let x = self.conv1.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv2.forward(&x)?.relu()?.max_pool2d(2)?;
        let x = self.conv3.forward(&x)?.relu()?.max_pool2d(2)?;

        // Global average pool -> (1, 64)
        let x = x.mean(D::Minus1)?.mean(D::Minus1)?;

        self.fc.forward(&x)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
        assert!(sigmoid(12.0) > 0.999);
        assert!(sigmoid(-12.0) < 0.001);
    }

    #[test]
    fn test_zero_weights_score_one_half() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let net = SieveNet::new(vb).unwrap();
        let input = vec![0.5f32; 32 * 32 * 3];
        let score = net.classify(&input, 32).unwrap();
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_random_weights_stay_in_unit_range() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let net = SieveNet::new(vb).unwrap();

        for size in [16usize, 24] {
            let input: Vec<f32> = (0..size * size * 3)
                .map(|i| (i % 255) as f32 / 255.0)
                .collect();
            let score = net.classify(&input, size).unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_rejects_wrong_input_length() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let net = SieveNet::new(vb).unwrap();
        let err = net.classify(&[0.0; 10], 32).unwrap_err();
        assert!(err.to_string().contains("32x32x3"));
    }

    #[test]
    fn test_parameter_table_matches_layers() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let _net = SieveNet::new(vb).unwrap();

        let data = varmap.data().lock().unwrap();
        assert_eq!(data.len(), SieveNet::PARAMETERS.len());
        for (name, shape) in SieveNet::PARAMETERS {
            let var = data.get(*name).unwrap();
            assert_eq!(var.dims(), *shape, "{name}");
        }
    }
}
