//! Image preprocessing for the classifier.
//!
//! Crops the centre square, scales it to the model resolution and converts
//! pixels to `[0, 1]` floats in interleaved HWC layout.

// Allow common image code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Default model input resolution.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Smallest accepted model input resolution.
pub const MIN_INPUT_SIZE: u32 = 8;

/// Order in which color channels are written to the input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl ChannelOrder {
    /// Parses the configuration spelling (`rgb` or `bgr`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rgb" => Some(Self::Rgb),
            "bgr" => Some(Self::Bgr),
            _ => None,
        }
    }

    const fn indices(self) -> [usize; 3] {
        match self {
            Self::Rgb => [0, 1, 2],
            Self::Bgr => [2, 1, 0],
        }
    }
}

/// Resizes, crops and normalizes images to the model input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocessor {
    input_size: u32,
    channel_order: ChannelOrder,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, ChannelOrder::default())
    }
}

impl Preprocessor {
    /// Creates a preprocessor for an `input_size x input_size` model.
    ///
    /// Sizes below [`MIN_INPUT_SIZE`] are raised to it.
    #[must_use]
    pub fn new(input_size: u32, channel_order: ChannelOrder) -> Self {
        Self {
            input_size: input_size.max(MIN_INPUT_SIZE),
            channel_order,
        }
    }

    /// Side length of the model input.
    #[must_use]
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Channel order of the model input.
    #[must_use]
    pub const fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    /// Number of floats produced by [`Self::prepare`].
    #[must_use]
    pub const fn tensor_len(&self) -> usize {
        let n = self.input_size as usize;
        n * n * 3
    }

    /// Crops the centre square and scales it to the input size.
    ///
    /// The crop happens in source coordinates, so the working buffer never
    /// exceeds the source square or `input_size x input_size`, whatever the
    /// aspect ratio. Always returns exactly `input_size x input_size` pixels.
    #[must_use]
    pub fn resize_and_crop(&self, image: &DynamicImage) -> RgbImage {
        let n = self.input_size;
        let (w, h) = (image.width(), image.height());
        let side = w.min(h).max(1);
        let left = w.saturating_sub(side) / 2;
        let top = h.saturating_sub(side) / 2;

        let square = image.crop_imm(left, top, side, side).to_rgb8();
        if square.dimensions() == (n, n) {
            return square;
        }
        image::imageops::resize(&square, n, n, FilterType::Triangle)
    }

    /// Converts pixels to `[0, 1]` floats in HWC layout and channel order.
    #[must_use]
    pub fn normalize(&self, rgb: &RgbImage) -> Vec<f32> {
        let order = self.channel_order.indices();
        let mut data = Vec::with_capacity(rgb.as_raw().len());
        for pixel in rgb.pixels() {
            for &channel in &order {
                data.push(f32::from(pixel[channel]) / 255.0);
            }
        }
        data
    }

    /// Resizes, crops and normalizes an image.
    #[must_use]
    pub fn prepare(&self, image: &DynamicImage) -> Vec<f32> {
        self.normalize(&self.resize_and_crop(image))
    }
}
