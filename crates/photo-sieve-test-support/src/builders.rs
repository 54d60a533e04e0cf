//! Synthetic image builders for testing.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Builder for creating synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates an image filled with one color.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// Creates a black and white checkerboard.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let cell = cell_size.max(1);
        let img = RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Creates a horizontal red gradient, dark on the left.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn horizontal_gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, _| {
            let val = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            Rgb([val, 0, 0])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Creates a wide image whose centre square is green and whose side
    /// bands are red.
    #[must_use]
    pub fn centre_marked(width: u32, height: u32) -> DynamicImage {
        let side = width.min(height);
        let left = (width - side) / 2;
        let top = (height - side) / 2;
        let img = RgbImage::from_fn(width, height, |x, y| {
            let inside = x >= left && x < left + side && y >= top && y < top + side;
            if inside {
                Rgb([0, 255, 0])
            } else {
                Rgb([255, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Encodes an image as PNG.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which does not happen for in-memory buffers.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .expect("PNG encoding into memory");
        out.into_inner()
    }

    /// Saves an image to `path`, choosing the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(image: &DynamicImage, path: impl AsRef<Path>) -> anyhow::Result<()> {
        image.save(path.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color() {
        let img = SyntheticImageBuilder::solid(4, 3, [10, 20, 30]).to_rgb8();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2).0, [10, 20, 30]);
    }

    #[test]
    fn test_centre_marked_bands() {
        let img = SyntheticImageBuilder::centre_marked(30, 10).to_rgb8();
        assert_eq!(img.get_pixel(0, 5).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(15, 5).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(29, 5).0, [255, 0, 0]);
    }

    #[test]
    fn test_png_bytes_decode() {
        let img = SyntheticImageBuilder::checkerboard(16, 16, 4);
        let bytes = SyntheticImageBuilder::png_bytes(&img);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.to_rgb8(), img.to_rgb8());
    }
}
