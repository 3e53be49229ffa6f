//! Foreground segmentation capability.
//!
//! The pipeline only sees the [`Segmenter`] trait; [`OnnxSegmenter`] is the
//! production implementation backed by ONNX Runtime.

mod matting;
mod onnx;
mod variants;

pub use matting::{build_trimap, refine_alpha};
pub use onnx::OnnxSegmenter;
pub use variants::{ModelVariant, available_variants, find_variant};

use crate::{Result, config::ProcessingConfig};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Per-request knobs passed to the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub alpha_matting: bool,
    pub foreground_threshold: u8,
    pub background_threshold: u8,
    pub erode_size: u32,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self::from(&ProcessingConfig::default())
    }
}

impl From<&ProcessingConfig> for ProcessingOptions {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            alpha_matting: config.alpha_matting,
            foreground_threshold: config.foreground_threshold,
            background_threshold: config.background_threshold,
            erode_size: config.erode_size,
        }
    }
}

/// A loaded segmentation model.
///
/// Implementations must return an RGBA image with the same dimensions as
/// `image`, with the background made transparent.
pub trait Segmenter: Send + Sync {
    fn name(&self) -> &str;

    fn segment(&self, image: &DynamicImage, options: &ProcessingOptions) -> Result<RgbaImage>;
}

/// Cut the foreground out of `image` using `mask` as its alpha channel.
///
/// Fully transparent pixels are zeroed so the encoded PNG does not leak
/// background colour.
pub fn cutout(image: &DynamicImage, mask: &image::GrayImage) -> RgbaImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut result = RgbaImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = mask.get_pixel(x, y)[0];
        if alpha > 0 {
            result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_defaults_disable_alpha_matting() {
        let options = ProcessingOptions::default();
        assert!(!options.alpha_matting);
        assert_eq!(options.foreground_threshold, 240);
        assert_eq!(options.background_threshold, 10);
        assert_eq!(options.erode_size, 10);
    }

    #[test]
    fn test_cutout_uses_mask_as_alpha() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([200, 10, 20])));
        let mut mask = GrayImage::new(4, 2);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 0, Luma([128]));

        let out = cutout(&image, &mask);

        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(0, 0).0, [200, 10, 20, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [200, 10, 20, 128]);
        assert_eq!(out.get_pixel(3, 1).0, [0, 0, 0, 0]);
    }
}
