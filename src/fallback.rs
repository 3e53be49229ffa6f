//! Degraded output used when no segmentation model could be loaded.
//!
//! This does not remove anything: the source is composited over a fully
//! transparent canvas of the same size, so callers still receive an RGBA
//! PNG with the input's own alpha.

use crate::{Result, codec};
use image::{DynamicImage, RgbaImage, imageops};
use tracing::debug;

pub fn compose_image(image: &DynamicImage) -> RgbaImage {
    let source = image.to_rgba8();
    let (width, height) = source.dimensions();
    let mut canvas = RgbaImage::new(width, height);

    // Source-over onto transparent: the source alpha acts as the paste mask
    imageops::overlay(&mut canvas, &source, 0, 0);

    debug!("Fallback composite {}x{}", width, height);
    canvas
}

/// Standalone byte-level entry point: decode `data` and return the fallback
/// composite as PNG bytes. The request pipeline has already decoded the
/// upload and calls [`compose_image`] directly.
pub fn compose(data: &[u8]) -> Result<Vec<u8>> {
    let image = image::load_from_memory(data)
        .map_err(|e| crate::Error::processing(format!("Fallback decode failed: {e}")))?;
    codec::encode_png(&compose_image(&image))
}
