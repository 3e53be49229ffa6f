use image::{DynamicImage, RgbaImage};
use remove_bg_rust::{
    Error, Result,
    segmentation::{ProcessingOptions, Segmenter},
};
use std::sync::{Arc, Mutex};

/// Mock segmenter for testing.
///
/// Treats the left half of every image as foreground and the right half as
/// background, so outputs are deterministic and easy to assert on.
#[derive(Debug, Default)]
pub struct MockSegmenter {
    pub calls: Arc<Mutex<Vec<ProcessingOptions>>>,
    pub error: Option<String>,
    pub shrink_output: bool,
}

impl MockSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Return an output one pixel narrower than the input.
    pub fn with_wrong_dimensions(mut self) -> Self {
        self.shrink_output = true;
        self
    }

    pub fn get_calls(&self) -> Vec<ProcessingOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl Segmenter for MockSegmenter {
    fn name(&self) -> &str {
        "mock-u2net"
    }

    fn segment(&self, image: &DynamicImage, options: &ProcessingOptions) -> Result<RgbaImage> {
        self.calls.lock().unwrap().push(*options);

        if let Some(ref error) = self.error {
            return Err(Error::processing(error.clone()));
        }

        let source = image.to_rgba8();
        let width = if self.shrink_output {
            source.width().saturating_sub(1)
        } else {
            source.width()
        };
        let half = source.width() / 2;

        Ok(RgbaImage::from_fn(width, source.height(), |x, y| {
            let mut pixel = *source.get_pixel(x, y);
            if x >= half {
                pixel.0 = [0, 0, 0, 0];
            }
            pixel
        }))
    }
}

/// Segmenter that reports the capability as gone at call time.
#[derive(Debug, Default)]
pub struct VanishingSegmenter;

impl Segmenter for VanishingSegmenter {
    fn name(&self) -> &str {
        "vanishing"
    }

    fn segment(&self, _image: &DynamicImage, _options: &ProcessingOptions) -> Result<RgbaImage> {
        Err(Error::unavailable("runtime unloaded"))
    }
}
