use super::{ModelVariant, ProcessingOptions, Segmenter, build_trimap, cutout, refine_alpha};
use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbaImage, imageops::FilterType};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::{path::Path, sync::Mutex, time::Instant};
use tracing::{debug, info};

/// Salient-object segmentation model run through ONNX Runtime.
///
/// `Session::run` needs exclusive access, so concurrent requests serialize
/// on the inner lock for the duration of one inference.
pub struct OnnxSegmenter {
    variant: &'static ModelVariant,
    session: Mutex<Session>,
}

impl OnnxSegmenter {
    pub fn load(
        variant: &'static ModelVariant,
        model_path: &Path,
        intra_threads: Option<usize>,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::unavailable(format!(
                "Model weights not found: {}",
                model_path.display()
            )));
        }

        let load_start = Instant::now();
        let mut builder = Session::builder()
            .map_err(|e| Error::unavailable(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::unavailable(format!("Failed to set optimization level: {e}")))?;

        if let Some(threads) = intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| Error::unavailable(format!("Failed to set intra threads: {e}")))?;
        }

        let session = builder.commit_from_file(model_path).map_err(|e| {
            Error::unavailable(format!(
                "Failed to load model {}: {e}",
                model_path.display()
            ))
        })?;

        info!(
            "Loaded model '{}' from {} in {:.2}ms",
            variant.name,
            model_path.display(),
            load_start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            variant,
            session: Mutex::new(session),
        })
    }

    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.variant.input_size;
        let rgb = image::imageops::resize(&image.to_rgb8(), size, size, FilterType::Lanczos3);

        // Scale by the brightest channel value, not a fixed 255
        let max = f32::from(rgb.pixels().flat_map(|p| p.0).max().unwrap_or(0)).max(1e-6);

        let side = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = (f32::from(pixel[channel]) / max
                    - self.variant.mean[channel])
                    / self.variant.std[channel];
            }
        }
        tensor
    }

    fn infer(&self, input: Array4<f32>) -> Result<(usize, usize, Vec<f32>)> {
        let input_value = Tensor::from_array(input)
            .map_err(|e| Error::processing(format!("Failed to convert input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| Error::internal(format!("Session lock poisoned: {e}")))?;

        let inference_start = Instant::now();
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| Error::processing(format!("ONNX inference failed: {e}")))?;

        let first_key = outputs
            .keys()
            .next()
            .ok_or_else(|| Error::processing("No output tensors found"))?;
        let output = outputs
            .get(first_key)
            .ok_or_else(|| Error::processing("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| Error::processing(format!("Failed to extract output tensor: {e}")))?;

        let shape = output.shape().to_vec();
        if shape.len() != 4 {
            return Err(Error::processing(format!(
                "Expected 4D output tensor, got {}D",
                shape.len()
            )));
        }
        let (height, width) = (shape[2], shape[3]);

        // Batch 0, channel 0 are the first height*width values in logical order
        let prediction: Vec<f32> = output.iter().take(height * width).copied().collect();

        debug!(
            "Inference complete: {:.2}ms, output shape {:?}",
            inference_start.elapsed().as_secs_f64() * 1000.0,
            shape
        );

        Ok((width, height, prediction))
    }

    fn prediction_to_mask(width: usize, height: usize, prediction: &[f32]) -> Result<GrayImage> {
        let (min, max) = prediction
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = (max - min).max(f32::EPSILON);

        let width = u32::try_from(width)
            .map_err(|_| Error::processing("Output width does not fit in u32"))?;
        let height = u32::try_from(height)
            .map_err(|_| Error::processing("Output height does not fit in u32"))?;

        let pixels: Vec<u8> = prediction
            .iter()
            .map(|&v| (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();

        GrayImage::from_raw(width, height, pixels)
            .ok_or_else(|| Error::processing("Output tensor smaller than its declared shape"))
    }
}

impl Segmenter for OnnxSegmenter {
    fn name(&self) -> &str {
        self.variant.name
    }

    fn segment(&self, image: &DynamicImage, options: &ProcessingOptions) -> Result<RgbaImage> {
        let (orig_width, orig_height) = (image.width(), image.height());

        let tensor = self.preprocess(image);
        let (width, height, prediction) = self.infer(tensor)?;
        let small_mask = Self::prediction_to_mask(width, height, &prediction)?;

        let mut mask: GrayImage =
            image::imageops::resize(&small_mask, orig_width, orig_height, FilterType::Lanczos3);

        if options.alpha_matting {
            debug!(
                "Applying alpha matting (fg={}, bg={}, erode={})",
                options.foreground_threshold, options.background_threshold, options.erode_size
            );
            let trimap = build_trimap(
                &mask,
                options.foreground_threshold,
                options.background_threshold,
                options.erode_size,
            );
            mask = refine_alpha(&mask, &trimap, options.erode_size);
        }

        Ok(cutout(image, &mask))
    }
}
