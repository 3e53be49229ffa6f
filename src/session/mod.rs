//! Process-wide segmentation session.
//!
//! Built exactly once at startup and shared read-only by every request.
//! A failed load is never retried.

pub mod state;

pub use state::{ServiceEvent, ServiceState, ServiceStateMachine};

use crate::{
    Error, Result, codec,
    config::ModelConfig,
    segmentation::{OnnxSegmenter, ProcessingOptions, Segmenter, available_variants, find_variant},
};
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of asking the session to segment one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentResult {
    /// PNG-encoded RGBA output with the input's dimensions.
    Success(Vec<u8>),
    Unavailable,
    Failure(String),
}

pub struct SessionManager {
    model_name: String,
    segmenter: Option<Arc<dyn Segmenter>>,
    unavailable_reason: Option<String>,
}

impl SessionManager {
    /// Try to load the configured model. Never fails: a load error leaves
    /// the manager permanently unavailable.
    pub fn initialize(config: &ModelConfig) -> Self {
        info!("Initializing segmentation session for model '{}'", config.name);
        info!("Available model variants: {:?}", available_variants());

        match create_segmenter(config) {
            Ok(segmenter) => {
                info!("Segmentation session initialized: {}", segmenter.name());
                Self::with_segmenter(segmenter)
            }
            Err(e) => {
                error!("Failed to initialize segmentation session: {}", e);
                Self::unavailable(&config.name, e.to_string())
            }
        }
    }

    pub fn with_segmenter(segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            model_name: segmenter.name().to_string(),
            segmenter: Some(segmenter),
            unavailable_reason: None,
        }
    }

    pub fn unavailable(model_name: &str, reason: impl Into<String>) -> Self {
        Self {
            model_name: model_name.to_string(),
            segmenter: None,
            unavailable_reason: Some(reason.into()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_available(&self) -> bool {
        self.segmenter.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    /// Event to feed the service state machine once initialization is over.
    pub fn startup_event(&self) -> ServiceEvent {
        if self.is_available() {
            ServiceEvent::SessionInitialized
        } else {
            ServiceEvent::SessionFailed
        }
    }

    pub fn segment(&self, image: &DynamicImage, options: &ProcessingOptions) -> SegmentResult {
        let Some(ref segmenter) = self.segmenter else {
            return SegmentResult::Unavailable;
        };

        let output = match segmenter.segment(image, options) {
            Ok(output) => output,
            Err(Error::CapabilityUnavailable(_)) => return SegmentResult::Unavailable,
            Err(e) => return SegmentResult::Failure(e.to_string()),
        };

        if output.dimensions() != image.dimensions() {
            return SegmentResult::Failure(format!(
                "Segmenter returned {}x{} for a {}x{} input",
                output.width(),
                output.height(),
                image.width(),
                image.height()
            ));
        }

        match codec::encode_png(&output) {
            Ok(bytes) => SegmentResult::Success(bytes),
            Err(e) => SegmentResult::Failure(e.to_string()),
        }
    }
}

fn create_segmenter(config: &ModelConfig) -> Result<Arc<dyn Segmenter>> {
    let variant = find_variant(&config.name)
        .ok_or_else(|| Error::config(format!("Unknown model variant: {}", config.name)))?;
    let model_path = config
        .resolve_path()
        .ok_or_else(|| Error::config("Cannot resolve model directory (no home directory)"))?;

    let segmenter = OnnxSegmenter::load(variant, &model_path, config.intra_threads)?;
    Ok(Arc::new(segmenter))
}
