use crate::{
    Error, Result, codec,
    config::DebugConfig,
    fallback,
    segmentation::ProcessingOptions,
    session::{SegmentResult, SessionManager},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{Span, error, info, warn};

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed>")
    }
}

/// Validates uploads and turns them into transparent PNGs, through the
/// model session when it is available and the fallback compositor otherwise.
pub struct RequestPipeline {
    session: SessionManager,
    defaults: ProcessingOptions,
    debug: DebugConfig,
}

impl RequestPipeline {
    pub fn new(session: SessionManager, defaults: ProcessingOptions, debug: DebugConfig) -> Self {
        Self {
            session,
            defaults,
            debug,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn defaults(&self) -> &ProcessingOptions {
        &self.defaults
    }

    pub fn validate(upload: &Upload) -> Result<()> {
        let is_image = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(Error::validation("File must be an image"));
        }
        Ok(())
    }

    /// Validate, then run the CPU-bound work on the blocking pool.
    pub async fn handle(
        self: Arc<Self>,
        upload: Upload,
        options: ProcessingOptions,
    ) -> Result<Vec<u8>> {
        Self::validate(&upload)?;

        let span = Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            self.process(&upload, &options)
        })
        .await
        .map_err(|e| Error::internal(format!("Processing task failed: {e}")))?
    }

    /// Synchronous body of [`handle`](Self::handle). Assumes the upload has
    /// already passed [`validate`](Self::validate).
    pub fn process(&self, upload: &Upload, options: &ProcessingOptions) -> Result<Vec<u8>> {
        info!(
            "Processing image: {}, size: {:.2} KB",
            upload.display_name(),
            upload.data.len() as f64 / 1024.0
        );

        let image = codec::decode(&upload.data)?;
        info!(
            "Input image: mode={}, size=({}, {})",
            codec::mode_name(image.color()),
            image.width(),
            image.height()
        );

        match self.session.segment(&image, options) {
            SegmentResult::Success(output) => {
                info!(
                    "Input size: {} bytes, Output size: {} bytes",
                    upload.data.len(),
                    output.len()
                );
                if self.debug.enabled {
                    self.write_debug_output(&upload.data, &output);
                }
                Ok(output)
            }
            SegmentResult::Failure(reason) => {
                error!("Segmentation failed for {}: {}", upload.display_name(), reason);
                Err(Error::processing(reason))
            }
            SegmentResult::Unavailable => {
                warn!("Segmentation model not available, falling back to passthrough composite");
                codec::encode_png(&fallback::compose_image(&image))
            }
        }
    }

    /// Persist `output` under a name derived from the input's content hash.
    /// Failures are logged and otherwise ignored.
    fn write_debug_output(&self, input: &[u8], output: &[u8]) {
        let digest = Sha256::digest(input);
        let path = self
            .debug
            .output_dir
            .join(format!("debug_output_{digest:x}.png"));

        let written = std::fs::create_dir_all(&self.debug.output_dir)
            .and_then(|()| std::fs::write(&path, output));
        match written {
            Ok(()) => info!("Saved debug output to {}", path.display()),
            Err(e) => warn!("Failed to write debug output {}: {}", path.display(), e),
        }
    }
}
