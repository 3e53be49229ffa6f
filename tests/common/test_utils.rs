use super::mocks::MockSegmenter;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use remove_bg_rust::{
    config::{DebugConfig, ServerConfig},
    pipeline::RequestPipeline,
    segmentation::{ProcessingOptions, Segmenter},
    server::{self, AppState},
    session::{ServiceStateMachine, SessionManager},
};
use std::{io::Cursor, sync::Arc};

pub const BOUNDARY: &str = "remove-bg-test-boundary";

/// Build a pipeline around `session`, driving the lifecycle the same way
/// the server does at startup.
pub fn create_state(session: SessionManager, debug: DebugConfig) -> AppState {
    let mut lifecycle = ServiceStateMachine::new();
    let service_state = lifecycle.transition(session.startup_event()).unwrap();
    let pipeline = RequestPipeline::new(session, ProcessingOptions::default(), debug);
    AppState::new(pipeline, service_state)
}

pub fn create_app_with(segmenter: Arc<dyn Segmenter>) -> Router {
    let state = create_state(
        SessionManager::with_segmenter(segmenter),
        DebugConfig::default(),
    );
    server::router(state, &ServerConfig::default())
}

pub fn create_app() -> (Router, Arc<MockSegmenter>) {
    let segmenter = Arc::new(MockSegmenter::new());
    (create_app_with(segmenter.clone()), segmenter)
}

pub fn create_unavailable_app() -> Router {
    let state = create_state(
        SessionManager::unavailable("u2net", "Model weights not found"),
        DebugConfig::default(),
    );
    server::router(state, &ServerConfig::default())
}

pub fn encode_image(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    encode_image(image, ImageFormat::Jpeg)
}

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    encode_image(image, ImageFormat::Png)
}

/// Encode a single multipart/form-data part.
pub fn multipart_body(
    field_name: &str,
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn image_upload(content_type: &str, data: &[u8]) -> Request<Body> {
    upload_request(
        "/api/remove-bg",
        multipart_body("file", "photo.jpg", Some(content_type), data),
    )
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
