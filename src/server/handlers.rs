use super::types::{ApiError, HealthResponse, ProcessingQuery, StatusResponse};
use crate::{
    Error,
    pipeline::{RequestPipeline, Upload},
    session::ServiceState,
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RequestPipeline>,
    pub service_state: ServiceState,
    pub started_at: DateTime<Utc>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(pipeline: RequestPipeline, service_state: ServiceState) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            service_state,
            started_at: Utc::now(),
            expose_error_details: true,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    fn error_response(&self, err: Error) -> ApiError {
        let status = err.status_code();
        let detail = if status.is_client_error() {
            err.to_string()
        } else if self.expose_error_details {
            format!("Internal server error: {err}")
        } else {
            "Internal server error".to_string()
        };
        ApiError { status, detail }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.pipeline.session();
    Json(StatusResponse {
        status: "ok".to_string(),
        state: state.service_state,
        model: session.model_name().to_string(),
        unavailable_reason: session.unavailable_reason().map(str::to_string),
        started_at: state.started_at,
    })
}

pub async fn remove_background(
    State(state): State<AppState>,
    query: Result<Query<ProcessingQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let Query(query) = query.map_err(|e| {
        state.error_response(Error::validation(format!(
            "Invalid processing options: {}",
            e.body_text()
        )))
    })?;
    process_upload(&state, &query, multipart)
        .instrument(info_span!("remove_bg", %request_id))
        .await
}

async fn process_upload(
    state: &AppState,
    query: &ProcessingQuery,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| {
        state.error_response(Error::missing_input(format!(
            "Expected multipart form data: {e}"
        )))
    })?;
    let upload = read_upload(multipart)
        .await
        .map_err(|e| state.error_response(e))?;

    let options = query.apply(state.pipeline.defaults());
    match state.pipeline.clone().handle(upload, options).await {
        Ok(png) => {
            info!("Returning {} bytes of image/png", png.len());
            Ok(([(header::CONTENT_TYPE, "image/png")], Body::from(png)).into_response())
        }
        Err(e) => {
            if !e.is_client_error() {
                error!("Unexpected error: {}", e);
            }
            Err(state.error_response(e))
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> crate::Result<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?.to_vec();
        return Ok(Upload {
            filename,
            content_type,
            data,
        });
    }

    Err(Error::missing_input("Field required: file"))
}

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(err.body_text())
    } else {
        Error::validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}
