use crate::segmentation::ProcessingOptions;
use crate::session::ServiceState;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional query overrides for the configured processing defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessingQuery {
    #[serde(default)]
    pub alpha_matting: Option<bool>,
    #[serde(default)]
    pub foreground_threshold: Option<u8>,
    #[serde(default)]
    pub background_threshold: Option<u8>,
    #[serde(default)]
    pub erode_size: Option<u32>,
}

impl ProcessingQuery {
    pub fn apply(&self, defaults: &ProcessingOptions) -> ProcessingOptions {
        ProcessingOptions {
            alpha_matting: self.alpha_matting.unwrap_or(defaults.alpha_matting),
            foreground_threshold: self
                .foreground_threshold
                .unwrap_or(defaults.foreground_threshold),
            background_threshold: self
                .background_threshold
                .unwrap_or(defaults.background_threshold),
            erode_size: self.erode_size.unwrap_or(defaults.erode_size),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(flatten)]
    pub state: ServiceState,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Error already resolved to what the client will see.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_overrides_only_given_fields() {
        let defaults = ProcessingOptions::default();
        let query = ProcessingQuery {
            alpha_matting: Some(true),
            erode_size: Some(3),
            ..Default::default()
        };

        let options = query.apply(&defaults);

        assert!(options.alpha_matting);
        assert_eq!(options.erode_size, 3);
        assert_eq!(options.foreground_threshold, defaults.foreground_threshold);
        assert_eq!(options.background_threshold, defaults.background_threshold);
    }

    #[test]
    fn test_status_response_shape() {
        let response = StatusResponse {
            status: "ok".to_string(),
            state: ServiceState::Ready {
                model_available: false,
            },
            model: "u2net".to_string(),
            unavailable_reason: None,
            started_at: Utc::now(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["state"], "ready");
        assert_eq!(value["model_available"], false);
        assert_eq!(value["model"], "u2net");
        assert!(value.get("unavailable_reason").is_none());
    }
}
