use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unsupported extraction mode: {0}")]
    UnsupportedMode(String),
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("cannot resolve reference: {0}")]
    MalformedReference(String),
    #[error("{0}")]
    InvalidUrl(String),
    #[error("URL did not return HTML")]
    NotHtml,
    #[error("Upstream returned HTTP {0}")]
    Upstream(u16),
    #[error("Upstream returned an empty or too short response")]
    EmptyResponse,
    #[error("{0}")]
    Request(String),
    #[error("Parsing timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("An extraction is already in progress")]
    Busy,
    #[error("{0}")]
    BadRequest(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("CSV output failed: {0}")]
    Csv(String),
    #[error("Extraction task failed: {0}")]
    Internal(String),
}

impl From<csv::Error> for ExtractionError {
    fn from(e: csv::Error) -> Self {
        ExtractionError::Csv(e.to_string())
    }
}

impl ExtractionError {
    pub fn status(&self) -> StatusCode {
        match self {
            ExtractionError::UnsupportedMode(_)
            | ExtractionError::UnsupportedFormat(_)
            | ExtractionError::MalformedReference(_)
            | ExtractionError::InvalidUrl(_)
            | ExtractionError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ExtractionError::NotHtml => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractionError::Upstream(_)
            | ExtractionError::EmptyResponse
            | ExtractionError::Request(_) => StatusCode::BAD_GATEWAY,
            ExtractionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ExtractionError::Busy => StatusCode::CONFLICT,
            ExtractionError::Serialize(_)
            | ExtractionError::Csv(_)
            | ExtractionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({"detail": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ExtractionError::UnsupportedFormat("xml".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ExtractionError::Busy.status(), StatusCode::CONFLICT);
        assert_eq!(
            ExtractionError::Timeout(Duration::from_secs(30)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(ExtractionError::Upstream(404).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_timeout_message() {
        let e = ExtractionError::Timeout(Duration::from_secs(30));
        assert_eq!(e.to_string(), "Parsing timed out after 30 seconds");
    }
}
