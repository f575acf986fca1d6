use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, QuizError>;

/// Failure kinds surfaced by the generation pipeline.
///
/// `MalformedUpstreamResponse` is absorbed by the quiz orchestrator at batch
/// level and only reaches callers through endpoints that make a single call.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Service is misconfigured: {0}")]
    Misconfigured(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("AI service timed out: {0}")]
    Timeout(String),

    #[error("AI service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("AI service returned a malformed response: {0}")]
    MalformedUpstreamResponse(String),

    #[error("AI generated malformed data. Please try again.")]
    UnusableUpstreamOutput,
}

impl QuizError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        QuizError::InvalidRequest(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        QuizError::MalformedUpstreamResponse(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QuizError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            QuizError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            QuizError::UpstreamUnavailable(_)
            | QuizError::MalformedUpstreamResponse(_)
            | QuizError::UnusableUpstreamOutput => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::Misconfigured(_) => "misconfigured",
            QuizError::InvalidRequest(_) => "invalid_request",
            QuizError::Timeout(_) => "timeout",
            QuizError::UpstreamUnavailable(_) => "upstream_unavailable",
            QuizError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
            QuizError::UnusableUpstreamOutput => "unusable_upstream_output",
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        } else {
            tracing::warn!(kind = self.kind(), "{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}
