use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use crate::{
    config::GeminiConfig,
    error::QuizError,
    metrics::{UPSTREAM_REQUESTS_TOTAL, UPSTREAM_RETRIES_TOTAL},
    utils::retry::{retry_async_with_config, RetryConfig},
};

/// Status codes worth another attempt: rate limiting and server-side errors.
pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// A text generation backend. Implementations return the raw response
/// envelope; extracting the generated text is the parser's job.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<Value, QuizError>;

    /// False when required credentials are missing.
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("response body is not JSON: {0}")]
    Decode(String),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        match self {
            AttemptError::Timeout(_) | AttemptError::Network(_) => true,
            AttemptError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            AttemptError::Decode(_) => false,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            AttemptError::Timeout(_) => "timeout",
            AttemptError::Status { .. } => "http_error",
            AttemptError::Network(_) => "network_error",
            AttemptError::Decode(_) => "decode_error",
        }
    }
}

impl From<AttemptError> for QuizError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Timeout(_) => QuizError::Timeout(err.to_string()),
            AttemptError::Status { .. } | AttemptError::Network(_) => {
                QuizError::UpstreamUnavailable(err.to_string())
            }
            AttemptError::Decode(_) => QuizError::MalformedUpstreamResponse(err.to_string()),
        }
    }
}

/// Client for the `generateContent` endpoint of the generative language API.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    endpoint: String,
    retry: RetryConfig,
}

impl GeminiClient {
    pub fn new(http: Client, config: &GeminiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            retry: config.retry_config(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(
        &self,
        api_key: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Value, AttemptError> {
        let payload = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                AttemptError::Timeout(timeout)
            } else {
                AttemptError::Network(err.to_string())
            }
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body);
            return Err(AttemptError::Status {
                status,
                body: body.chars().take(300).collect(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| AttemptError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<Value, QuizError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| QuizError::Misconfigured("GEMINI_API_KEY is not set on backend".into()))?;

        let attempts = AtomicUsize::new(0);
        let result = retry_async_with_config(
            self.retry.clone(),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.send_once(api_key, prompt, timeout)
            },
            AttemptError::is_transient,
        )
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        UPSTREAM_RETRIES_TOTAL.inc_by(attempts.saturating_sub(1) as u64);

        match result {
            Ok(envelope) => {
                UPSTREAM_REQUESTS_TOTAL.with_label_values(&["success"]).inc();
                tracing::debug!(attempts, "Generative API call succeeded");
                Ok(envelope)
            }
            Err(err) => {
                UPSTREAM_REQUESTS_TOTAL
                    .with_label_values(&[err.outcome()])
                    .inc();
                tracing::error!(attempts, "Generative API call failed: {}", err);
                Err(err.into())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
