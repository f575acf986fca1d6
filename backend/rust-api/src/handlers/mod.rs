use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod questions;
pub mod solutions;

pub const WELCOME_MESSAGE: &str = "Welcome to the JEE Solver API. The Question Bank is ready!";

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut status = "healthy";
    let mut dependencies = serde_json::Map::new();
    let mut all_healthy = true;

    // Generative API credentials
    let gemini_health = check_gemini(&state);
    dependencies.insert("gemini".to_string(), json!(gemini_health));
    if gemini_health.get("status").and_then(|v| v.as_str()) != Some("healthy") {
        all_healthy = false;
        status = "degraded";
    }

    // Question store; running without one is allowed
    let store_health = check_question_store(&state).await;
    dependencies.insert("question_store".to_string(), json!(store_health));
    if store_health.get("status").and_then(|v| v.as_str()) == Some("unhealthy") {
        all_healthy = false;
        status = "degraded";
    }

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "jee-quiz-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

fn check_gemini(state: &AppState) -> serde_json::Map<String, serde_json::Value> {
    let mut result = serde_json::Map::new();

    if state.generator.is_configured() {
        result.insert("status".to_string(), json!("healthy"));
        result.insert("model".to_string(), json!(state.config.gemini.model));
    } else {
        result.insert("status".to_string(), json!("unhealthy"));
        result.insert("error".to_string(), json!("GEMINI_API_KEY is not set"));
    }

    result
}

async fn check_question_store(state: &AppState) -> serde_json::Map<String, serde_json::Value> {
    let mut result = serde_json::Map::new();

    let Some(store) = state.question_store.as_ref() else {
        result.insert("status".to_string(), json!("disabled"));
        result.insert(
            "message".to_string(),
            json!("No question store configured, persistence is skipped"),
        );
        return result;
    };

    match tokio::time::timeout(std::time::Duration::from_secs(1), store.ping()).await {
        Ok(Ok(())) => {
            result.insert("status".to_string(), json!("healthy"));
            result.insert(
                "message".to_string(),
                json!("Question store connection successful"),
            );
        }
        Ok(Err(e)) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert(
                "error".to_string(),
                json!(format!("Question store error: {:#}", e)),
            );
        }
        Err(_) => {
            result.insert("status".to_string(), json!("unhealthy"));
            result.insert("error".to_string(), json!("Question store timeout after 1s"));
        }
    }

    result
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Protects `/metrics` with HTTP Basic auth checked against `METRICS_AUTH`
/// (`user:password`).
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    if credentials != expected {
        tracing::warn!("Rejected metrics scrape with invalid credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
