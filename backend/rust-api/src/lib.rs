use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::QuizError;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The browser client is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/questions", question_routes())
        .nest("/api/v1/solutions", solution_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn question_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/topics", get(handlers::questions::get_topics))
        .route("/generate-quiz", post(handlers::questions::generate_quiz))
        .route(
            "/generate-explanation",
            post(handlers::questions::generate_explanation),
        )
        .route("/record-progress", post(handlers::questions::record_progress))
}

fn solution_routes() -> Router<Arc<AppState>> {
    Router::new().route("/solve", post(handlers::solutions::solve_text_doubt))
}
