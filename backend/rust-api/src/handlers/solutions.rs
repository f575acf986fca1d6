use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{QuizError, Result},
    extractors::AppJson,
    models::solution::SolveRequest,
    services::{solution_service::SolutionService, AppState},
};

pub async fn solve_text_doubt(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SolveRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| QuizError::invalid_request(format!("Validation error: {}", e)))?;

    let service = SolutionService::from_state(&state);
    Ok(Json(service.solve(&req.query).await?))
}
