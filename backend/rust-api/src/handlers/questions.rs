use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{QuizError, Result},
    extractors::AppJson,
    models::quiz::{
        ExplanationRequest, GenerateQuizRequest, ProgressRequest, ProgressResponse,
        TopicsQuery, TopicsResponse,
    },
    services::{
        explanation_service::ExplanationService, quiz_service::QuizService, syllabus, AppState,
    },
};

/// Syllabus topics for a subject; unknown subjects get an empty list.
pub async fn get_topics(Query(query): Query<TopicsQuery>) -> impl IntoResponse {
    let topics = syllabus::topics_for_name(&query.subject);
    if topics.is_empty() {
        tracing::debug!("No topics for subject '{}'", query.subject);
    }

    Json(TopicsResponse {
        subject: query.subject,
        topics,
    })
}

pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<GenerateQuizRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| QuizError::invalid_request(format!("Validation error: {}", e)))?;

    let service = QuizService::from_state(&state);
    let response = service.generate_quiz(&req).await?;

    tracing::info!(
        count = response.questions.len(),
        title = %response.quiz_title,
        "Quiz generated"
    );
    Ok(Json(response))
}

/// Always answers 200; an unreadable body is treated like one with no fields.
pub async fn generate_explanation(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ExplanationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!("Unreadable explanation request: {}", rejection.body_text());
            ExplanationRequest::default()
        }
    };

    let service = ExplanationService::from_state(&state);
    Json(service.explain(&req).await)
}

/// Acknowledges progress without storing it.
pub async fn record_progress(AppJson(req): AppJson<ProgressRequest>) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| QuizError::invalid_request(format!("Validation error: {}", e)))?;

    tracing::info!(
        question_id = %req.question_id,
        is_correct = req.is_correct,
        is_bookmarked = req.is_bookmarked,
        "Progress received"
    );

    Ok(Json(ProgressResponse {
        status: "success".to_string(),
        message: "Progress recorded (demo mode)".to_string(),
    }))
}
