use std::{sync::Arc, time::Duration};

use crate::{
    error::QuizError,
    models::solution::SolveResponse,
    services::{gemini_client::GenerativeModel, prompt, response_parser, AppState},
};

/// Step-by-step answers to free-text doubts.
pub struct SolutionService {
    generator: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl SolutionService {
    pub fn new(generator: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.generator.clone(), state.config.gemini.quiz_timeout())
    }

    pub async fn solve(&self, query: &str) -> Result<SolveResponse, QuizError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QuizError::invalid_request("Query must not be empty"));
        }

        tracing::info!(query_len = query.len(), "Solving text doubt");
        let envelope = self
            .generator
            .generate(&prompt::solution_prompt(query), self.timeout)
            .await?;

        let solution = response_parser::extract_text(&envelope)?.trim();
        if solution.is_empty() {
            return Err(QuizError::malformed("AI returned an empty solution"));
        }

        Ok(SolveResponse {
            original_query: query.to_string(),
            solution: solution.to_string(),
        })
    }
}
