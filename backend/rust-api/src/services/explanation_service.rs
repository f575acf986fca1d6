use std::{sync::Arc, time::Duration};

use crate::{
    metrics::EXPLANATIONS_TOTAL,
    models::quiz::{ExplanationRequest, ExplanationResponse},
    services::{gemini_client::GenerativeModel, prompt, response_parser, AppState},
};

pub const MISSING_DATA_MESSAGE: &str = "Missing required question data.";
pub const UNAVAILABLE_MESSAGE: &str = "Explanation not available at the moment.";

fn generic_explanation(correct_answer: &str) -> String {
    format!(
        "Correct answer: {}. This question tests important concepts for JEE Mains. \
         Review the related topic for better understanding.",
        correct_answer
    )
}

/// Produces explanations for answered questions. Every path yields a string;
/// failures degrade to fixed placeholder text.
pub struct ExplanationService {
    generator: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl ExplanationService {
    pub fn new(generator: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.generator.clone(), state.config.gemini.explanation_timeout())
    }

    pub async fn explain(&self, req: &ExplanationRequest) -> ExplanationResponse {
        let explanation = self.explanation_text(req).await;
        ExplanationResponse { explanation }
    }

    async fn explanation_text(&self, req: &ExplanationRequest) -> String {
        let question = non_blank(req.question.as_deref());
        let correct_answer = non_blank(req.correct_answer.as_deref());
        let options = req.options.as_deref().filter(|options| !options.is_empty());

        let (Some(question), Some(options), Some(correct_answer)) = (question, options, correct_answer)
        else {
            tracing::warn!("Explanation requested without question, options or correct answer");
            EXPLANATIONS_TOTAL.with_label_values(&["missing_fields"]).inc();
            return MISSING_DATA_MESSAGE.to_string();
        };

        let prompt =
            prompt::explanation_prompt(question, options, correct_answer, req.user_answer.as_deref());

        let envelope = match self.generator.generate(&prompt, self.timeout).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(kind = err.kind(), "Explanation generation failed: {}", err);
                EXPLANATIONS_TOTAL.with_label_values(&["upstream_error"]).inc();
                return UNAVAILABLE_MESSAGE.to_string();
            }
        };

        match response_parser::extract_text(&envelope).map(str::trim) {
            Ok(text) if !text.is_empty() => {
                EXPLANATIONS_TOTAL.with_label_values(&["generated"]).inc();
                text.to_string()
            }
            Ok(_) => {
                tracing::warn!("Upstream returned an empty explanation");
                EXPLANATIONS_TOTAL.with_label_values(&["empty"]).inc();
                generic_explanation(correct_answer)
            }
            Err(err) => {
                tracing::error!("Unexpected explanation response shape: {}", err);
                EXPLANATIONS_TOTAL.with_label_values(&["upstream_error"]).inc();
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
