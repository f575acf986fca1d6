use std::{sync::Arc, time::Duration};

use crate::{
    error::QuizError,
    metrics::QUIZ_GENERATIONS_TOTAL,
    models::{
        quiz::{GenerateQuizRequest, GenerateQuizResponse},
        Question, QuizMode, Subject,
    },
    services::{
        gemini_client::GenerativeModel,
        prompt,
        question_store::{persist_questions, QuestionStore},
        response_parser, syllabus, AppState,
    },
};

/// Rounds allowed per quiz, as a multiple of the rounds a perfect upstream needs.
const MAX_ROUNDS_FACTOR: usize = 2;

/// A validated generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizPlan {
    pub subject: Subject,
    pub mode: QuizMode,
    /// Syllabus topic the prompt is constrained to.
    pub topic: Option<&'static str>,
}

impl QuizPlan {
    /// Rejects unknown subjects, unknown modes, and topic mode without a
    /// topic from the subject's syllabus. Performs no I/O.
    pub fn from_request(req: &GenerateQuizRequest) -> Result<Self, QuizError> {
        let subject = Subject::parse(&req.subject).ok_or_else(|| {
            QuizError::invalid_request(format!(
                "Unknown subject '{}'. Expected one of: Physics, Chemistry, Maths",
                req.subject
            ))
        })?;
        let mode = QuizMode::parse(req.mode.as_deref())?;
        let requested = req.topic.as_deref().map(str::trim);

        let topic = match mode {
            QuizMode::Topic => {
                let topic = requested
                    .filter(|topic| syllabus::contains_topic(subject, topic))
                    .ok_or_else(|| {
                        QuizError::invalid_request("A valid topic is required for topic-wise mode")
                    })?;
                syllabus::canonical_topic(subject, topic)
            }
            _ => requested.and_then(|topic| syllabus::canonical_topic(subject, topic)),
        };

        Ok(Self {
            subject,
            mode,
            topic,
        })
    }
}

pub struct QuizService {
    generator: Arc<dyn GenerativeModel>,
    store: Option<Arc<dyn QuestionStore>>,
    batch_size: usize,
    timeout: Duration,
}

impl QuizService {
    pub fn new(
        generator: Arc<dyn GenerativeModel>,
        store: Option<Arc<dyn QuestionStore>>,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.generator.clone(),
            state.question_store.clone(),
            state.config.quiz_batch_size,
            state.config.gemini.quiz_timeout(),
        )
    }

    pub async fn generate_quiz(
        &self,
        req: &GenerateQuizRequest,
    ) -> Result<GenerateQuizResponse, QuizError> {
        let plan = QuizPlan::from_request(req)?;
        tracing::info!(
            subject = %plan.subject,
            mode = plan.mode.as_str(),
            topic = plan.topic.unwrap_or("random"),
            "Generating quiz"
        );

        let mut questions = match self.generate_questions(&plan).await {
            Ok(questions) => questions,
            Err(err) => {
                QUIZ_GENERATIONS_TOTAL
                    .with_label_values(&[plan.mode.as_str(), err.kind()])
                    .inc();
                return Err(err);
            }
        };

        let status = if questions.len() == plan.mode.target_count() {
            "success"
        } else {
            "partial"
        };
        QUIZ_GENERATIONS_TOTAL
            .with_label_values(&[plan.mode.as_str(), status])
            .inc();

        persist_questions(self.store.as_deref(), &mut questions).await;

        let message = format!("Generated {} questions for {}.", questions.len(), plan.subject);
        Ok(GenerateQuizResponse {
            questions,
            quiz_title: plan.mode.quiz_title(plan.subject),
            message,
        })
    }

    /// Requests batches until the mode's target is reached.
    ///
    /// A batch that yields nothing while nothing has been accumulated ends the
    /// run with `UnusableUpstreamOutput`. Once some questions exist, empty
    /// batches and upstream failures end the run with what was gathered.
    pub async fn generate_questions(&self, plan: &QuizPlan) -> Result<Vec<Question>, QuizError> {
        let target = plan.mode.target_count();
        let max_rounds = target.div_ceil(self.batch_size) * MAX_ROUNDS_FACTOR;
        let mut accumulated: Vec<Question> = Vec::with_capacity(target);
        let mut round = 0;

        while accumulated.len() < target && round < max_rounds {
            round += 1;
            let need = target - accumulated.len();
            let batch_size = need.min(self.batch_size);

            let fresh = match self.run_batch(plan, batch_size).await {
                Ok(questions) => questions,
                Err(QuizError::MalformedUpstreamResponse(reason)) => {
                    tracing::warn!(round, "Discarding malformed batch: {}", reason);
                    Vec::new()
                }
                Err(err) if !accumulated.is_empty() && !matches!(err, QuizError::Misconfigured(_)) => {
                    tracing::warn!(
                        round,
                        kept = accumulated.len(),
                        "Upstream failed mid-quiz, returning partial result: {}",
                        err
                    );
                    break;
                }
                Err(err) => return Err(err),
            };

            if fresh.is_empty() {
                if accumulated.is_empty() {
                    tracing::error!(round, "Upstream produced no usable questions");
                    return Err(QuizError::UnusableUpstreamOutput);
                }
                tracing::warn!(round, "Batch yielded no valid questions");
                continue;
            }

            tracing::debug!(round, requested = batch_size, received = fresh.len(), "Batch accepted");
            accumulated.extend(fresh.into_iter().take(need));
        }

        if accumulated.is_empty() {
            return Err(QuizError::UnusableUpstreamOutput);
        }
        if accumulated.len() < target {
            tracing::warn!(
                target,
                generated = accumulated.len(),
                "Returning fewer questions than requested"
            );
        }
        Ok(accumulated)
    }

    async fn run_batch(&self, plan: &QuizPlan, batch_size: usize) -> Result<Vec<Question>, QuizError> {
        let prompt = prompt::quiz_prompt(plan.subject, plan.topic, batch_size);
        let envelope = self.generator.generate(&prompt, self.timeout).await?;
        response_parser::parse_questions(&envelope, plan.subject, plan.topic)
    }
}
