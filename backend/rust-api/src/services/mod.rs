use std::sync::Arc;

use crate::config::Config;

use gemini_client::{GeminiClient, GenerativeModel};
use question_store::{MongoQuestionStore, QuestionStore};

pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn GenerativeModel>,
    /// `None` when no document store is configured; persistence is skipped.
    pub question_store: Option<Arc<dyn QuestionStore>>,
}

impl AppState {
    /// Builds the production clients from configuration. The HTTP client is
    /// created once here and shared by every request.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("jee-quiz-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let generator = GeminiClient::new(http, &config.gemini);
        if generator.is_configured() {
            tracing::info!("Generative API client ready: {}", generator.endpoint());
        } else {
            tracing::warn!("GEMINI_API_KEY is not set, generation endpoints will fail");
        }

        let question_store: Option<Arc<dyn QuestionStore>> = match config.mongo_uri.as_deref() {
            Some(uri) => {
                tracing::info!("Attempting to connect to MongoDB...");
                let store = MongoQuestionStore::connect(
                    uri,
                    &config.mongo_database,
                    &config.questions_collection,
                )
                .await?;
                tracing::info!(
                    database = %config.mongo_database,
                    collection = %config.questions_collection,
                    "Question store configured"
                );
                Some(Arc::new(store))
            }
            None => None,
        };

        Ok(Self::with_parts(config, Arc::new(generator), question_store))
    }

    pub fn with_parts(
        config: Config,
        generator: Arc<dyn GenerativeModel>,
        question_store: Option<Arc<dyn QuestionStore>>,
    ) -> Self {
        Self {
            config,
            generator,
            question_store,
        }
    }
}

pub mod explanation_service;
pub mod gemini_client;
pub mod prompt;
pub mod question_store;
pub mod quiz_service;
pub mod response_parser;
pub mod solution_service;
pub mod syllabus;
