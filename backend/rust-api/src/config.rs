use serde::Deserialize;
use std::{env, time::Duration};

use crate::utils::retry::RetryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_address: String,
    pub gemini: GeminiConfig,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub questions_collection: String,
    pub quiz_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub quiz_timeout_secs: u64,
    pub explanation_timeout_secs: u64,
    pub max_attempts: usize,
    pub backoff_base_ms: u64,
}

impl GeminiConfig {
    pub fn quiz_timeout(&self) -> Duration {
        Duration::from_secs(self.quiz_timeout_secs)
    }

    pub fn explanation_timeout(&self) -> Duration {
        Duration::from_secs(self.explanation_timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        let base_backoff = Duration::from_millis(self.backoff_base_ms);
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            base_backoff,
            max_backoff: base_backoff * 16,
            jitter_max: Some(base_backoff / 4),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash-latest".to_string(),
            quiz_timeout_secs: 90,
            explanation_timeout_secs: 30,
            max_attempts: 4,
            backoff_base_ms: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8000".to_string(),
            gemini: GeminiConfig::default(),
            mongo_uri: None,
            mongo_database: "jee_quiz".to_string(),
            questions_collection: "questions".to_string(),
            quiz_batch_size: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env_name = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml + ENV overrides (prefix: APP_)
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings)
    }

    fn from_settings(settings: &config::Config) -> Result<Self, config::ConfigError> {
        let defaults = Config::default();
        let gemini_defaults = GeminiConfig::default();

        let gemini = GeminiConfig {
            api_key: lookup(settings, "gemini.api_key", "GEMINI_API_KEY")
                .filter(|key| !key.trim().is_empty()),
            base_url: lookup(settings, "gemini.base_url", "GEMINI_BASE_URL")
                .unwrap_or(gemini_defaults.base_url),
            model: lookup(settings, "gemini.model", "GEMINI_MODEL")
                .unwrap_or(gemini_defaults.model),
            quiz_timeout_secs: lookup_parsed(
                settings,
                "gemini.quiz_timeout_secs",
                "GEMINI_QUIZ_TIMEOUT_SECS",
            )?
            .unwrap_or(gemini_defaults.quiz_timeout_secs),
            explanation_timeout_secs: lookup_parsed(
                settings,
                "gemini.explanation_timeout_secs",
                "GEMINI_EXPLANATION_TIMEOUT_SECS",
            )?
            .unwrap_or(gemini_defaults.explanation_timeout_secs),
            max_attempts: lookup_parsed(settings, "gemini.max_attempts", "GEMINI_MAX_ATTEMPTS")?
                .unwrap_or(gemini_defaults.max_attempts),
            backoff_base_ms: lookup_parsed(
                settings,
                "gemini.backoff_base_ms",
                "GEMINI_BACKOFF_BASE_MS",
            )?
            .unwrap_or(gemini_defaults.backoff_base_ms),
        };

        let mongo_uri = lookup(settings, "database.mongo_uri", "MONGO_URI")
            .filter(|uri| !uri.trim().is_empty());
        if mongo_uri.is_none() {
            tracing::warn!("MONGO_URI is not set, generated questions will not be persisted");
        }

        Ok(Config {
            server_address: lookup(settings, "server.address", "SERVER_ADDRESS")
                .unwrap_or(defaults.server_address),
            gemini,
            mongo_uri,
            mongo_database: lookup(settings, "database.mongo_database", "MONGO_DATABASE")
                .unwrap_or(defaults.mongo_database),
            questions_collection: lookup(
                settings,
                "database.questions_collection",
                "QUESTIONS_COLLECTION",
            )
            .unwrap_or(defaults.questions_collection),
            quiz_batch_size: lookup_parsed(settings, "quiz.batch_size", "QUIZ_BATCH_SIZE")?
                .unwrap_or(defaults.quiz_batch_size)
                .max(1),
        })
    }
}

fn lookup(settings: &config::Config, key: &str, env_var: &str) -> Option<String> {
    settings
        .get_string(key)
        .ok()
        .or_else(|| env::var(env_var).ok())
}

fn lookup_parsed<T>(
    settings: &config::Config,
    key: &str,
    env_var: &str,
) -> Result<Option<T>, config::ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(settings, key, env_var) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            config::ConfigError::Message(format!("Invalid value for {}: {}", key, e))
        }),
        None => Ok(None),
    }
}
