#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jee_quiz_api::{
    config::Config,
    create_router,
    models::Question,
    services::{gemini_client::GenerativeModel, question_store::QuestionStore, AppState},
    QuizError,
};
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tower::ServiceExt;

/// What the fake model answers on every call.
#[derive(Clone)]
pub enum Behavior {
    /// As many valid questions as the prompt asks for.
    Valid,
    /// Returns `text` as the generated content.
    Text(String),
    Timeout,
    Unavailable,
    Unconfigured,
}

pub struct FakeModel {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeModel {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(&self, prompt: &str, _timeout: Duration) -> Result<Value, QuizError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Valid => Ok(envelope(&valid_items(requested_count(prompt)).to_string())),
            Behavior::Text(text) => Ok(envelope(text)),
            Behavior::Timeout => Err(QuizError::Timeout("request timed out after 90s".into())),
            Behavior::Unavailable => Err(QuizError::UpstreamUnavailable(
                "upstream returned 503 Service Unavailable".into(),
            )),
            Behavior::Unconfigured => Err(QuizError::Misconfigured(
                "GEMINI_API_KEY is not set on backend".into(),
            )),
        }
    }

    fn is_configured(&self) -> bool {
        !matches!(self.behavior, Behavior::Unconfigured)
    }
}

/// In-memory question store. `fail_writes` makes every write fail;
/// `fail_ping` makes health checks report it as down.
#[derive(Default)]
pub struct FakeStore {
    pub written: Mutex<Vec<Question>>,
    pub fail_writes: bool,
    pub fail_ping: bool,
    write_delay: Option<Duration>,
    write_attempts: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            fail_ping: true,
            ..Self::default()
        }
    }

    /// Every write waits `delay` and then fails.
    pub fn slow_and_failing(delay: Duration) -> Self {
        Self {
            write_delay: Some(delay),
            ..Self::failing()
        }
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionStore for FakeStore {
    fn new_id(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn write(&self, question: &Question) -> anyhow::Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes {
            anyhow::bail!("simulated store outage");
        }
        self.written.lock().unwrap().push(question.clone());
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        if self.fail_ping {
            anyhow::bail!("simulated store outage");
        }
        Ok(())
    }
}

pub fn envelope(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}

/// Reads the batch size back out of the quiz prompt.
fn requested_count(prompt: &str) -> usize {
    prompt
        .split("generate ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

pub fn valid_items(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                json!({
                    "question": format!("A body starts from rest. Question {}?", i),
                    "options": ["1 m/s", "2 m/s", "3 m/s", "4 m/s"],
                    "answer_index": i % 4,
                    "hint": "Use v = u + at.",
                    "explanation": "Apply the first equation of motion.",
                    "topic": "kinematics"
                })
            })
            .collect(),
    )
}

pub fn create_test_app(
    model: Arc<FakeModel>,
    store: Option<Arc<dyn QuestionStore>>,
) -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let state = AppState::with_parts(Config::default(), model, store);
    create_router(Arc::new(state))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}
