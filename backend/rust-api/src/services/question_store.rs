use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime},
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    metrics::{track_db_operation, QUESTIONS_PERSISTED_TOTAL},
    models::{Question, Subject},
    utils::time::bson_now,
};

const SOURCE_AI_GENERATED: &str = "ai-generated";

/// Append-only sink for generated questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Reserves an identifier for a document that has not been written yet.
    fn new_id(&self) -> String;

    /// Writes the question under `question.id`. The document either exists
    /// in full afterwards or not at all.
    async fn write(&self, question: &Question) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

/// Document shape in the `questions` collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub subject: Subject,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: i32,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub hint: String,
    pub explanation: String,
    pub source: String,
    pub created_at: BsonDateTime,
}

impl QuestionDocument {
    pub fn from_question(question: &Question) -> Result<Self> {
        let id = question
            .id
            .clone()
            .context("Question has no identifier assigned")?;

        Ok(Self {
            id,
            subject: question.subject,
            topic: question.topic.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
            answer_index: question.answer_index as i32,
            correct_answer: question.correct_answer.clone(),
            hint: question.hint.clone(),
            explanation: question.explanation.clone(),
            source: SOURCE_AI_GENERATED.to_string(),
            created_at: bson_now(),
        })
    }
}

pub struct MongoQuestionStore {
    collection: Collection<QuestionDocument>,
    database: Database,
}

impl MongoQuestionStore {
    pub fn new(database: Database, collection_name: &str) -> Self {
        Self {
            collection: database.collection(collection_name),
            database,
        }
    }

    /// Connects lazily; the driver only talks to the server on first use.
    pub async fn connect(uri: &str, database: &str, collection_name: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .context("Failed to create MongoDB client")?;
        Ok(Self::new(client.database(database), collection_name))
    }
}

#[async_trait]
impl QuestionStore for MongoQuestionStore {
    fn new_id(&self) -> String {
        ObjectId::new().to_hex()
    }

    async fn write(&self, question: &Question) -> Result<()> {
        let document = QuestionDocument::from_question(question)?;
        let collection_name = self.collection.name().to_string();

        track_db_operation("insert_one", &collection_name, async {
            self.collection
                .insert_one(&document)
                .await
                .context("Failed to insert question document")?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}

/// Upper bound on a single write. An unreachable server would otherwise hold
/// the response for the driver's server-selection timeout.
pub const STORE_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort write of each question. Stored questions get their `id` set.
/// The first failed or timed-out write ends the run, and that question and
/// every later one keep `id: None`. Never fails the caller.
/// Returns the number of questions stored.
pub async fn persist_questions(store: Option<&dyn QuestionStore>, questions: &mut [Question]) -> usize {
    persist_questions_within(store, questions, STORE_WRITE_TIMEOUT).await
}

pub async fn persist_questions_within(
    store: Option<&dyn QuestionStore>,
    questions: &mut [Question],
    write_timeout: Duration,
) -> usize {
    let Some(store) = store else {
        tracing::warn!(
            count = questions.len(),
            "Question store is not configured, skipping persistence"
        );
        return 0;
    };

    tracing::info!("Saving {} questions to the question bank...", questions.len());

    let mut saved = 0;
    for question in questions.iter_mut() {
        question.id = Some(store.new_id());
        let outcome = match tokio::time::timeout(write_timeout, store.write(question)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("write timed out after {:?}", write_timeout)),
        };

        if let Err(err) = outcome {
            question.id = None;
            QUESTIONS_PERSISTED_TOTAL.with_label_values(&["error"]).inc();
            tracing::error!("Could not save question to the question bank: {:#}", err);
            break;
        }
        saved += 1;
        QUESTIONS_PERSISTED_TOTAL.with_label_values(&["success"]).inc();
    }

    if saved == questions.len() {
        tracing::info!("Successfully saved {} questions", saved);
    } else {
        tracing::warn!(
            saved,
            skipped = questions.len() - saved,
            "Question store failed, remaining questions were not saved"
        );
    }
    saved
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use crate::models::question::{DEFAULT_EXPLANATION, DEFAULT_HINT};

    fn sample(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: None,
                subject: Subject::Chemistry,
                topic: "Amines".into(),
                question: format!("Question {}", i),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                answer_index: i % 4,
                correct_answer: ["a", "b", "c", "d"][i % 4].into(),
                hint: DEFAULT_HINT.into(),
                explanation: DEFAULT_EXPLANATION.into(),
            })
            .collect()
    }

    #[tokio::test]
    async fn assigns_ids_to_stored_questions() {
        let store = MemoryStore::default();
        let mut questions = sample(3);

        let saved = persist_questions(Some(&store), &mut questions).await;

        assert_eq!(saved, 3);
        let ids: Vec<_> = questions.iter().map(|q| q.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["q-1", "q-2", "q-3"]);
        assert_eq!(store.written.lock().unwrap()[1].id.as_deref(), Some("q-2"));
    }

    #[tokio::test]
    async fn failed_writes_leave_no_identifier() {
        let store = MemoryStore::failing_after(1);
        let mut questions = sample(3);

        let saved = persist_questions(Some(&store), &mut questions).await;

        assert_eq!(saved, 1);
        assert!(questions[0].id.is_some());
        assert!(questions[1].id.is_none());
        assert!(questions[2].id.is_none());
    }

    #[tokio::test]
    async fn first_failure_stops_further_writes() {
        let store = MemoryStore::failing();
        let mut questions = sample(30);

        let saved = persist_questions(Some(&store), &mut questions).await;

        assert_eq!(saved, 0);
        assert_eq!(store.attempts(), 1);
        assert!(questions.iter().all(|q| q.id.is_none()));
    }

    #[tokio::test]
    async fn stalled_store_is_abandoned_after_timeout() {
        let store = MemoryStore::stalling(Duration::from_secs(30));
        let mut questions = sample(30);

        let started = std::time::Instant::now();
        let saved =
            persist_questions_within(Some(&store), &mut questions, Duration::from_millis(50)).await;

        assert_eq!(saved, 0);
        assert_eq!(store.attempts(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(questions.iter().all(|q| q.id.is_none()));
        assert!(store.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_store_is_skipped() {
        let mut questions = sample(2);
        let saved = persist_questions(None, &mut questions).await;

        assert_eq!(saved, 0);
        assert!(questions.iter().all(|q| q.id.is_none()));
    }

    #[test]
    fn document_requires_identifier() {
        let mut question = sample(1).remove(0);
        assert!(QuestionDocument::from_question(&question).is_err());

        question.id = Some("abc".into());
        let document = QuestionDocument::from_question(&question).unwrap();
        assert_eq!(document.id, "abc");
        assert_eq!(document.source, "ai-generated");
        assert_eq!(document.correct_answer, "a");
    }
}
