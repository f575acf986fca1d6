//! Turns a `generateContent` envelope into validated [`Question`]s.
//!
//! Envelope-level problems (missing text, undecodable payload, payload not a
//! list) fail the whole batch with `MalformedUpstreamResponse`. Item-level
//! problems only drop the offending item.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::{collections::HashSet, fmt};

use crate::{
    error::QuizError,
    metrics,
    models::{
        question::{DEFAULT_EXPLANATION, DEFAULT_HINT, MIXED_TOPIC, OPTIONS_PER_QUESTION},
        Question, Subject,
    },
    services::syllabus,
};

const TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

lazy_static! {
    static ref OPENING_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"\r?\n?```\s*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotAnObject,
    MissingQuestion,
    MissingOptions,
    WrongOptionCount,
    InvalidOption,
    DuplicateOptions,
    MissingAnswerIndex,
    InvalidAnswerIndex,
    AnswerIndexOutOfRange,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NotAnObject => "not_an_object",
            DropReason::MissingQuestion => "missing_question",
            DropReason::MissingOptions => "missing_options",
            DropReason::WrongOptionCount => "wrong_option_count",
            DropReason::InvalidOption => "invalid_option",
            DropReason::DuplicateOptions => "duplicate_options",
            DropReason::MissingAnswerIndex => "missing_answer_index",
            DropReason::InvalidAnswerIndex => "invalid_answer_index",
            DropReason::AnswerIndexOutOfRange => "answer_index_out_of_range",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step A: the generated text inside the envelope.
pub fn extract_text(envelope: &Value) -> Result<&str, QuizError> {
    envelope
        .pointer(TEXT_POINTER)
        .and_then(Value::as_str)
        .ok_or_else(|| QuizError::malformed("response has no candidates[0].content.parts[0].text"))
}

/// Step B: removes a surrounding ``` fence and its language tag, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match OPENING_FENCE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    let body = match CLOSING_FENCE.find(body) {
        Some(m) => &body[..m.start()],
        None => body,
    };
    body.trim()
}

/// Step C: decodes the defenced text as a JSON list.
pub fn decode_items(text: &str) -> Result<Vec<Value>, QuizError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(120).collect();
        QuizError::malformed(format!("{} | Response was: {}", e, preview))
    })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(QuizError::malformed(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Step D: validates and reshapes one generated item.
///
/// `requested_topic` is the syllabus topic the batch was constrained to, if any.
pub fn normalize_item(
    item: &Value,
    subject: Subject,
    requested_topic: Option<&str>,
) -> Result<Question, DropReason> {
    let object = item.as_object().ok_or(DropReason::NotAnObject)?;

    let question = object
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(DropReason::MissingQuestion)?;

    let options = parse_options(object.get("options"))?;
    let answer_index = parse_answer_index(object.get("answer_index"))?;

    Ok(Question {
        id: None,
        subject,
        topic: resolve_topic(object, subject, requested_topic),
        question: question.to_string(),
        correct_answer: options[answer_index].clone(),
        options,
        answer_index,
        hint: text_or(object, "hint", DEFAULT_HINT),
        explanation: text_or(object, "explanation", DEFAULT_EXPLANATION),
    })
}

/// Steps A to D for one batch. The result may be shorter than the batch,
/// or empty.
pub fn parse_questions(
    envelope: &Value,
    subject: Subject,
    requested_topic: Option<&str>,
) -> Result<Vec<Question>, QuizError> {
    let text = extract_text(envelope)?;
    let items = decode_items(strip_code_fence(text))?;

    let mut questions = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match normalize_item(item, subject, requested_topic) {
            Ok(question) => questions.push(question),
            Err(reason) => {
                metrics::record_dropped_question(reason.as_str());
                tracing::warn!(position, %reason, "Skipping malformed AI item");
            }
        }
    }

    tracing::debug!(
        received = items.len(),
        accepted = questions.len(),
        "Normalized generated batch"
    );
    Ok(questions)
}

fn parse_options(value: Option<&Value>) -> Result<Vec<String>, DropReason> {
    let raw = value
        .and_then(Value::as_array)
        .ok_or(DropReason::MissingOptions)?;
    if raw.len() != OPTIONS_PER_QUESTION {
        return Err(DropReason::WrongOptionCount);
    }

    let options = raw
        .iter()
        .map(|option| {
            option
                .as_str()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .ok_or(DropReason::InvalidOption)
        })
        .collect::<Result<Vec<String>, DropReason>>()?;

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(DropReason::DuplicateOptions);
    }

    Ok(options)
}

fn parse_answer_index(value: Option<&Value>) -> Result<usize, DropReason> {
    let value = value.ok_or(DropReason::MissingAnswerIndex)?;
    let index = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(DropReason::InvalidAnswerIndex)?;

    if index < 0 || index as usize >= OPTIONS_PER_QUESTION {
        return Err(DropReason::AnswerIndexOutOfRange);
    }
    Ok(index as usize)
}

fn resolve_topic(
    object: &Map<String, Value>,
    subject: Subject,
    requested_topic: Option<&str>,
) -> String {
    object
        .get("topic")
        .and_then(Value::as_str)
        .and_then(|topic| syllabus::canonical_topic(subject, topic))
        .or(requested_topic)
        .unwrap_or(MIXED_TOPIC)
        .to_string()
}

fn text_or(object: &Map<String, Value>, key: &str, default: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Wraps `text` the way `generateContent` returns it.
#[cfg(test)]
pub(crate) fn envelope_with_text(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}
