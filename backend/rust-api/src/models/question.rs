use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QuizError;

pub const OPTIONS_PER_QUESTION: usize = 4;
pub const MIXED_TOPIC: &str = "Mixed";
pub const DEFAULT_HINT: &str = "No hint available.";
pub const DEFAULT_EXPLANATION: &str = "No explanation available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Physics,
    Chemistry,
    Maths,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Maths];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Maths => "Maths",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|subject| subject.as_str() == value)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated multiple-choice question.
///
/// `correct_answer` always equals `options[answer_index]` and `options` always
/// has exactly [`OPTIONS_PER_QUESTION`] entries; the response parser is the
/// only place these are built from upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<String>,
    pub subject: Subject,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub hint: String,
    pub explanation: String,
}

impl Question {
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION
            && self.answer_index < self.options.len()
            && self.options[self.answer_index] == self.correct_answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    Quick,
    Topic,
    Full,
    /// No mode supplied by the caller.
    Default,
}

impl QuizMode {
    pub fn parse(label: Option<&str>) -> Result<Self, QuizError> {
        match label.map(str::trim) {
            None | Some("") => Ok(QuizMode::Default),
            Some("quick") => Ok(QuizMode::Quick),
            Some("topic") => Ok(QuizMode::Topic),
            Some("full") => Ok(QuizMode::Full),
            Some(other) => Err(QuizError::invalid_request(format!(
                "Unknown quiz mode '{}'. Expected one of: quick, topic, full",
                other
            ))),
        }
    }

    pub fn target_count(&self) -> usize {
        match self {
            QuizMode::Quick => 5,
            QuizMode::Full => 30,
            QuizMode::Topic | QuizMode::Default => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Quick => "quick",
            QuizMode::Topic => "topic",
            QuizMode::Full => "full",
            QuizMode::Default => "default",
        }
    }

    /// "Physics - Quick Practice", or "Physics - Practice" without a mode.
    pub fn quiz_title(&self, subject: Subject) -> String {
        match self {
            QuizMode::Default => format!("{} - Practice", subject),
            mode => format!("{} - {} Practice", subject, title_case(mode.as_str())),
        }
    }
}

fn title_case(label: &str) -> String {
    label
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
