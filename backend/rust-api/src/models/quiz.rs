use serde::{Deserialize, Serialize};
use validator::Validate;

use super::question::Question;

#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub subject: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 50, message = "Subject must be between 1 and 50 characters"))]
    pub subject: String,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Topic must be at most 200 characters"))]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQuizResponse {
    pub questions: Vec<Question>,
    #[serde(rename = "quizTitle")]
    pub quiz_title: String,
    pub message: String,
}

/// Every field is optional so that incomplete payloads still get an answer.
#[derive(Debug, Default, Deserialize)]
pub struct ExplanationRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default, rename = "correctAnswer")]
    pub correct_answer: Option<String>,
    #[serde(default, rename = "userAnswer")]
    pub user_answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressRequest {
    #[serde(rename = "questionId")]
    #[validate(length(min = 1, max = 128, message = "questionId must not be empty"))]
    pub question_id: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    #[serde(rename = "isBookmarked")]
    pub is_bookmarked: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub status: String,
    pub message: String,
}
