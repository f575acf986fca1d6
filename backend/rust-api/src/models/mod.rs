pub mod question;
pub mod quiz;
pub mod solution;

pub use question::{Question, QuizMode, Subject};
