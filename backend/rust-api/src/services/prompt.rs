use crate::models::{question::OPTIONS_PER_QUESTION, Subject};

/// Builds the quiz generation instruction. `topic` of `None` or "random"
/// means questions may come from the whole syllabus.
pub fn quiz_prompt(subject: Subject, topic: Option<&str>, count: usize) -> String {
    let topic_line = match topic.map(str::trim) {
        Some(topic) if !topic.is_empty() && !topic.eq_ignore_ascii_case("random") => {
            format!(" on the specific topic of '{}'", topic)
        }
        _ => " covering various important topics from the entire syllabus".to_string(),
    };

    format!(
        "You are an expert question creator for the Indian JEE Mains engineering entrance exam.\n\
         Your primary directive is to generate {count} new, completely original, high-quality multiple-choice questions (MCQs).\n\
         \n\
         **Strict Instructions:**\n\
         1.  **Syllabus Adherence:** The questions MUST strictly adhere to the latest official NTA syllabus for JEE Mains for the subject '{subject}'.\n\
         2.  **Uniqueness:** Each question must be unique.\n\
         3.  **Format:** Provide the output ONLY in a valid JSON array format. Do not add any text, comments, or markdown formatting like ```json.\n\
         4.  **JSON Structure:** Each object in the array must have these exact keys: \"question\", \"options\" (an array of {options} distinct strings), \"answer_index\" (a number from 0 to {last}), \"hint\", \"explanation\", and \"topic\".\n\
         \n\
         Generate a JSON array of exactly {count} questions for {subject}{topic_line} now.",
        count = count,
        subject = subject,
        options = OPTIONS_PER_QUESTION,
        last = OPTIONS_PER_QUESTION - 1,
        topic_line = topic_line,
    )
}

pub fn explanation_prompt(
    question: &str,
    options: &[String],
    correct_answer: &str,
    user_answer: Option<&str>,
) -> String {
    let numbered = options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n");
    let user_answer = user_answer
        .map(str::trim)
        .filter(|answer| !answer.is_empty())
        .unwrap_or("No answer provided");

    format!(
        "Explain why the correct answer is \"{correct_answer}\" for this question:\n\
         \n\
         Question: {question}\n\
         \n\
         Options:\n\
         {numbered}\n\
         \n\
         The user answered: \"{user_answer}\"\n\
         \n\
         Provide a detailed, educational explanation suitable for JEE Mains preparation.\n\
         Explain the concept, why the correct answer is right, and why the user's answer (if wrong) is incorrect."
    )
}

pub fn solution_prompt(query: &str) -> String {
    format!(
        "Act as an expert JEE Mains & Advanced tutor.\n\
         Provide a clear, step-by-step solution for the following problem.\n\
         Explain the concepts and formulas used.\n\
         \n\
         Problem: \"{}\"\n\
         \n\
         Solution:",
        query.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_prompt_embeds_format_contract() {
        let prompt = quiz_prompt(Subject::Physics, Some("Optics"), 7);

        assert!(prompt.contains("generate 7 new"));
        assert!(prompt.contains("exactly 7 questions for Physics on the specific topic of 'Optics'"));
        assert!(prompt.contains("\"answer_index\" (a number from 0 to 3)"));
        assert!(prompt.contains("an array of 4 distinct strings"));
        assert!(prompt.contains("ONLY in a valid JSON array"));
    }

    #[test]
    fn random_or_missing_topic_is_unconstrained() {
        for topic in [None, Some("random"), Some("  ")] {
            let prompt = quiz_prompt(Subject::Maths, topic, 5);
            assert!(prompt.contains("covering various important topics from the entire syllabus"));
            assert!(!prompt.contains("specific topic"));
        }
    }

    #[test]
    fn quiz_prompt_is_deterministic() {
        assert_eq!(
            quiz_prompt(Subject::Chemistry, Some("Amines"), 10),
            quiz_prompt(Subject::Chemistry, Some("Amines"), 10)
        );
    }

    #[test]
    fn explanation_prompt_numbers_options() {
        let options = vec!["1 m".to_string(), "2 m".to_string()];
        let prompt = explanation_prompt("How far?", &options, "2 m", None);

        assert!(prompt.contains("1. 1 m\n2. 2 m"));
        assert!(prompt.contains("The user answered: \"No answer provided\""));
        assert!(prompt.contains("correct answer is \"2 m\""));
    }
}
