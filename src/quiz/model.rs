//! Quiz Data
//!
//! Immutable question set supplied by the caller. The engine only ever
//! borrows it.
//!
//! JSON shape:
//!
//! ```json
//! {
//!   "title": "Capitals",
//!   "questions": [
//!     {
//!       "question": "Capital of France?",
//!       "options": ["Paris", "Rome", "Berlin", "Madrid"],
//!       "correctAnswer": "Paris",
//!       "explanation": "Paris has been the capital since 987."
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::quiz::error::QuizError;

/// A single multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the player.
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,

    /// Answer choices in display order.
    pub options: Vec<String>,

    /// Must equal one entry of `options`.
    #[serde(rename = "correctAnswer", alias = "correct_answer")]
    pub correct_answer: String,

    /// Shown after the quiz; never read by the engine.
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Create a question.
    pub fn new<P, O, S, C>(prompt: P, options: O, correct_answer: C) -> Self
    where
        P: Into<String>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
            explanation: String::new(),
        }
    }

    /// Attach an explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Whether `option` is the correct answer.
    #[inline]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    /// Whether `option` is one of this question's choices.
    #[inline]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Incorrect options in display order.
    pub fn incorrect_options(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .map(String::as_str)
            .filter(move |o| *o != self.correct_answer)
    }

    fn check(&self, index: usize) -> Result<(), QuizError> {
        if self.options.len() < 2 {
            return Err(malformed(format!(
                "question {} has {} option(s), need at least 2",
                index,
                self.options.len()
            )));
        }

        let distinct: BTreeSet<&str> = self.options.iter().map(String::as_str).collect();
        if distinct.len() != self.options.len() {
            return Err(malformed(format!("question {} has duplicate options", index)));
        }

        if !self.has_option(&self.correct_answer) {
            return Err(malformed(format!(
                "question {} correct answer {:?} is not an option",
                index, self.correct_answer
            )));
        }

        Ok(())
    }
}

fn malformed(reason: String) -> QuizError {
    QuizError::MalformedQuiz { reason }
}

/// Wire form used before the structural checks run.
#[derive(Deserialize)]
struct RawQuiz {
    title: String,
    questions: Vec<Question>,
}

/// An ordered, non-empty question set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuiz")]
pub struct Quiz {
    title: String,
    questions: Vec<Question>,
}

impl TryFrom<RawQuiz> for Quiz {
    type Error = QuizError;

    fn try_from(raw: RawQuiz) -> Result<Self, Self::Error> {
        Quiz::new(raw.title, raw.questions)
    }
}

impl Quiz {
    /// Create a quiz, checking the preconditions the engine depends on.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MalformedQuiz` if there are no questions, or a
    /// question has fewer than two options, duplicate options, or a correct
    /// answer that is not among its options.
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(malformed("quiz has no questions".into()));
        }
        for (index, question) in questions.iter().enumerate() {
            question.check(index)?;
        }

        Ok(Self {
            title: title.into(),
            questions,
        })
    }

    /// Parse a quiz from JSON.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MalformedQuiz` on invalid JSON or failed checks.
    pub fn from_json(json: &str) -> Result<Self, QuizError> {
        serde_json::from_str(json).map_err(|e| malformed(e.to_string()))
    }

    /// Quiz title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All questions in order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question at `index`.
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions (always at least one).
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Index of the final question.
    pub fn last_index(&self) -> usize {
        self.questions.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question::new("Capital of France?", ["Paris", "Rome", "Berlin", "Madrid"], "Paris")
    }

    #[test]
    fn test_new_accepts_valid_quiz() {
        let quiz = Quiz::new("Capitals", vec![capital()]).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.last_index(), 0);
        assert_eq!(quiz.title(), "Capitals");
    }

    #[test]
    fn test_rejects_empty_quiz() {
        let err = Quiz::new("Empty", vec![]).unwrap_err();
        assert!(matches!(err, QuizError::MalformedQuiz { .. }));
    }

    #[test]
    fn test_rejects_single_option() {
        let q = Question::new("Only one?", ["Yes"], "Yes");
        assert!(Quiz::new("Bad", vec![q]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_options() {
        let q = Question::new("Dupes?", ["A", "A", "B"], "B");
        assert!(Quiz::new("Bad", vec![q]).is_err());
    }

    #[test]
    fn test_rejects_missing_correct_answer() {
        let q = Question::new("Where?", ["A", "B"], "C");
        assert!(Quiz::new("Bad", vec![q]).is_err());
    }

    #[test]
    fn test_incorrect_options_in_order() {
        let q = capital();
        let wrong: Vec<&str> = q.incorrect_options().collect();
        assert_eq!(wrong, vec!["Rome", "Berlin", "Madrid"]);
    }

    #[test]
    fn test_from_json_uses_original_field_names() {
        let json = r#"{
            "title": "Capitals",
            "questions": [{
                "question": "Capital of France?",
                "options": ["Paris", "Rome"],
                "correctAnswer": "Paris",
                "explanation": "It just is."
            }]
        }"#;

        let quiz = Quiz::from_json(json).unwrap();
        let q = quiz.question(0).unwrap();
        assert_eq!(q.prompt, "Capital of France?");
        assert_eq!(q.correct_answer, "Paris");
        assert_eq!(q.explanation, "It just is.");
    }

    #[test]
    fn test_from_json_runs_checks() {
        let json = r#"{"title": "Bad", "questions": []}"#;
        assert!(matches!(Quiz::from_json(json), Err(QuizError::MalformedQuiz { .. })));
    }
}
