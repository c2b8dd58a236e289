//! Quiz Summary
//!
//! Payload of the terminal "quiz complete" signal.

use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_run_digest, RunDigest};
use crate::quiz::model::Quiz;
use crate::quiz::session::ResponseRecord;

/// Final result of a quiz run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    /// Quiz title.
    pub title: String,
    /// One record per question, in order.
    pub responses: Vec<ResponseRecord>,
    /// Number of correct responses.
    pub score: u32,
    /// Number of questions.
    pub total: u32,
    /// Whether the 50/50 hint was spent.
    pub hint_used: bool,
    /// Responses recorded by the countdown.
    pub forced_count: u32,
    /// Hex SHA-256 over title and responses.
    pub digest: String,
}

impl QuizSummary {
    /// Build the summary for a finished run.
    pub fn new(quiz: &Quiz, responses: &[ResponseRecord], hint_used: bool) -> Self {
        let score = responses.iter().filter(|r| r.correct).count() as u32;
        let forced_count = responses.iter().filter(|r| r.forced).count() as u32;

        Self {
            title: quiz.title().to_owned(),
            responses: responses.to_vec(),
            score,
            total: quiz.len() as u32,
            hint_used,
            forced_count,
            digest: hex::encode(digest_responses(quiz, responses)),
        }
    }

    /// Score as a percentage of the question count.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total)
    }

    /// Whether every question was answered correctly.
    pub fn is_perfect(&self) -> bool {
        self.score == self.total
    }
}

/// Digest of the recorded responses for `quiz`.
pub fn digest_responses(quiz: &Quiz, responses: &[ResponseRecord]) -> RunDigest {
    compute_run_digest(quiz.title(), quiz.len(), |hasher| {
        for record in responses {
            hasher.update_u64(record.question_index as u64);
            hasher.update_opt_str(record.answer.as_deref());
            hasher.update_bool(record.correct);
            hasher.update_bool(record.forced);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::model::Question;

    fn quiz() -> Quiz {
        Quiz::new(
            "Capitals",
            vec![
                Question::new("France?", ["Paris", "Rome"], "Paris"),
                Question::new("Italy?", ["Paris", "Rome"], "Rome"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_score_counts_correct() {
        let responses = vec![
            ResponseRecord::new(0, Some("Paris".into()), true, false),
            ResponseRecord::new(1, None, false, true),
        ];
        let summary = QuizSummary::new(&quiz(), &responses, false);

        assert_eq!(summary.score, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.forced_count, 1);
        assert_eq!(summary.percentage(), 50.0);
        assert!(!summary.is_perfect());
        assert_eq!(summary.digest.len(), 64);
    }

    #[test]
    fn test_digest_tracks_answers() {
        let a = vec![ResponseRecord::new(0, Some("Paris".into()), true, false)];
        let b = vec![ResponseRecord::new(0, Some("Rome".into()), false, false)];

        assert_eq!(digest_responses(&quiz(), &a), digest_responses(&quiz(), &a));
        assert_ne!(digest_responses(&quiz(), &a), digest_responses(&quiz(), &b));
    }
}
