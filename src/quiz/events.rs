//! Quiz Events
//!
//! Emitted by the engine on every accepted mutation. Observers (the async
//! driver, logs, tests) drain them with `QuizEngine::take_events`.

use serde::{Serialize, Deserialize};

use crate::quiz::timer::TimerTag;

/// Event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuizEventData {
    /// An option was selected (possibly re-opening a submitted answer).
    OptionSelected {
        option: String,
        reopened: bool,
    },

    /// An answer was recorded.
    AnswerSubmitted {
        answer: Option<String>,
        correct: bool,
        /// True when the record replaced an earlier one for this question.
        overwritten: bool,
        /// True when the countdown recorded it.
        forced: bool,
    },

    /// The 50/50 hint removed options.
    HintUsed {
        eliminated: Vec<String>,
    },

    /// Countdown for the question ran out.
    TimeExpired {
        tag: TimerTag,
    },

    /// A new question became current.
    QuestionStarted {
        tag: TimerTag,
        time_left: u32,
    },

    /// Final question left; summary is available.
    QuizCompleted {
        score: u32,
        total: u32,
    },

    /// Session ended without a summary.
    Abandoned,
}

/// An event stamped with the question it happened on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizEvent {
    /// Question index when the event fired.
    pub question_index: usize,

    /// Event data.
    #[serde(flatten)]
    pub data: QuizEventData,
}

impl QuizEvent {
    /// Create a new event.
    pub fn new(question_index: usize, data: QuizEventData) -> Self {
        Self { question_index, data }
    }

    /// Create option selected event.
    pub fn option_selected(question_index: usize, option: &str, reopened: bool) -> Self {
        Self::new(
            question_index,
            QuizEventData::OptionSelected {
                option: option.to_owned(),
                reopened,
            },
        )
    }

    /// Create answer submitted event.
    pub fn answer_submitted(
        question_index: usize,
        answer: Option<String>,
        correct: bool,
        overwritten: bool,
        forced: bool,
    ) -> Self {
        Self::new(
            question_index,
            QuizEventData::AnswerSubmitted {
                answer,
                correct,
                overwritten,
                forced,
            },
        )
    }

    /// Create hint used event.
    pub fn hint_used(question_index: usize, eliminated: Vec<String>) -> Self {
        Self::new(question_index, QuizEventData::HintUsed { eliminated })
    }

    /// Create time expired event.
    pub fn time_expired(tag: TimerTag) -> Self {
        Self::new(tag.question_index, QuizEventData::TimeExpired { tag })
    }

    /// Create question started event.
    pub fn question_started(tag: TimerTag, time_left: u32) -> Self {
        Self::new(tag.question_index, QuizEventData::QuestionStarted { tag, time_left })
    }

    /// Create quiz completed event.
    pub fn quiz_completed(question_index: usize, score: u32, total: u32) -> Self {
        Self::new(question_index, QuizEventData::QuizCompleted { score, total })
    }

    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.data,
            QuizEventData::QuizCompleted { .. } | QuizEventData::Abandoned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = QuizEvent::answer_submitted(0, None, false, false, true);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["question_index"], 0);
        assert_eq!(json["type"], "answer_submitted");
        assert!(json["answer"].is_null());
        assert_eq!(json["forced"], true);
    }

    #[test]
    fn test_terminal_events() {
        assert!(QuizEvent::quiz_completed(1, 1, 2).is_terminal());
        assert!(QuizEvent::new(0, QuizEventData::Abandoned).is_terminal());
        assert!(!QuizEvent::hint_used(0, vec!["Rome".into()]).is_terminal());
    }
}
