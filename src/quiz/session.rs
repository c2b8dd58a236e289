//! Session State
//!
//! The one mutable entity of a quiz run. Owned by `QuizEngine`; everything
//! outside the engine sees it through [`SessionSnapshot`].

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::quiz::model::Quiz;
use crate::quiz::timer::{Countdown, TimerPhase};

// =============================================================================
// RESPONSE RECORD
// =============================================================================

/// Durable record of how one question was answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Question this answers.
    pub question_index: usize,
    /// Chosen option, `None` if time ran out with nothing selected.
    pub answer: Option<String>,
    /// Whether `answer` matched the correct answer.
    pub correct: bool,
    /// Recorded by the countdown rather than by the player.
    pub forced: bool,
}

impl ResponseRecord {
    /// Record for an explicit or forced submission.
    pub fn new(question_index: usize, answer: Option<String>, correct: bool, forced: bool) -> Self {
        Self {
            question_index,
            answer,
            correct,
            forced,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Mutable run-time state of one quiz attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) current_index: usize,
    pub(crate) selected: Option<String>,
    pub(crate) submitted: bool,
    pub(crate) hint_used: bool,
    pub(crate) eliminated: BTreeSet<String>,
    pub(crate) responses: Vec<ResponseRecord>,
    pub(crate) finished: bool,
}

impl Session {
    /// Fresh session positioned on the first question.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response for the current question.
    ///
    /// Returns true if an earlier record for the same question was replaced.
    pub(crate) fn record(&mut self, record: ResponseRecord) -> bool {
        // Only the current question can be re-recorded, and it is always last
        match self.responses.last_mut() {
            Some(last) if last.question_index == record.question_index => {
                *last = record;
                true
            }
            _ => {
                self.responses.push(record);
                false
            }
        }
    }

    /// Move to `index`, clearing everything scoped to the previous question.
    pub(crate) fn move_to(&mut self, index: usize) {
        self.current_index = index;
        self.selected = None;
        self.submitted = false;
        self.eliminated.clear();
    }

    /// Current question index.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Currently selected option.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether the current answer is locked in.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Whether the session's single hint has been spent.
    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    /// Options eliminated on the current question.
    pub fn eliminated(&self) -> &BTreeSet<String> {
        &self.eliminated
    }

    /// Whether `option` was eliminated on the current question.
    pub fn is_eliminated(&self, option: &str) -> bool {
        self.eliminated.contains(option)
    }

    /// Recorded responses in question order.
    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// Whether the session reached its summary or was abandoned.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Build a render snapshot.
    pub fn snapshot(&self, quiz: &Quiz, timer: &Countdown) -> SessionSnapshot {
        let question = &quiz.questions()[self.current_index];
        let total = quiz.len();

        let options = question
            .options
            .iter()
            .map(|text| OptionView {
                text: text.clone(),
                eliminated: self.eliminated.contains(text),
                selected: self.selected.as_deref() == Some(text.as_str()),
            })
            .collect();

        SessionSnapshot {
            title: quiz.title().to_owned(),
            current_index: self.current_index,
            question_number: self.current_index + 1,
            total_questions: total,
            prompt: question.prompt.clone(),
            options,
            selected_answer: self.selected.clone(),
            submitted: self.submitted,
            hint_used: self.hint_used,
            eliminated_options: self.eliminated.clone(),
            time_left: timer.time_left(),
            timer_phase: timer.phase(),
            is_last_question: self.current_index == quiz.last_index(),
            can_submit: !self.finished && self.selected.is_some() && !self.submitted,
            can_advance: !self.finished && self.submitted,
            can_use_hint: !self.finished && !self.hint_used,
            progress_percent: (((self.current_index + 1) * 100) / total) as u8,
            finished: self.finished,
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One answer choice as the presentation layer should draw it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    /// Option text.
    pub text: String,
    /// Removed by the hint; not selectable.
    pub eliminated: bool,
    /// Currently selected.
    pub selected: bool,
}

/// Read-only view of the session after a mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Quiz title.
    pub title: String,
    /// Zero-based question index.
    pub current_index: usize,
    /// One-based question number for display.
    pub question_number: usize,
    /// Number of questions.
    pub total_questions: usize,
    /// Current question text.
    pub prompt: String,
    /// Current options in display order.
    pub options: Vec<OptionView>,
    /// Selected option, if any.
    pub selected_answer: Option<String>,
    /// Answer locked in for the current question.
    pub submitted: bool,
    /// Session hint spent.
    pub hint_used: bool,
    /// Options eliminated on this question.
    pub eliminated_options: BTreeSet<String>,
    /// Seconds remaining on this question.
    pub time_left: u32,
    /// Countdown phase.
    pub timer_phase: TimerPhase,
    /// Advancing from here finishes the quiz.
    pub is_last_question: bool,
    /// A selection exists and has not been submitted.
    pub can_submit: bool,
    /// The answer is submitted and advance will be accepted.
    pub can_advance: bool,
    /// The hint is still available.
    pub can_use_hint: bool,
    /// Position through the quiz, 1..=100.
    pub progress_percent: u8,
    /// Session reached its summary or was abandoned.
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::model::Question;

    fn quiz() -> Quiz {
        Quiz::new(
            "Capitals",
            vec![
                Question::new("France?", ["Paris", "Rome", "Berlin", "Madrid"], "Paris"),
                Question::new("Italy?", ["Paris", "Rome"], "Rome"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_record_overwrites_same_question() {
        let mut session = Session::new();
        assert!(!session.record(ResponseRecord::new(0, Some("Rome".into()), false, false)));
        assert!(session.record(ResponseRecord::new(0, Some("Paris".into()), true, false)));

        assert_eq!(session.responses().len(), 1);
        assert_eq!(session.responses()[0].answer.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_move_to_clears_question_scope() {
        let mut session = Session::new();
        session.selected = Some("Rome".into());
        session.submitted = true;
        session.hint_used = true;
        session.eliminated.insert("Berlin".into());

        session.move_to(1);

        assert_eq!(session.current_index(), 1);
        assert!(session.selected().is_none());
        assert!(!session.is_submitted());
        assert!(session.eliminated().is_empty());
        // Hint flag is session-scoped
        assert!(session.hint_used());
    }

    #[test]
    fn test_snapshot_flags() {
        let quiz = quiz();
        let mut timer = Countdown::new(30);
        timer.start(0);

        let mut session = Session::new();
        session.selected = Some("Rome".into());
        session.eliminated.insert("Berlin".into());

        let snap = session.snapshot(&quiz, &timer);
        assert_eq!(snap.question_number, 1);
        assert_eq!(snap.total_questions, 2);
        assert_eq!(snap.progress_percent, 50);
        assert!(snap.can_submit);
        assert!(!snap.can_advance);
        assert!(!snap.is_last_question);
        assert_eq!(snap.time_left, 30);
        assert_eq!(snap.timer_phase, TimerPhase::Running);

        let rome = snap.options.iter().find(|o| o.text == "Rome").unwrap();
        assert!(rome.selected);
        let berlin = snap.options.iter().find(|o| o.text == "Berlin").unwrap();
        assert!(berlin.eliminated);
    }
}
