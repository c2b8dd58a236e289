//! Protocol Messages
//!
//! JSON-lines format spoken by the binary: one `ClientCommand` per input
//! line, one `QuizUpdate` per output line.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::quiz::error::QuizError;
use crate::quiz::events::QuizEvent;
use crate::quiz::session::SessionSnapshot;
use crate::quiz::summary::QuizSummary;

// =============================================================================
// CLIENT -> RUNNER
// =============================================================================

/// Commands read from the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Select an option by its text.
    Select {
        /// Option text.
        option: String,
    },
    /// Submit the current selection.
    Submit,
    /// Move to the next question.
    Advance,
    /// Spend the 50/50 hint.
    Hint,
    /// Ask for the current state.
    Snapshot,
    /// Abandon the session and exit.
    Quit,
}

impl ClientCommand {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// RUNNER -> CLIENT
// =============================================================================

/// A finished run, stamped with wall-clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizCompletion {
    /// Random id for this run.
    pub session_id: Uuid,
    /// When the driver started.
    pub started_at: DateTime<Utc>,
    /// When the summary was produced.
    pub completed_at: DateTime<Utc>,
    /// Engine summary.
    pub summary: QuizSummary,
}

impl QuizCompletion {
    /// Wall-clock duration of the run in whole seconds.
    pub fn elapsed_secs(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }
}

/// Messages written to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum QuizUpdate {
    /// State after a mutation or tick.
    Snapshot(SessionSnapshot),

    /// Engine event.
    Event(QuizEvent),

    /// Terminal summary.
    Completed(QuizCompletion),

    /// A command was rejected; state is unchanged.
    Rejected(QuizError),

    /// The session was abandoned.
    Abandoned,
}

impl QuizUpdate {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Whether no further updates will follow for this session.
    pub fn is_final(&self) -> bool {
        matches!(self, QuizUpdate::Completed(_) | QuizUpdate::Abandoned)
    }
}
