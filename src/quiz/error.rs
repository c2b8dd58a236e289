//! Quiz errors.
//!
//! Every variant is a recoverable, user-facing rejection: the engine leaves
//! the session untouched and the caller re-prompts.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::quiz::timer::TimerTag;

/// Errors returned by quiz operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizError {
    /// Option is not part of the current question, or was eliminated by the hint.
    #[error("option {option:?} cannot be selected")]
    InvalidSelection {
        /// The rejected option text.
        option: String,
    },

    /// Submit was called with nothing selected.
    #[error("no option selected")]
    NoSelection,

    /// Advance was called before the current answer was submitted.
    #[error("current answer has not been submitted")]
    NotReady,

    /// The 50/50 hint was already spent in this session.
    #[error("hint already used")]
    HintAlreadyUsed,

    /// No incorrect, unselected option is left to eliminate.
    #[error("no option left to eliminate")]
    NothingToEliminate,

    /// The session reached its summary or was abandoned.
    #[error("session is finished")]
    SessionFinished,

    /// An expiry arrived from a timer that no longer owns the question.
    #[error("stale timer {tag}")]
    StaleTimer {
        /// Tag carried by the expiry.
        tag: TimerTag,
    },

    /// Quiz data does not satisfy the engine's preconditions.
    #[error("malformed quiz: {reason}")]
    MalformedQuiz {
        /// What failed.
        reason: String,
    },
}
