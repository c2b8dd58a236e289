//! Session Replay
//!
//! Rebuilds a session from its accepted-action history. Because the engine
//! never reads the wall clock and hints are either ordered or seeded, the
//! replayed session must end with the same responses and digest as the live
//! one.

use std::sync::Arc;

use tracing::warn;

use crate::quiz::engine::{QuizAction, QuizConfig, QuizEngine};
use crate::quiz::error::QuizError;
use crate::quiz::events::QuizEvent;
use crate::quiz::model::Quiz;
use crate::quiz::summary::digest_responses;

/// Outcome of a replay.
#[derive(Debug)]
pub struct ReplayResult {
    /// Engine after the last action.
    pub engine: QuizEngine,
    /// Every event emitted along the way.
    pub events: Vec<QuizEvent>,
}

impl ReplayResult {
    /// Hex digest of the replayed responses.
    pub fn digest(&self) -> String {
        hex::encode(digest_responses(self.engine.quiz(), self.engine.session().responses()))
    }
}

/// Replay `actions` against a fresh engine.
///
/// # Errors
///
/// Fails on the first action the engine rejects; a history taken from a
/// live engine never contains one.
pub fn replay_session(
    quiz: impl Into<Arc<Quiz>>,
    config: QuizConfig,
    actions: &[QuizAction],
) -> Result<ReplayResult, QuizError> {
    let mut engine = QuizEngine::new(quiz, config);
    let mut events = engine.take_events();

    for (step, action) in actions.iter().enumerate() {
        if let Err(e) = engine.apply(action) {
            warn!("Replay rejected step {} ({:?}): {}", step, action, e);
            return Err(e);
        }
        events.extend(engine.take_events());
    }

    Ok(ReplayResult { engine, events })
}

/// Replay a live engine's own history and compare digests.
///
/// Returns true when the replayed responses hash identically.
pub fn verify_replay(engine: &QuizEngine) -> bool {
    let live = hex::encode(digest_responses(engine.quiz(), engine.session().responses()));

    match replay_session(engine.quiz().clone(), engine.config().clone(), engine.history()) {
        Ok(replayed) => replayed.digest() == live,
        Err(_) => false,
    }
}
