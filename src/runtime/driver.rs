//! Quiz Driver
//!
//! Runs one `QuizEngine` inside a tokio task and feeds it wall-clock ticks.
//!
//! ```text
//!   QuizHandle ──Command──▶ ┌────────────┐ ──QuizUpdate──▶ subscribers
//!                           │   actor    │
//!   ticker(tag) ──tag─────▶ │ QuizEngine │ ──outcome─────▶ finished()
//!                           └────────────┘
//! ```
//!
//! The actor is the only owner of the engine, so commands and ticks are
//! applied one at a time without locks. Each running question gets its own
//! ticker task; when the engine's timer tag changes the old ticker is aborted
//! and a new one spawned. A tick that was already queued from the old ticker
//! carries the old tag and the engine drops it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::quiz::engine::{QuizAction, QuizConfig, QuizEngine, Transition};
use crate::quiz::error::QuizError;
use crate::quiz::model::Quiz;
use crate::quiz::session::SessionSnapshot;
use crate::quiz::summary::QuizSummary;
use crate::quiz::timer::{TimerPhase, TimerTag};
use crate::runtime::protocol::{QuizCompletion, QuizUpdate};

/// Capacity of the command and tick channels.
const CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// CONFIG & RESULTS
// =============================================================================

/// Async shell configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Wall-clock length of one countdown second.
    pub tick_interval: Duration,
    /// Capacity of the update broadcast.
    pub event_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            event_capacity: 256,
        }
    }
}

/// Result of a mutating call.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Session continues.
    InProgress(SessionSnapshot),
    /// This call finished the session.
    Completed(QuizCompletion),
}

impl Progress {
    /// Snapshot if the session is still running.
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            Progress::InProgress(snapshot) => Some(snapshot),
            Progress::Completed(_) => None,
        }
    }

    /// Whether the session finished.
    pub fn is_completed(&self) -> bool {
        matches!(self, Progress::Completed(_))
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Reached the summary.
    Completed(QuizCompletion),
    /// Abandoned before the summary.
    Abandoned,
}

/// Driver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The engine rejected the command.
    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    /// The actor task is gone.
    #[error("Driver closed")]
    Closed,
}

// =============================================================================
// HANDLE
// =============================================================================

enum Command {
    Apply {
        action: QuizAction,
        reply: oneshot::Sender<Result<Progress, QuizError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    History {
        reply: oneshot::Sender<Vec<QuizAction>>,
    },
    Abandon {
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle to a running driver. The session is abandoned once every
/// handle has been dropped.
#[derive(Clone)]
pub struct QuizHandle {
    session_id: Uuid,
    commands: mpsc::Sender<Command>,
    updates: broadcast::Sender<QuizUpdate>,
    outcome: watch::Receiver<Option<SessionOutcome>>,
}

impl QuizHandle {
    /// Id of this run.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Select an option on the current question.
    pub async fn select_option(&self, option: impl Into<String>) -> Result<Progress, DriverError> {
        self.apply(QuizAction::select(option)).await
    }

    /// Submit the current selection.
    pub async fn submit_answer(&self) -> Result<Progress, DriverError> {
        self.apply(QuizAction::SubmitAnswer).await
    }

    /// Move past a submitted question.
    pub async fn advance(&self) -> Result<Progress, DriverError> {
        self.apply(QuizAction::Advance).await
    }

    /// Spend the 50/50 hint.
    pub async fn use_hint(&self) -> Result<Progress, DriverError> {
        self.apply(QuizAction::UseHint).await
    }

    /// Current session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, DriverError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Accepted actions so far, for replay.
    pub async fn history(&self) -> Result<Vec<QuizAction>, DriverError> {
        self.request(|reply| Command::History { reply }).await
    }

    /// End the session without a summary. Returns false if already finished.
    pub async fn abandon(&self) -> Result<bool, DriverError> {
        self.request(|reply| Command::Abandon { reply }).await
    }

    /// Receive every update published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QuizUpdate> {
        self.updates.subscribe()
    }

    /// Wait until the session completes or is abandoned.
    pub async fn finished(&self) -> Result<SessionOutcome, DriverError> {
        let mut outcome = self.outcome.clone();
        let done = outcome
            .wait_for(Option::is_some)
            .await
            .map_err(|_| DriverError::Closed)?;
        done.clone().ok_or(DriverError::Closed)
    }

    async fn apply(&self, action: QuizAction) -> Result<Progress, DriverError> {
        let result = self.request(|reply| Command::Apply { action, reply }).await?;
        Ok(result?)
    }

    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| DriverError::Closed)?;
        rx.await.map_err(|_| DriverError::Closed)
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// Actor state. Created by [`QuizDriver::spawn`]; only reachable through a
/// [`QuizHandle`].
pub struct QuizDriver {
    engine: QuizEngine,
    config: DriverConfig,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    updates: broadcast::Sender<QuizUpdate>,
    outcome: watch::Sender<Option<SessionOutcome>>,
    tick_tx: mpsc::Sender<TimerTag>,
    ticker: Option<(TimerTag, JoinHandle<()>)>,
}

impl QuizDriver {
    /// Start a session in a new task. Must be called inside a tokio runtime.
    pub fn spawn(
        quiz: impl Into<Arc<Quiz>>,
        quiz_config: QuizConfig,
        config: DriverConfig,
    ) -> QuizHandle {
        let mut engine = QuizEngine::new(quiz, quiz_config);
        // The opening question is visible through snapshot()
        engine.take_events();

        let session_id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (updates, _) = broadcast::channel(config.event_capacity.max(1));
        let (outcome_tx, outcome_rx) = watch::channel(None);

        info!(
            "Session {} spawned (tick every {:?})",
            session_id, config.tick_interval
        );

        let driver = QuizDriver {
            engine,
            config,
            session_id,
            started_at: Utc::now(),
            updates: updates.clone(),
            outcome: outcome_tx,
            tick_tx,
            ticker: None,
        };
        tokio::spawn(driver.run(command_rx, tick_rx));

        QuizHandle {
            session_id,
            commands: command_tx,
            updates,
            outcome: outcome_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut ticks: mpsc::Receiver<TimerTag>,
    ) {
        self.sync_ticker();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        if self.abandon() {
                            warn!("Session {}: all handles dropped, abandoned", self.session_id);
                        }
                        break;
                    }
                },
                Some(tag) = ticks.recv() => self.on_tick(tag),
            }
        }

        self.stop_ticker();
        debug!("Session {} actor stopped", self.session_id);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply { action, reply } => {
                let result = self
                    .engine
                    .apply(&action)
                    .map(|transition| self.publish(transition));
                if let Err(e) = &result {
                    debug!("Session {}: rejected {:?}: {}", self.session_id, action, e);
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            Command::History { reply } => {
                let _ = reply.send(self.engine.history().to_vec());
            }
            Command::Abandon { reply } => {
                let _ = reply.send(self.abandon());
            }
        }
    }

    fn on_tick(&mut self, tag: TimerTag) {
        if let Some(transition) = self.engine.tick(tag) {
            self.publish(transition);
        }
    }

    fn abandon(&mut self) -> bool {
        if !self.engine.abandon() {
            return false;
        }
        self.broadcast_events();
        let _ = self.updates.send(QuizUpdate::Abandoned);
        self.outcome.send_replace(Some(SessionOutcome::Abandoned));
        self.stop_ticker();
        true
    }

    /// Push pending events and the resulting state to subscribers.
    fn publish(&mut self, transition: Transition) -> Progress {
        self.broadcast_events();

        let progress = match transition {
            Transition::Completed(summary) => {
                let completion = self.complete(summary);
                let _ = self.updates.send(QuizUpdate::Completed(completion.clone()));
                Progress::Completed(completion)
            }
            Transition::Stayed | Transition::Advanced { .. } => {
                let snapshot = self.engine.snapshot();
                let _ = self.updates.send(QuizUpdate::Snapshot(snapshot.clone()));
                Progress::InProgress(snapshot)
            }
        };

        self.sync_ticker();
        progress
    }

    fn broadcast_events(&mut self) {
        for event in self.engine.take_events() {
            // No subscribers is fine
            let _ = self.updates.send(QuizUpdate::Event(event));
        }
    }

    fn complete(&mut self, summary: QuizSummary) -> QuizCompletion {
        let completion = QuizCompletion {
            session_id: self.session_id,
            started_at: self.started_at,
            completed_at: Utc::now(),
            summary,
        };

        info!(
            "Session {} completed: {}/{} in {}s",
            self.session_id,
            completion.summary.score,
            completion.summary.total,
            completion.elapsed_secs()
        );
        self.outcome
            .send_replace(Some(SessionOutcome::Completed(completion.clone())));
        completion
    }

    // -------------------------------------------------------------------------
    // Ticker
    // -------------------------------------------------------------------------

    /// Make sure exactly one ticker runs, for the engine's current timer.
    fn sync_ticker(&mut self) {
        let timer = self.engine.timer();
        let wanted = (!self.engine.is_finished() && timer.phase() == TimerPhase::Running)
            .then(|| timer.tag());

        if wanted == self.ticker.as_ref().map(|(tag, _)| *tag) {
            return;
        }

        self.stop_ticker();

        if let Some(tag) = wanted {
            debug!("Session {}: starting ticker {}", self.session_id, tag);
            let handle = spawn_ticker(tag, self.config.tick_interval, self.tick_tx.clone());
            self.ticker = Some((tag, handle));
        }
    }

    fn stop_ticker(&mut self) {
        if let Some((tag, handle)) = self.ticker.take() {
            handle.abort();
            debug!("Session {}: stopped ticker {}", self.session_id, tag);
        }
    }
}

/// Send `tag` once per `period`, starting one period from now.
fn spawn_ticker(tag: TimerTag, period: Duration, tx: mpsc::Sender<TimerTag>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;
            if tx.send(tag).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::model::Question;
    use crate::quiz::session::ResponseRecord;

    fn quiz() -> Quiz {
        Quiz::new(
            "Capitals",
            vec![
                Question::new("Capital of France?", ["Paris", "Rome", "Berlin", "Madrid"], "Paris"),
                Question::new("Capital of Italy?", ["Paris", "Rome", "Berlin"], "Rome"),
            ],
        )
        .unwrap()
    }

    fn spawn(seconds: u32) -> QuizHandle {
        QuizDriver::spawn(
            quiz(),
            QuizConfig {
                seconds_per_question: seconds,
                ..Default::default()
            },
            DriverConfig::default(),
        )
    }

    #[test]
    fn test_driver_config_default() {
        let config = DriverConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.event_capacity, 256);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_both_questions() {
        let handle = spawn(30);

        handle.select_option("Paris").await.unwrap();
        handle.submit_answer().await.unwrap();
        let progress = handle.advance().await.unwrap();
        assert_eq!(progress.snapshot().unwrap().current_index, 1);

        handle.select_option("Berlin").await.unwrap();
        handle.submit_answer().await.unwrap();
        let progress = handle.advance().await.unwrap();

        let completion = match progress {
            Progress::Completed(completion) => completion,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(completion.session_id, handle.session_id());
        assert_eq!(completion.summary.score, 1);
        assert_eq!(completion.summary.responses.len(), 2);

        assert_eq!(
            handle.finished().await.unwrap(),
            SessionOutcome::Completed(completion)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_surfaces_quiz_error() {
        let handle = spawn(30);

        let err = handle.advance().await.unwrap_err();
        assert_eq!(err, DriverError::Quiz(QuizError::NotReady));

        let err = handle.select_option("London").await.unwrap_err();
        assert!(matches!(err, DriverError::Quiz(QuizError::InvalidSelection { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_out_whole_quiz() {
        let handle = spawn(3);

        let outcome = handle.finished().await.unwrap();
        let summary = match outcome {
            SessionOutcome::Completed(completion) => completion.summary,
            other => panic!("expected completion, got {:?}", other),
        };

        assert_eq!(
            summary.responses,
            vec![
                ResponseRecord::new(0, None, false, true),
                ResponseRecord::new(1, None, false, true),
            ]
        );
        assert_eq!(summary.forced_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_reach_snapshot() {
        let handle = spawn(10);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.time_left, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advance_restarts_countdown() {
        let handle = spawn(10);

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        handle.select_option("Paris").await.unwrap();
        handle.submit_answer().await.unwrap();
        handle.advance().await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.time_left, 10);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(handle.snapshot().await.unwrap().time_left, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_events_and_snapshots() {
        let handle = spawn(30);
        let mut updates = handle.subscribe();

        handle.use_hint().await.unwrap();

        match updates.recv().await.unwrap() {
            QuizUpdate::Event(event) => assert_eq!(event.question_index, 0),
            other => panic!("expected event, got {:?}", other),
        }
        match updates.recv().await.unwrap() {
            QuizUpdate::Snapshot(snapshot) => {
                assert!(snapshot.hint_used);
                assert_eq!(snapshot.eliminated_options.len(), 2);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_finishes_session() {
        let handle = spawn(30);

        assert!(handle.abandon().await.unwrap());
        assert!(!handle.abandon().await.unwrap());
        assert_eq!(handle.finished().await.unwrap(), SessionOutcome::Abandoned);

        let err = handle.select_option("Paris").await.unwrap_err();
        assert_eq!(err, DriverError::Quiz(QuizError::SessionFinished));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_replays_to_same_digest() {
        let handle = spawn(2);

        handle.select_option("Rome").await.unwrap();
        handle.submit_answer().await.unwrap();
        handle.advance().await.unwrap();

        let completion = match handle.finished().await.unwrap() {
            SessionOutcome::Completed(completion) => completion,
            other => panic!("expected completion, got {:?}", other),
        };

        let history = handle.history().await.unwrap();
        let replayed = crate::quiz::replay::replay_session(
            quiz(),
            QuizConfig {
                seconds_per_question: 2,
                ..Default::default()
            },
            &history,
        )
        .unwrap();

        assert_eq!(replayed.digest(), completion.summary.digest);
    }
}
