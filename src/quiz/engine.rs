//! Quiz Progression Engine
//!
//! Owns the session and the countdown, and is the only code that mutates
//! either. Every operation either applies completely or returns a
//! [`QuizError`] with the session left exactly as it was.
//!
//! Nothing in here reads the wall clock. Time arrives as [`QuizEngine::tick`]
//! calls tagged with the timer instance that produced them, so the same
//! sequence of actions always yields the same session (see `replay`).

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::rng::DeterministicRng;
use crate::quiz::error::QuizError;
use crate::quiz::events::QuizEvent;
use crate::quiz::model::{Question, Quiz};
use crate::quiz::session::{ResponseRecord, Session, SessionSnapshot};
use crate::quiz::summary::QuizSummary;
use crate::quiz::timer::{Countdown, TickOutcome, TimerTag, DEFAULT_QUESTION_SECONDS};

/// Options removed by the 50/50 hint.
pub const HINT_ELIMINATIONS: usize = 2;

// =============================================================================
// CONFIG
// =============================================================================

/// How the hint picks which incorrect options to remove.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "seed", rename_all = "snake_case")]
pub enum HintStrategy {
    /// First eligible options in display order.
    #[default]
    InOrder,
    /// Eligible options shuffled by a seeded generator.
    Seeded(u64),
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Countdown budget per question, in seconds. Clamped to at least 1.
    pub seconds_per_question: u32,
    /// Hint elimination order.
    pub hint: HintStrategy,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_QUESTION_SECONDS,
            hint: HintStrategy::InOrder,
        }
    }
}

// =============================================================================
// ACTIONS & TRANSITIONS
// =============================================================================

/// A mutation request. The engine keeps every accepted action so a run can
/// be replayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuizAction {
    /// Select an option on the current question.
    SelectOption {
        /// Option text.
        option: String,
    },
    /// Lock in the current selection.
    SubmitAnswer,
    /// Move past a submitted question.
    Advance,
    /// Spend the session's 50/50 hint.
    UseHint,
    /// One second from the timer instance `tag`.
    Tick {
        /// Timer instance that produced the tick.
        tag: TimerTag,
    },
    /// Expiry delivered directly by the timer instance `tag`.
    ExpireTimer {
        /// Timer instance that expired.
        tag: TimerTag,
    },
}

impl QuizAction {
    /// Convenience constructor for `SelectOption`.
    pub fn select(option: impl Into<String>) -> Self {
        Self::SelectOption { option: option.into() }
    }
}

/// Where the session ended up after an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Same question.
    Stayed,
    /// Moved to the next question; a new timer instance is running.
    Advanced {
        /// New current index.
        index: usize,
        /// Tag of the new timer instance.
        tag: TimerTag,
    },
    /// Final question left; the session is finished.
    Completed(QuizSummary),
}

impl Transition {
    /// Whether the session finished with this transition.
    pub fn is_completed(&self) -> bool {
        matches!(self, Transition::Completed(_))
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Authoritative quiz state machine.
#[derive(Clone, Debug)]
pub struct QuizEngine {
    quiz: Arc<Quiz>,
    config: QuizConfig,
    session: Session,
    timer: Countdown,
    events: Vec<QuizEvent>,
    history: Vec<QuizAction>,
}

impl QuizEngine {
    /// Start a session on the first question with its countdown running.
    pub fn new(quiz: impl Into<Arc<Quiz>>, config: QuizConfig) -> Self {
        let quiz = quiz.into();
        let mut timer = Countdown::new(config.seconds_per_question.max(1));
        let tag = timer.start(0);

        info!(
            "Quiz {:?} started: {} questions, {}s each",
            quiz.title(),
            quiz.len(),
            timer.budget()
        );

        Self {
            quiz,
            config,
            session: Session::new(),
            events: vec![QuizEvent::question_started(tag, timer.time_left())],
            timer,
            history: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Select an option on the current question.
    ///
    /// Selecting after submission re-opens the question: `submitted` is
    /// cleared and the answer must be submitted again before advancing.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `option` is not a choice of the current question
    /// or was eliminated by the hint. `SessionFinished` after the summary.
    pub fn select_option(&mut self, option: &str) -> Result<(), QuizError> {
        self.ensure_active()?;

        if !self.current_question().has_option(option) || self.session.is_eliminated(option) {
            return Err(QuizError::InvalidSelection { option: option.to_owned() });
        }

        let index = self.session.current_index;
        let reopened = self.session.submitted;
        self.session.selected = Some(option.to_owned());
        self.session.submitted = false;

        debug!("Q{}: selected {:?}{}", index, option, if reopened { " (reopened)" } else { "" });
        self.events.push(QuizEvent::option_selected(index, option, reopened));
        self.history.push(QuizAction::select(option));
        Ok(())
    }

    /// Lock in the current selection and record it.
    ///
    /// A second submission for the same question overwrites the first record.
    ///
    /// # Errors
    ///
    /// `NoSelection` if nothing is selected. `SessionFinished` after the summary.
    pub fn submit_answer(&mut self) -> Result<(), QuizError> {
        self.ensure_active()?;

        let answer = self.session.selected.clone().ok_or(QuizError::NoSelection)?;
        let index = self.session.current_index;
        let correct = self.current_question().is_correct(&answer);

        let overwritten = self
            .session
            .record(ResponseRecord::new(index, Some(answer.clone()), correct, false));
        self.session.submitted = true;

        debug!("Q{}: submitted {:?} (correct: {})", index, answer, correct);
        self.events
            .push(QuizEvent::answer_submitted(index, Some(answer), correct, overwritten, false));
        self.history.push(QuizAction::SubmitAnswer);
        Ok(())
    }

    /// Leave a submitted question.
    ///
    /// On the final question this finishes the session and returns the
    /// summary; otherwise the next question starts with a fresh countdown.
    ///
    /// # Errors
    ///
    /// `NotReady` if the current answer is not submitted. `SessionFinished`
    /// after the summary.
    pub fn advance(&mut self) -> Result<Transition, QuizError> {
        self.ensure_active()?;

        if !self.session.submitted {
            return Err(QuizError::NotReady);
        }

        self.history.push(QuizAction::Advance);
        Ok(self.transition())
    }

    /// Spend the session's single 50/50 hint on the current question.
    ///
    /// Removes up to two incorrect options. Never removes the correct answer
    /// or the currently selected option, so an existing selection or record
    /// stays valid. Returns the eliminated options.
    ///
    /// # Errors
    ///
    /// `HintAlreadyUsed` on any call after the first success.
    /// `NothingToEliminate` if no option qualifies; the hint is not spent.
    /// `SessionFinished` after the summary.
    pub fn use_hint(&mut self) -> Result<Vec<String>, QuizError> {
        self.ensure_active()?;

        if self.session.hint_used {
            return Err(QuizError::HintAlreadyUsed);
        }

        let index = self.session.current_index;
        let selected = self.session.selected.as_deref();
        let mut candidates: Vec<&str> = self
            .current_question()
            .incorrect_options()
            .filter(|o| !self.session.is_eliminated(o) && Some(*o) != selected)
            .collect();

        if candidates.is_empty() {
            return Err(QuizError::NothingToEliminate);
        }

        if let HintStrategy::Seeded(seed) = self.config.hint {
            DeterministicRng::for_question(seed, index).shuffle(&mut candidates);
        }

        let eliminated: Vec<String> = candidates
            .into_iter()
            .take(HINT_ELIMINATIONS)
            .map(str::to_owned)
            .collect();

        self.session.eliminated.extend(eliminated.iter().cloned());
        self.session.hint_used = true;

        info!("Q{}: hint eliminated {:?}", index, eliminated);
        self.events.push(QuizEvent::hint_used(index, eliminated.clone()));
        self.history.push(QuizAction::UseHint);
        Ok(eliminated)
    }

    /// Countdown for timer instance `tag` ran out.
    ///
    /// Records the current selection (or no answer, marked incorrect) if the
    /// question was not yet submitted, then moves on exactly like `advance`.
    ///
    /// # Errors
    ///
    /// `StaleTimer` if `tag` no longer owns the current question.
    /// `SessionFinished` after the summary.
    pub fn on_time_expired(&mut self, tag: TimerTag) -> Result<Transition, QuizError> {
        self.ensure_active()?;

        if !self.timer.is_current(tag) {
            return Err(QuizError::StaleTimer { tag });
        }

        self.history.push(QuizAction::ExpireTimer { tag });
        Ok(self.expire(tag))
    }

    /// One second elapsed on timer instance `tag`.
    ///
    /// Returns `None` if the tick was ignored (stale tag, timer not running,
    /// session finished), `Some(Transition::Stayed)` while counting, and the
    /// forced transition on expiry.
    pub fn tick(&mut self, tag: TimerTag) -> Option<Transition> {
        if self.session.finished {
            return None;
        }

        match self.timer.tick(tag) {
            TickOutcome::Ignored => {
                debug!("Ignoring tick from timer {} (current {})", tag, self.timer.tag());
                None
            }
            TickOutcome::Counting { time_left } => {
                if cfg!(feature = "debug-tracing") {
                    debug!("Timer {}: {}s left", tag, time_left);
                }
                self.history.push(QuizAction::Tick { tag });
                Some(Transition::Stayed)
            }
            TickOutcome::Expired => {
                self.history.push(QuizAction::Tick { tag });
                Some(self.expire(tag))
            }
        }
    }

    /// Apply an action through the matching operation.
    ///
    /// # Errors
    ///
    /// Whatever the operation returns. A tick that would be ignored is
    /// reported as `StaleTimer`.
    pub fn apply(&mut self, action: &QuizAction) -> Result<Transition, QuizError> {
        match action {
            QuizAction::SelectOption { option } => {
                self.select_option(option).map(|_| Transition::Stayed)
            }
            QuizAction::SubmitAnswer => self.submit_answer().map(|_| Transition::Stayed),
            QuizAction::Advance => self.advance(),
            QuizAction::UseHint => self.use_hint().map(|_| Transition::Stayed),
            QuizAction::Tick { tag } => {
                self.ensure_active()?;
                self.tick(*tag).ok_or(QuizError::StaleTimer { tag: *tag })
            }
            QuizAction::ExpireTimer { tag } => self.on_time_expired(*tag),
        }
    }

    /// End the session without a summary.
    ///
    /// Returns false if it had already finished.
    pub fn abandon(&mut self) -> bool {
        if self.session.finished {
            return false;
        }

        self.timer.stop();
        self.session.finished = true;
        info!(
            "Quiz {:?} abandoned at question {}",
            self.quiz.title(),
            self.session.current_index
        );
        self.events.push(QuizEvent::new(
            self.session.current_index,
            crate::quiz::events::QuizEventData::Abandoned,
        ));
        true
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_active(&self) -> Result<(), QuizError> {
        if self.session.finished {
            Err(QuizError::SessionFinished)
        } else {
            Ok(())
        }
    }

    fn current_question(&self) -> &Question {
        &self.quiz.questions()[self.session.current_index]
    }

    /// Forced progression. Caller has checked that `tag` is current.
    fn expire(&mut self, tag: TimerTag) -> Transition {
        let index = self.session.current_index;
        self.events.push(QuizEvent::time_expired(tag));

        if !self.session.submitted {
            let answer = self.session.selected.clone();
            let correct = answer
                .as_deref()
                .map(|a| self.current_question().is_correct(a))
                .unwrap_or(false);

            let overwritten = self
                .session
                .record(ResponseRecord::new(index, answer.clone(), correct, true));
            self.session.submitted = true;

            info!("Q{}: time expired, recorded {:?}", index, answer);
            self.events
                .push(QuizEvent::answer_submitted(index, answer, correct, overwritten, true));
        } else {
            info!("Q{}: time expired after submission", index);
        }

        self.transition()
    }

    /// Leave the current question. The old timer instance is always stopped
    /// before a new one starts.
    fn transition(&mut self) -> Transition {
        let index = self.session.current_index;
        self.timer.stop();

        if index == self.quiz.last_index() {
            self.session.finished = true;
            let summary = QuizSummary::new(&self.quiz, &self.session.responses, self.session.hint_used);

            info!(
                "Quiz {:?} completed: {}/{} (digest {})",
                self.quiz.title(),
                summary.score,
                summary.total,
                &summary.digest[..16]
            );
            self.events
                .push(QuizEvent::quiz_completed(index, summary.score, summary.total));
            return Transition::Completed(summary);
        }

        let next = index + 1;
        self.session.move_to(next);
        let tag = self.timer.start(next);

        debug!("Advanced to Q{} with timer {}", next, tag);
        self.events
            .push(QuizEvent::question_started(tag, self.timer.time_left()));
        Transition::Advanced { index: next, tag }
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Render snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(&self.quiz, &self.timer)
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<QuizEvent> {
        std::mem::take(&mut self.events)
    }

    /// Accepted actions in order.
    pub fn history(&self) -> &[QuizAction] {
        &self.history
    }

    /// Session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The quiz being run.
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    /// Engine configuration.
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Tag of the running timer instance.
    pub fn timer_tag(&self) -> TimerTag {
        self.timer.tag()
    }

    /// Countdown state.
    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    /// Current question index.
    pub fn current_index(&self) -> usize {
        self.session.current_index
    }

    /// Seconds left on the current question.
    pub fn time_left(&self) -> u32 {
        self.timer.time_left()
    }

    /// Whether the session is over.
    pub fn is_finished(&self) -> bool {
        self.session.finished
    }
}

// =============================================================================
// TESTS
// =============================================================================
