//! Countdown Timer
//!
//! Per-question countdown as an explicit state machine:
//!
//! ```text
//!   Idle ──start──▶ Running ──tick×budget──▶ Expired
//!    ▲                 │                        │
//!    └──────stop───────┴────────start───────────┘
//! ```
//!
//! Every `start` issues a new [`TimerTag`]. Ticks carry the tag of the timer
//! instance that produced them, and a tick whose tag is not the current one
//! is ignored. That is what keeps a tick queued before an advance from
//! landing on the next question.

use std::fmt;

use serde::{Serialize, Deserialize};

/// Default seconds allowed per question.
pub const DEFAULT_QUESTION_SECONDS: u32 = 30;

/// Identity of one timer instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerTag {
    /// Question the timer was started for.
    pub question_index: usize,
    /// Strictly increasing per start within a session.
    pub generation: u64,
}

impl fmt::Display for TimerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}#{}", self.question_index, self.generation)
    }
}

/// Timer phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Not counting.
    #[default]
    Idle,
    /// Counting down for the current question.
    Running,
    /// Reached zero; waits for the next start.
    Expired,
}

/// Result of delivering one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale tag or timer not running.
    Ignored,
    /// Still running.
    Counting {
        /// Seconds left after this tick.
        time_left: u32,
    },
    /// This tick took the timer to zero. Reported once per start.
    Expired,
}

/// Countdown bound to the active question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Countdown {
    budget: u32,
    time_left: u32,
    phase: TimerPhase,
    tag: TimerTag,
    next_generation: u64,
}

impl Countdown {
    /// Create an idle countdown with the given per-question budget.
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            time_left: budget,
            phase: TimerPhase::Idle,
            tag: TimerTag::default(),
            next_generation: 1,
        }
    }

    /// Start (or restart) for a question. Any previous instance is discarded.
    pub fn start(&mut self, question_index: usize) -> TimerTag {
        self.tag = TimerTag {
            question_index,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.time_left = self.budget;
        self.phase = TimerPhase::Running;
        self.tag
    }

    /// Stop counting. Later ticks for the current tag are ignored.
    pub fn stop(&mut self) {
        self.phase = TimerPhase::Idle;
    }

    /// Deliver one tick from the instance identified by `tag`.
    pub fn tick(&mut self, tag: TimerTag) -> TickOutcome {
        if self.phase != TimerPhase::Running || tag != self.tag {
            return TickOutcome::Ignored;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.phase = TimerPhase::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Counting {
                time_left: self.time_left,
            }
        }
    }

    /// Whether `tag` identifies the current instance.
    #[inline]
    pub fn is_current(&self, tag: TimerTag) -> bool {
        self.tag == tag
    }

    /// Tag of the current instance.
    pub fn tag(&self) -> TimerTag {
        self.tag
    }

    /// Current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Seconds remaining.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Seconds each question starts with.
    pub fn budget(&self) -> u32 {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let timer = Countdown::new(3);
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.time_left(), 3);
    }

    #[test]
    fn test_counts_down_and_expires_once() {
        let mut timer = Countdown::new(3);
        let tag = timer.start(0);

        assert_eq!(timer.tick(tag), TickOutcome::Counting { time_left: 2 });
        assert_eq!(timer.tick(tag), TickOutcome::Counting { time_left: 1 });
        assert_eq!(timer.tick(tag), TickOutcome::Expired);
        assert_eq!(timer.phase(), TimerPhase::Expired);

        // Stops ticking after expiry
        assert_eq!(timer.tick(tag), TickOutcome::Ignored);
        assert_eq!(timer.time_left(), 0);
    }

    #[test]
    fn test_restart_discards_previous_instance() {
        let mut timer = Countdown::new(5);
        let first = timer.start(0);
        timer.tick(first);

        let second = timer.start(1);
        assert_ne!(first, second);
        assert!(second.generation > first.generation);
        assert_eq!(timer.time_left(), 5);

        // Tick from the old instance must not count against question 1
        assert_eq!(timer.tick(first), TickOutcome::Ignored);
        assert_eq!(timer.time_left(), 5);
        assert_eq!(timer.tick(second), TickOutcome::Counting { time_left: 4 });
    }

    #[test]
    fn test_same_question_restart_gets_new_generation() {
        let mut timer = Countdown::new(5);
        let a = timer.start(2);
        let b = timer.start(2);
        assert_eq!(a.question_index, b.question_index);
        assert_ne!(a, b);
        assert_eq!(timer.tick(a), TickOutcome::Ignored);
    }

    #[test]
    fn test_stop_ignores_ticks() {
        let mut timer = Countdown::new(2);
        let tag = timer.start(0);
        timer.stop();
        assert_eq!(timer.tick(tag), TickOutcome::Ignored);
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_tag_display() {
        let tag = TimerTag { question_index: 3, generation: 7 };
        assert_eq!(tag.to_string(), "q3#7");
    }
}
