//! Quiz Logic Module
//!
//! The deterministic quiz state machine. No wall clock, no I/O.
//!
//! ## Module Structure
//!
//! - `model`: Quiz and Question input data
//! - `timer`: Per-question countdown with tagged instances
//! - `session`: Mutable session state and render snapshots
//! - `engine`: The operations that mutate the session
//! - `events`: Events emitted on every accepted mutation
//! - `summary`: Terminal result and digest
//! - `replay`: Rebuild a session from its action history

pub mod model;
pub mod timer;
pub mod session;
pub mod engine;
pub mod events;
pub mod summary;
pub mod replay;
pub mod error;

// Re-export key types
pub use model::{Quiz, Question};
pub use timer::{Countdown, TimerPhase, TimerTag, TickOutcome, DEFAULT_QUESTION_SECONDS};
pub use session::{Session, SessionSnapshot, OptionView, ResponseRecord};
pub use engine::{QuizEngine, QuizConfig, QuizAction, HintStrategy, Transition};
pub use events::{QuizEvent, QuizEventData};
pub use summary::QuizSummary;
pub use replay::{replay_session, verify_replay, ReplayResult};
pub use error::QuizError;
