//! # Quiz Runner
//!
//! Single-session multiple-choice quiz engine with a per-question countdown
//! and a one-time 50/50 hint.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUIZ RUNNER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG for seeded hints        │
//! │  └── hash.rs     - Run digest (SHA-256)                      │
//! │                                                              │
//! │  quiz/           - Quiz logic (deterministic)                │
//! │  ├── model.rs    - Quiz and Question data                    │
//! │  ├── timer.rs    - Tagged countdown state machine            │
//! │  ├── session.rs  - Session state and snapshots               │
//! │  ├── engine.rs   - The operations                            │
//! │  ├── events.rs   - Emitted events                            │
//! │  ├── summary.rs  - Final result and digest                   │
//! │  └── replay.rs   - Rebuild a run from its history            │
//! │                                                              │
//! │  runtime/        - Async shell (non-deterministic)           │
//! │  ├── driver.rs   - Actor task + per-question tickers         │
//! │  └── protocol.rs - JSON-lines message types                  │
//! │                                                              │
//! │  config.rs       - Environment configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `quiz/` modules never read the wall clock:
//! - Time arrives as ticks tagged with the timer instance that sent them
//! - Hint eliminations are either in display order or from a seeded PRNG
//! - Every accepted action is kept in the engine's history
//!
//! Replaying a history against the same quiz and config produces the same
//! responses and the same digest.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod quiz;
pub mod runtime;

// Re-export commonly used types
pub use config::{RunnerConfig, ConfigError};
pub use quiz::{
    Quiz, Question, QuizEngine, QuizConfig, QuizAction, QuizError, QuizSummary,
    HintStrategy, SessionSnapshot, Transition,
};
pub use runtime::{QuizDriver, QuizHandle, DriverConfig, QuizUpdate, ClientCommand};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
