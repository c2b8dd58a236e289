//! Runtime Layer
//!
//! Async shell around the engine: wall-clock ticks, command channels and
//! update broadcast. This layer is **non-deterministic**; all quiz logic runs
//! through `quiz/`.

pub mod protocol;
pub mod driver;

pub use protocol::{ClientCommand, QuizUpdate, QuizCompletion};
pub use driver::{
    QuizDriver, QuizHandle, DriverConfig, DriverError, Progress, SessionOutcome,
};
