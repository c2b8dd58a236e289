//! Core deterministic primitives.
//!
//! Nothing in here reads the wall clock or does I/O, so everything built on
//! top of it can be replayed exactly.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{RunDigest, RunHasher, compute_run_digest};
