//! Run Digests
//!
//! SHA-256 digest of a finished quiz run. Two runs with the same quiz and the
//! same recorded responses produce the same digest, which is how a replayed
//! action history is checked against the live session.

use sha2::{Sha256, Digest};

/// Digest output type (256 bits / 32 bytes)
pub type RunDigest = [u8; 32];

/// Domain separator for quiz run digests.
pub const RUN_DOMAIN: &[u8] = b"QUIZ_RUNNER_RUN_V1";

/// Incremental hasher with length-prefixed helpers.
///
/// Strings are length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// never collide.
pub struct RunHasher {
    hasher: Sha256,
}

impl RunHasher {
    /// Create a new hasher with a domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a quiz run.
    pub fn for_run() -> Self {
        Self::new(RUN_DOMAIN)
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string; `None` hashes as a single marker byte.
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_u8(1);
                self.update_str(s);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> RunDigest {
        self.hasher.finalize().into()
    }
}

/// Compute the digest of a run.
///
/// The title and question count go in first; the closure adds the
/// per-response data in order.
pub fn compute_run_digest<F>(title: &str, question_count: usize, add_responses: F) -> RunDigest
where
    F: FnOnce(&mut RunHasher),
{
    let mut hasher = RunHasher::for_run();
    hasher.update_str(title);
    hasher.update_u64(question_count as u64);
    add_responses(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
