//! Runner Configuration
//!
//! Everything the binary needs that is not the quiz itself, read from the
//! environment with defaults for anything unset.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::quiz::engine::{HintStrategy, QuizConfig};
use crate::quiz::timer::DEFAULT_QUESTION_SECONDS;
use crate::runtime::driver::DriverConfig;

/// Seconds allowed per question.
pub const ENV_SECONDS_PER_QUESTION: &str = "QUIZ_SECONDS_PER_QUESTION";
/// Seed for shuffled hint eliminations.
pub const ENV_HINT_SEED: &str = "QUIZ_HINT_SEED";
/// Countdown tick interval in milliseconds.
pub const ENV_TICK_MS: &str = "QUIZ_TICK_MS";
/// Update broadcast capacity.
pub const ENV_EVENT_CAPACITY: &str = "QUIZ_EVENT_CAPACITY";
/// Path to a quiz JSON file.
pub const ENV_QUIZ_FILE: &str = "QUIZ_FILE";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variable is set but does not parse.
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        expected: &'static str,
    },

    /// Variable parses but is out of range.
    #[error("{var} must be at least {min}, got {value}")]
    TooSmall {
        /// Variable name.
        var: &'static str,
        /// Parsed value.
        value: u64,
        /// Smallest accepted value.
        min: u64,
    },
}

/// Complete runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunnerConfig {
    /// Engine settings.
    pub quiz: QuizConfig,
    /// Async shell settings.
    pub driver: DriverConfig,
    /// Quiz file; the built-in sample is used when unset.
    pub quiz_path: Option<PathBuf>,
}

impl RunnerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DriverConfig::default();

        let seconds = parse_u64(&lookup, ENV_SECONDS_PER_QUESTION, 1)?
            .map(|s| s.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(DEFAULT_QUESTION_SECONDS);

        let hint = match parse_u64(&lookup, ENV_HINT_SEED, 0)? {
            Some(seed) => HintStrategy::Seeded(seed),
            None => HintStrategy::InOrder,
        };

        let tick_interval = parse_u64(&lookup, ENV_TICK_MS, 1)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let event_capacity = parse_u64(&lookup, ENV_EVENT_CAPACITY, 1)?
            .map(|c| c as usize)
            .unwrap_or(defaults.event_capacity);

        let quiz_path = lookup(ENV_QUIZ_FILE)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            quiz: QuizConfig {
                seconds_per_question: seconds,
                hint,
            },
            driver: DriverConfig {
                tick_interval,
                event_capacity,
            },
            quiz_path,
        })
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str, min: u64) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };

    let value: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.clone(),
        expected: "unsigned integer",
    })?;

    if value < min {
        return Err(ConfigError::TooSmall { var, value, min });
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.quiz.seconds_per_question, 30);
        assert_eq!(config.driver.tick_interval, Duration::from_secs(1));
        assert!(config.quiz_path.is_none());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = RunnerConfig::from_lookup(lookup(&[
            (ENV_SECONDS_PER_QUESTION, "10"),
            (ENV_HINT_SEED, "42"),
            (ENV_TICK_MS, "250"),
            (ENV_EVENT_CAPACITY, "16"),
            (ENV_QUIZ_FILE, "quiz.json"),
        ]))
        .unwrap();

        assert_eq!(config.quiz.seconds_per_question, 10);
        assert_eq!(config.quiz.hint, HintStrategy::Seeded(42));
        assert_eq!(config.driver.tick_interval, Duration::from_millis(250));
        assert_eq!(config.driver.event_capacity, 16);
        assert_eq!(config.quiz_path, Some(PathBuf::from("quiz.json")));
    }

    #[test]
    fn test_zero_seconds_rejected() {
        let err = RunnerConfig::from_lookup(lookup(&[(ENV_SECONDS_PER_QUESTION, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooSmall { var: ENV_SECONDS_PER_QUESTION, value: 0, min: 1 }
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let err = RunnerConfig::from_lookup(lookup(&[(ENV_TICK_MS, "fast")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_TICK_MS, .. }));
    }

    #[test]
    fn test_zero_seed_is_valid() {
        let config = RunnerConfig::from_lookup(lookup(&[(ENV_HINT_SEED, "0")])).unwrap();
        assert_eq!(config.quiz.hint, HintStrategy::Seeded(0));
    }
}
