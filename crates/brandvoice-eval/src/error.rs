//! Error taxonomy for the evaluation engine.

use std::time::Duration;

use brandvoice_agent::AgentError;

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("max_concurrent_requests must be at least 1")]
    ZeroConcurrency,

    #[error("passing_threshold must be within 0..=100, got {0}")]
    ThresholdOutOfRange(u32),

    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not readable: {0}")]
    Io(#[from] std::io::Error),
}

/// A judge payload that does not satisfy the grade constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradeError {
    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(i64),

    #[error("notes must contain meaningful feedback (at least {min} characters)")]
    NotesTooShort { min: usize },
}

/// Failures of a single judge round-trip.
///
/// Never reaches the batch: the judge client degrades instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Http(String),

    #[error("judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("judge timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed judge output: {0}")]
    MalformedOutput(String),

    #[error("invalid grade: {0}")]
    InvalidGrade(#[from] GradeError),
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        JudgeError::Http(err.to_string())
    }
}

/// Errors raised inside one evaluation pipeline.
///
/// The batch runner turns every one of these into a failed record. Judge
/// failures are absent: they degrade the grade instead.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("admission control closed: {0}")]
    Admission(String),
}

/// Result type for evaluation operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;
