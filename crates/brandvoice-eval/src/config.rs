//! Evaluation run configuration.
//!
//! One `EvalConfig` is built per run and shared read-only by every pipeline.
//! Durations are written in seconds in config files.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Rubric weights, penalties and rate-limiting knobs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Weight of the rule score in the final score.
    pub rule_weight: f64,
    /// Weight of the judge score in the final score.
    pub judge_weight: f64,

    pub emoji_penalty: u32,
    pub exclamation_penalty: u32,
    pub length_penalty: u32,
    /// Longest acceptable reply, in characters.
    pub max_length: usize,

    /// Minimum final score (0..=100) for a reply to pass.
    pub passing_threshold: u32,
    /// Low judge scores with shorter notes get flagged as unreliable.
    pub min_judge_notes_length: usize,

    /// Admission limit and chunk size.
    pub max_concurrent_requests: usize,
    #[serde(rename = "delay_between_batches_secs", with = "duration_secs")]
    pub delay_between_batches: Duration,
    #[serde(rename = "delay_between_requests_secs", with = "duration_secs")]
    pub delay_between_requests: Duration,

    #[serde(rename = "judge_timeout_secs", with = "duration_secs")]
    pub judge_timeout: Duration,
    #[serde(rename = "agent_timeout_secs", with = "duration_secs")]
    pub agent_timeout: Duration,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            rule_weight: 0.4,
            judge_weight: 0.6,
            emoji_penalty: 20,
            exclamation_penalty: 10,
            length_penalty: 10,
            max_length: 600,
            passing_threshold: 80,
            min_judge_notes_length: 20,
            max_concurrent_requests: 5,
            delay_between_batches: Duration::from_secs(1),
            delay_between_requests: Duration::from_millis(200),
            judge_timeout: Duration::from_secs(15),
            agent_timeout: Duration::from_secs(15),
        }
    }
}

impl EvalConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(toml_src: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = toml::from_str(toml_src)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values the engine cannot run with.
    ///
    /// Weights that do not sum to 1.0 are accepted and act as a scale on the
    /// final score; they are only reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.passing_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.passing_threshold));
        }
        for (field, value) in [
            ("rule_weight", self.rule_weight),
            ("judge_weight", self.judge_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }

        let total = self.rule_weight + self.judge_weight;
        if (total - 1.0).abs() > 1e-6 {
            warn!(
                rule_weight = self.rule_weight,
                judge_weight = self.judge_weight,
                total,
                "rubric weights do not sum to 1.0; final scores are scaled"
            );
        }
        Ok(())
    }
}
