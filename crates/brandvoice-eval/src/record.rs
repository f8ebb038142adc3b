//! Per-prompt evaluation outcomes.

use serde::{Deserialize, Serialize};

use crate::judge::Grade;
use crate::rules::RuleResult;

/// A reply that made it through the agent, the rules and the judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub prompt: String,
    pub answer: String,
    pub actions: Vec<String>,
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
    pub rule: RuleResult,
    pub grade: Grade,
    /// Why the judge's own grade was replaced by the neutral one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_degraded: Option<String>,
    pub final_score: i64,
    pub passed: bool,
}

/// A prompt that could not be scored at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub prompt: String,
    pub error: String,
}

/// Exactly one per submitted prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationRecord {
    Scored(ScoredRecord),
    Failed(FailedRecord),
}

impl EvaluationRecord {
    pub fn failed(prompt: impl Into<String>, error: impl Into<String>) -> Self {
        EvaluationRecord::Failed(FailedRecord {
            prompt: prompt.into(),
            error: error.into(),
        })
    }

    pub fn prompt(&self) -> &str {
        match self {
            EvaluationRecord::Scored(r) => &r.prompt,
            EvaluationRecord::Failed(r) => &r.prompt,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, EvaluationRecord::Scored(_))
    }

    pub fn as_scored(&self) -> Option<&ScoredRecord> {
        match self {
            EvaluationRecord::Scored(r) => Some(r),
            EvaluationRecord::Failed(_) => None,
        }
    }

    pub fn as_failed(&self) -> Option<&FailedRecord> {
        match self {
            EvaluationRecord::Scored(_) => None,
            EvaluationRecord::Failed(r) => Some(r),
        }
    }
}
