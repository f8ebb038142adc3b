//! Outcome counters for one batch.
//!
//! Tallied from the records a chunk returns, after its pipelines have
//! finished, so pipelines never share a counter. [`BatchMetrics::flush`]
//! reports the totals as a single `info!` event at the end of a batch.

use serde::{Deserialize, Serialize};

use crate::record::EvaluationRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub evaluations_started: u64,
    pub evaluations_scored: u64,
    pub evaluations_failed: u64,
    pub evaluations_passed: u64,
    /// Scored records whose judge grade was replaced by the neutral one.
    pub grades_degraded: u64,
}

impl BatchMetrics {
    pub fn tally(records: &[EvaluationRecord]) -> Self {
        let mut metrics = Self::default();
        for record in records {
            metrics.record(record);
        }
        metrics
    }

    pub fn record(&mut self, record: &EvaluationRecord) {
        self.evaluations_started += 1;
        match record {
            EvaluationRecord::Scored(scored) => {
                self.evaluations_scored += 1;
                if scored.passed {
                    self.evaluations_passed += 1;
                }
                if scored.judge_degraded.is_some() {
                    self.grades_degraded += 1;
                }
            }
            EvaluationRecord::Failed(_) => self.evaluations_failed += 1,
        }
    }

    pub fn merge(&mut self, other: &BatchMetrics) {
        self.evaluations_started += other.evaluations_started;
        self.evaluations_scored += other.evaluations_scored;
        self.evaluations_failed += other.evaluations_failed;
        self.evaluations_passed += other.evaluations_passed;
        self.grades_degraded += other.grades_degraded;
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            evaluations_started = self.evaluations_started,
            evaluations_scored = self.evaluations_scored,
            evaluations_failed = self.evaluations_failed,
            evaluations_passed = self.evaluations_passed,
            grades_degraded = self.grades_degraded,
        );
    }
}
