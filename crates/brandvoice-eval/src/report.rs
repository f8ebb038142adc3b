//! Aggregation of evaluation records into the persisted report artifacts.
//!
//! Statistics cover the scored subset only; failed records are listed but
//! never enter a number. Every input, including an empty one, compiles to a
//! well-formed report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EvalConfig;
use crate::obs;
use crate::record::{EvaluationRecord, FailedRecord, ScoredRecord};
use crate::rules::Violation;
use crate::stats;

pub const REPORT_FILE: &str = "style_eval.json";
pub const SUMMARY_FILE: &str = "style_eval_summary.json";

/// Whether the statistics in a summary mean anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Complete,
    /// Prompts were submitted but none could be scored.
    AllFailed,
    /// No prompts were submitted.
    EmptyInput,
}

/// The rubric knobs a report was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEcho {
    pub rule_weight: f64,
    pub judge_weight: f64,
    pub passing_threshold: u32,
    pub max_length: usize,
    pub max_concurrent_requests: usize,
}

impl From<&EvalConfig> for ConfigEcho {
    fn from(c: &EvalConfig) -> Self {
        ConfigEcho {
            rule_weight: c.rule_weight,
            judge_weight: c.judge_weight,
            passing_threshold: c.passing_threshold,
            max_length: c.max_length,
            max_concurrent_requests: c.max_concurrent_requests,
        }
    }
}

/// Distribution of final scores. All zero when nothing was scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCount {
    pub violation: Violation,
    pub count: usize,
}

/// Condensed view of one scored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBrief {
    pub prompt: String,
    pub answer: String,
    pub final_score: i64,
    pub rule_score: u8,
    pub judge_score: u8,
    pub judge_notes: String,
    pub violations: Vec<Violation>,
}

impl From<&ScoredRecord> for CaseBrief {
    fn from(r: &ScoredRecord) -> Self {
        CaseBrief {
            prompt: r.prompt.clone(),
            answer: r.answer.clone(),
            final_score: r.final_score,
            rule_score: r.rule.score,
            judge_score: r.grade.score(),
            judge_notes: r.grade.notes().to_string(),
            violations: r.rule.violations.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub status: SummaryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigEcho,

    pub total_prompts: usize,
    pub scored_count: usize,
    pub failed_count: usize,
    pub passed_count: usize,
    /// Percent of scored records that passed.
    pub pass_rate: f64,
    pub degraded_grades: usize,

    pub final_score: ScoreStatistics,
    pub rule_score: Spread,
    pub judge_score: Spread,

    pub total_violations: usize,
    /// Descending by count; ties keep first-seen order.
    pub common_violations: Vec<ViolationCount>,

    /// Scored records below the passing threshold.
    pub below_threshold: Vec<CaseBrief>,
    pub worst_case: Option<CaseBrief>,
    pub best_case: Option<CaseBrief>,
}

impl Summary {
    pub fn is_complete(&self) -> bool {
        self.status == SummaryStatus::Complete
    }
}

/// Full report: `{summary, cases, errors?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Summary,
    pub cases: Vec<ScoredRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FailedRecord>,
}

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    summary: &'a Summary,
}

/// Where [`write_report`] put the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub report: PathBuf,
    pub summary: PathBuf,
}

/// Aggregate records into a report. Never fails.
pub fn compile(records: &[EvaluationRecord], config: &EvalConfig) -> Report {
    let cases: Vec<ScoredRecord> = records.iter().filter_map(|r| r.as_scored().cloned()).collect();
    let errors: Vec<FailedRecord> = records.iter().filter_map(|r| r.as_failed().cloned()).collect();

    let (status, message) = if records.is_empty() {
        (
            SummaryStatus::EmptyInput,
            Some("No prompts were submitted".to_string()),
        )
    } else if cases.is_empty() {
        (
            SummaryStatus::AllFailed,
            Some(format!("All {} evaluations failed", errors.len())),
        )
    } else {
        (SummaryStatus::Complete, None)
    };

    let finals: Vec<f64> = cases.iter().map(|c| c.final_score as f64).collect();
    let rules: Vec<f64> = cases.iter().map(|c| f64::from(c.rule.score)).collect();
    let judges: Vec<f64> = cases.iter().map(|c| f64::from(c.grade.score())).collect();

    let passed_count = cases.iter().filter(|c| c.passed).count();
    let pass_rate = if cases.is_empty() {
        0.0
    } else {
        stats::round2(passed_count as f64 / cases.len() as f64 * 100.0)
    };

    let summary = Summary {
        status,
        message,
        generated_at: Utc::now(),
        config: ConfigEcho::from(config),
        total_prompts: records.len(),
        scored_count: cases.len(),
        failed_count: errors.len(),
        passed_count,
        pass_rate,
        degraded_grades: cases.iter().filter(|c| c.judge_degraded.is_some()).count(),
        final_score: final_score_statistics(&finals),
        rule_score: spread(&rules),
        judge_score: spread(&judges),
        total_violations: cases.iter().map(|c| c.rule.violations.len()).sum(),
        common_violations: violation_frequencies(&cases),
        below_threshold: cases
            .iter()
            .filter(|c| !c.passed)
            .map(CaseBrief::from)
            .collect(),
        worst_case: extreme(&cases, |candidate, current| candidate < current),
        best_case: extreme(&cases, |candidate, current| candidate > current),
    };

    Report {
        summary,
        cases,
        errors,
    }
}

fn final_score_statistics(values: &[f64]) -> ScoreStatistics {
    let stat = |v: Option<f64>| v.map(stats::round2).unwrap_or_default();
    ScoreStatistics {
        mean: stat(stats::mean(values)),
        std_dev: stat(stats::std_dev(values)),
        min: stat(stats::percentile(values, 0.0)),
        max: stat(stats::percentile(values, 100.0)),
        median: stat(stats::median(values)),
        p25: stat(stats::percentile(values, 25.0)),
        p75: stat(stats::percentile(values, 75.0)),
        p95: stat(stats::percentile(values, 95.0)),
    }
}

fn spread(values: &[f64]) -> Spread {
    Spread {
        mean: stats::mean(values).map(stats::round2).unwrap_or_default(),
        std_dev: stats::std_dev(values).map(stats::round2).unwrap_or_default(),
    }
}

fn violation_frequencies(cases: &[ScoredRecord]) -> Vec<ViolationCount> {
    let mut counts: Vec<ViolationCount> = Vec::new();
    for violation in cases.iter().flat_map(|c| c.rule.violations.iter()) {
        match counts.iter_mut().find(|vc| vc.violation == *violation) {
            Some(vc) => vc.count += 1,
            None => counts.push(ViolationCount {
                violation: *violation,
                count: 1,
            }),
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// First record whose final score beats every earlier one under `better`.
fn extreme(cases: &[ScoredRecord], better: impl Fn(i64, i64) -> bool) -> Option<CaseBrief> {
    let mut best: Option<&ScoredRecord> = None;
    for case in cases {
        match best {
            Some(current) if !better(case.final_score, current.final_score) => {}
            _ => best = Some(case),
        }
    }
    best.map(CaseBrief::from)
}

/// Write `style_eval.json` and `style_eval_summary.json` into `dir`,
/// creating it if needed.
pub fn write_report(dir: &Path, report: &Report) -> Result<ReportPaths> {
    std::fs::create_dir_all(dir).with_context(|| format!("create reports dir {:?}", dir))?;

    let paths = ReportPaths {
        report: dir.join(REPORT_FILE),
        summary: dir.join(SUMMARY_FILE),
    };

    let full = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(&paths.report, full).with_context(|| format!("write {:?}", paths.report))?;

    let condensed = serde_json::to_string_pretty(&SummaryArtifact {
        summary: &report.summary,
    })
    .context("serialize summary")?;
    std::fs::write(&paths.summary, condensed)
        .with_context(|| format!("write {:?}", paths.summary))?;

    obs::emit_report_written(&paths.report, report.summary.scored_count, report.errors.len());
    Ok(paths)
}
