//! Brandvoice Eval: batch brand-voice evaluation engine
//!
//! Grades agent replies with a weighted blend of deterministic rule checks
//! and an LLM judge, then aggregates the outcomes into JSON reports. A
//! sequential citation-compliance evaluator covers document-grounded answers.

pub mod citations;
pub mod combine;
pub mod config;
pub mod error;
pub mod fakes;
pub mod input;
pub mod judge;
pub mod metrics;
pub mod obs;
pub mod record;
pub mod report;
pub mod rules;
pub mod runner;
pub mod stats;
pub mod telemetry;

pub use citations::{
    load_citation_cases, write_citation_report, CitationCase, CitationCaseResult,
    CitationEvaluator, CitationReport,
};
pub use combine::combine;
pub use config::EvalConfig;
pub use error::{ConfigError, EvalError, EvalResult, GradeError, JudgeError};
pub use input::load_prompts;
pub use judge::http::{HttpJudgeBackend, JudgeSettings};
pub use judge::{Grade, JudgeBackend, JudgeClient, JudgePrompt, JudgeVerdict, RawGrade};
pub use metrics::BatchMetrics;
pub use record::{EvaluationRecord, FailedRecord, ScoredRecord};
pub use report::{compile, write_report, Report, ReportPaths, Summary, SummaryStatus};
pub use rules::{RuleChecks, RuleResult, RuleScorer, Violation};
pub use runner::BatchRunner;
