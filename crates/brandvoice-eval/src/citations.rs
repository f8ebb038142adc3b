//! Citation-compliance evaluation for document-grounded answers.
//!
//! In-scope questions must be answered with at least one valid citation.
//! Out-of-scope questions must get the persona's fallback phrase and no
//! citations. Items run one after another; agent errors fail the item only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use brandvoice_agent::{Agent, Persona, SessionId, StructuredReply};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::obs;
use crate::stats;

pub const CITATION_REPORT_FILE: &str = "rag_eval.json";
pub const TARGET_PASS_RATE: f64 = 80.0;

const SESSION_USER: &str = "rag_eval";

/// Share of the fallback's significant words that must appear in the answer.
const FALLBACK_WORD_SHARE: f64 = 0.5;

/// Phrases that signal the agent admitted it has no answer.
const LACK_OF_KNOWLEDGE_INDICATORS: &[&str] = &[
    "i don't know",
    "i do not know",
    "no information",
    "cannot answer",
    "can't answer",
    "no data",
    "information is not available",
    "not aware of",
];

/// One question of the citation suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationCase {
    pub question: String,
    /// Out of scope: the documents hold no answer.
    #[serde(default)]
    pub oos: bool,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "unknown".to_string()
}

#[derive(Debug, Deserialize)]
struct CitationSuite {
    #[serde(default)]
    prompts: Vec<CitationCase>,
}

/// Load `{"prompts": [...]}`.
pub fn load_citation_cases(path: &Path) -> Result<Vec<CitationCase>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read citation suite {:?}", path))?;
    let suite: CitationSuite =
        serde_json::from_str(&content).with_context(|| format!("parse citation suite {:?}", path))?;
    if suite.prompts.is_empty() {
        warn!(path = %path.display(), "citation suite has no prompts");
    }
    Ok(suite.prompts)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationCaseResult {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "pass")]
    pub passed: bool,
    pub oos: bool,
    pub category: String,
    pub answer: Option<String>,
    pub has_citations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_fallback: Option<bool>,
    pub confidence: Option<String>,
    pub citations_count: usize,
    pub reason: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    /// Percent, two decimals.
    pub pass_rate: f64,
    pub total_count: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub target_pass_rate: f64,
    pub meets_target: bool,
    pub items: Vec<CitationCaseResult>,
}

impl CitationReport {
    fn from_items(items: Vec<CitationCaseResult>) -> Self {
        let total_count = items.len();
        let passed_count = items.iter().filter(|i| i.passed).count();
        let pass_rate = if total_count == 0 {
            0.0
        } else {
            passed_count as f64 / total_count as f64 * 100.0
        };
        CitationReport {
            pass_rate: stats::round2(pass_rate),
            total_count,
            passed_count,
            failed_count: total_count - passed_count,
            target_pass_rate: TARGET_PASS_RATE,
            meets_target: pass_rate >= TARGET_PASS_RATE,
            items,
        }
    }
}

/// Sequential citation evaluator over one agent and persona.
pub struct CitationEvaluator {
    agent: Arc<dyn Agent>,
    fallback: String,
}

impl CitationEvaluator {
    pub fn new(agent: Arc<dyn Agent>, persona: &Persona) -> Self {
        Self {
            agent,
            fallback: persona.no_data_fallback().to_string(),
        }
    }

    /// Whether `answer` admits the agent has no data.
    ///
    /// Matches the fallback phrase itself, at least half of its words longer
    /// than three characters, or a generic lack-of-knowledge phrase. All
    /// comparisons ignore case.
    pub fn uses_fallback(&self, answer: &str) -> bool {
        let answer = answer.to_lowercase();
        let fallback = self.fallback.to_lowercase();

        if !fallback.trim().is_empty() && answer.contains(&fallback) {
            return true;
        }

        let words: Vec<&str> = fallback
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| w.chars().count() > 3)
            .collect();
        if !words.is_empty() {
            let hits = words.iter().filter(|w| answer.contains(*w)).count();
            if hits as f64 / words.len() as f64 >= FALLBACK_WORD_SHARE {
                return true;
            }
        }

        LACK_OF_KNOWLEDGE_INDICATORS
            .iter()
            .any(|indicator| answer.contains(indicator))
    }

    #[instrument(skip(self), fields(oos = case.oos))]
    pub async fn evaluate_case(&self, case: &CitationCase) -> CitationCaseResult {
        let session = SessionId::mint(SESSION_USER);
        match self.agent.ask(&case.question, &session).await {
            Ok((reply, _)) => self.judge_reply(case, &reply),
            Err(e) => {
                error!(question = %case.question, error = %e, "citation case failed");
                CitationCaseResult {
                    question: case.question.clone(),
                    passed: false,
                    oos: case.oos,
                    category: case.category.clone(),
                    answer: None,
                    has_citations: false,
                    uses_fallback: None,
                    confidence: None,
                    citations_count: 0,
                    reason: format!("Evaluation error: {}", e),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn judge_reply(&self, case: &CitationCase, reply: &StructuredReply) -> CitationCaseResult {
        let has_citations = reply.has_valid_citations();

        let (passed, uses_fallback, reason) = if case.oos {
            let uses_fallback = self.uses_fallback(&reply.answer);
            let passed = uses_fallback && !has_citations;
            let reason = if passed {
                "Correctly used fallback and no citations"
            } else if has_citations {
                "Provided citations for out-of-scope question (hallucination)"
            } else {
                "Did not use fallback response"
            };
            (passed, Some(uses_fallback), reason)
        } else {
            let reason = if has_citations {
                "Has valid citations"
            } else {
                "No valid citations"
            };
            (has_citations, None, reason)
        };

        CitationCaseResult {
            question: case.question.clone(),
            passed,
            oos: case.oos,
            category: case.category.clone(),
            answer: Some(reply.answer.clone()),
            has_citations,
            uses_fallback,
            confidence: Some(reply.confidence.clone()),
            citations_count: reply.citations.len(),
            reason: reason.to_string(),
            error: None,
        }
    }

    /// Evaluate every case in order.
    pub async fn evaluate(&self, cases: &[CitationCase]) -> CitationReport {
        let mut items = Vec::with_capacity(cases.len());
        for case in cases {
            items.push(self.evaluate_case(case).await);
        }
        let report = CitationReport::from_items(items);
        info!(
            pass_rate = report.pass_rate,
            meets_target = report.meets_target,
            total = report.total_count,
            "citation evaluation finished"
        );
        report
    }
}

/// Write `rag_eval.json` into `dir`, creating it if needed.
pub fn write_citation_report(dir: &Path, report: &CitationReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create reports dir {:?}", dir))?;
    let path = dir.join(CITATION_REPORT_FILE);
    let content = serde_json::to_string_pretty(report).context("serialize citation report")?;
    std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
    obs::emit_report_written(&path, report.passed_count, report.failed_count);
    Ok(path)
}
