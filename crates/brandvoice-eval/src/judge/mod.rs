//! LLM judge: one graded round-trip per reply, never failing the caller.
//!
//! - `grade.rs`: `Grade`, `RawGrade`, `JudgeVerdict`
//! - `prompt.rs`: system preamble and human turn
//! - `http.rs`: OpenAI-compatible HTTP backend

mod grade;
pub mod http;
mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brandvoice_agent::Persona;
use tracing::{debug, instrument};

use crate::config::EvalConfig;
use crate::error::JudgeError;

pub use grade::{Grade, JudgeVerdict, RawGrade, MIN_NOTES_CHARS, NEUTRAL_SCORE};
pub use prompt::JudgePrompt;

/// Score below which short notes are flagged.
const LOW_SCORE: u8 = 50;
/// Score from which a near-perfect note is expected.
const NEAR_PERFECT_SCORE: u8 = 95;

/// Transport to an external grading model.
#[async_trait]
pub trait JudgeBackend: Send + Sync {
    /// Send one prompt and return the unvalidated payload.
    async fn complete(&self, prompt: &JudgePrompt) -> Result<RawGrade, JudgeError>;
}

/// Wraps a backend with the brand preamble, a hard timeout, validation and
/// sanity annotations.
pub struct JudgeClient {
    backend: Arc<dyn JudgeBackend>,
    preamble: Vec<String>,
    timeout: Duration,
    min_notes_length: usize,
}

impl JudgeClient {
    pub fn new(backend: Arc<dyn JudgeBackend>, persona: &Persona, config: &EvalConfig) -> Self {
        Self {
            backend,
            preamble: prompt::build_preamble(persona),
            timeout: config.judge_timeout,
            min_notes_length: config.min_judge_notes_length,
        }
    }

    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }

    /// Grade `reply`. Failures come back as [`JudgeVerdict::Degraded`].
    #[instrument(skip_all, fields(reply_chars = reply.chars().count()))]
    pub async fn grade(&self, reply: &str) -> JudgeVerdict {
        match self.try_grade(reply).await {
            Ok(grade) => JudgeVerdict::Ok {
                grade: self.sanity_annotate(grade),
            },
            Err(e) => {
                debug!(error = %e, "judge output unusable, degrading");
                JudgeVerdict::degraded(e.to_string())
            }
        }
    }

    async fn try_grade(&self, reply: &str) -> Result<Grade, JudgeError> {
        let prompt = prompt::build_prompt(&self.preamble, reply);
        let raw = tokio::time::timeout(self.timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| JudgeError::Timeout(self.timeout))??;
        Ok(Grade::try_from(raw)?)
    }

    fn sanity_annotate(&self, grade: Grade) -> Grade {
        let score = grade.score();
        let mut grade = grade;

        if score < LOW_SCORE && grade.notes().chars().count() < self.min_notes_length {
            let note = format!(
                "[WARNING: Low score ({}) with minimal justification. This grade may be unreliable.]",
                score
            );
            grade = grade.annotated(&note);
        }

        if score >= NEAR_PERFECT_SCORE && !grade.notes().to_lowercase().contains("perfect") {
            grade = grade.annotated("[Note: Near-perfect score assigned]");
        }

        grade
    }
}
