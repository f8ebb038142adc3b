//! In-memory judge backend for tests.
//!
//! `ScriptedJudge` picks a response by looking for a scripted substring in the
//! human turn, so tests can steer grades per reply text.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::JudgeError;
use crate::judge::{JudgeBackend, JudgePrompt, RawGrade};

#[derive(Debug, Clone)]
enum Response {
    Grade(RawGrade),
    Error(JudgeError),
}

/// Judge backend answering from a substring -> response table.
#[derive(Debug)]
pub struct ScriptedJudge {
    scripts: Vec<(String, Response)>,
    default_grade: RawGrade,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<JudgePrompt>>,
}

impl Default for ScriptedJudge {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            default_grade: RawGrade::new(80, "Polite and on brand, minor wording issues."),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Grade returned when no script matches.
    pub fn with_default(mut self, grade: RawGrade) -> Self {
        self.default_grade = grade;
        self
    }

    /// Return `grade` for replies containing `needle`. First match wins.
    pub fn with_grade(mut self, needle: &str, grade: RawGrade) -> Self {
        self.scripts
            .push((needle.to_string(), Response::Grade(grade)));
        self
    }

    pub fn with_error(mut self, needle: &str, error: JudgeError) -> Self {
        self.scripts
            .push((needle.to_string(), Response::Error(error)));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every prompt received, in arrival order.
    pub fn prompts(&self) -> Vec<JudgePrompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JudgeBackend for ScriptedJudge {
    async fn complete(&self, prompt: &JudgePrompt) -> Result<RawGrade, JudgeError> {
        self.prompts.lock().unwrap().push(prompt.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self
            .scripts
            .iter()
            .find(|(needle, _)| prompt.human.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        match scripted {
            Some(Response::Grade(grade)) => Ok(grade),
            Some(Response::Error(err)) => Err(err),
            None => Ok(self.default_grade.clone()),
        }
    }
}
