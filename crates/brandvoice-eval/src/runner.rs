//! Rate-limited batch evaluation.
//!
//! Prompts are split into chunks of `max_concurrent_requests`. Each chunk is
//! spawned as independent tasks behind an admission semaphore and awaited in
//! full before the next chunk starts, so a failed or panicking pipeline only
//! ever costs its own record. Nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use brandvoice_agent::{Agent, AgentError, SessionId};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, Instrument};

use crate::combine::combine;
use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};
use crate::judge::{JudgeClient, JudgeVerdict};
use crate::metrics::BatchMetrics;
use crate::obs;
use crate::record::{EvaluationRecord, ScoredRecord};
use crate::report::{compile, Report};
use crate::rules::RuleScorer;

/// User id prefix for the throwaway session minted per prompt.
const SESSION_USER: &str = "style_eval";

/// Drives the agent and the judge over a list of prompts.
pub struct BatchRunner {
    agent: Arc<dyn Agent>,
    judge: Arc<JudgeClient>,
    scorer: RuleScorer,
    config: Arc<EvalConfig>,
}

impl BatchRunner {
    pub fn new(agent: Arc<dyn Agent>, judge: Arc<JudgeClient>, config: EvalConfig) -> Self {
        Self {
            agent,
            judge,
            scorer: RuleScorer::from_config(&config),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate every prompt; returns exactly one record per prompt.
    ///
    /// Chunk order follows input order. Within a chunk, records are listed in
    /// input order too, though the pipelines finish in any order.
    pub async fn run(&self, prompts: &[String]) -> Vec<EvaluationRecord> {
        self.run_with_metrics(prompts).await.0
    }

    /// [`run`](Self::run) plus the outcome counters of this batch alone.
    pub async fn run_with_metrics(
        &self,
        prompts: &[String],
    ) -> (Vec<EvaluationRecord>, BatchMetrics) {
        self.run_chunks(prompts)
            .instrument(obs::batch_span(SESSION_USER, prompts.len()))
            .await
    }

    /// [`run`](Self::run) followed by [`compile`].
    pub async fn evaluate(&self, prompts: &[String]) -> Report {
        let records = self.run(prompts).await;
        compile(&records, &self.config)
    }

    async fn run_chunks(&self, prompts: &[String]) -> (Vec<EvaluationRecord>, BatchMetrics) {
        let started = Instant::now();
        let chunk_size = self.config.max_concurrent_requests.max(1);
        let chunks: Vec<&[String]> = prompts.chunks(chunk_size).collect();
        let admission = Arc::new(Semaphore::new(chunk_size));

        obs::emit_batch_started(prompts.len(), chunk_size, chunks.len());

        let mut records = Vec::with_capacity(prompts.len());
        let mut metrics = BatchMetrics::default();
        for (index, chunk) in chunks.iter().enumerate() {
            let chunk_records = self.run_chunk(chunk, &admission).await;

            let chunk_metrics = BatchMetrics::tally(&chunk_records);
            obs::emit_chunk_finished(
                index + 1,
                chunks.len(),
                chunk_metrics.evaluations_scored,
                chunk_metrics.evaluations_failed,
            );
            metrics.merge(&chunk_metrics);
            records.extend(chunk_records);

            if index + 1 < chunks.len() && !self.config.delay_between_batches.is_zero() {
                debug!(delay = ?self.config.delay_between_batches, "pausing between chunks");
                tokio::time::sleep(self.config.delay_between_batches).await;
            }
        }

        obs::emit_batch_finished(
            started.elapsed().as_millis() as u64,
            metrics.evaluations_scored,
            metrics.evaluations_failed,
        );
        metrics.flush();
        (records, metrics)
    }

    async fn run_chunk(&self, chunk: &[String], admission: &Arc<Semaphore>) -> Vec<EvaluationRecord> {
        let handles: Vec<_> = chunk
            .iter()
            .map(|prompt| {
                let pipeline = Pipeline {
                    agent: Arc::clone(&self.agent),
                    judge: Arc::clone(&self.judge),
                    scorer: self.scorer.clone(),
                    config: Arc::clone(&self.config),
                };
                let admission = Arc::clone(admission);
                let prompt = prompt.clone();
                tokio::spawn(async move { pipeline.evaluate(prompt, admission).await })
            })
            .collect();

        // join_all waits for every task; one failure never abandons its siblings
        let outcomes = join_all(handles).await;

        chunk
            .iter()
            .zip(outcomes)
            .map(|(prompt, outcome)| match outcome {
                Ok(Ok(record)) => EvaluationRecord::Scored(record),
                Ok(Err(e)) => failed(prompt, &e),
                Err(join_err) => failed(prompt, &format!("evaluation task failed: {}", join_err)),
            })
            .collect()
    }
}

fn failed(prompt: &str, error: &dyn std::fmt::Display) -> EvaluationRecord {
    obs::emit_item_failed(prompt, error);
    EvaluationRecord::failed(prompt, error.to_string())
}

/// Everything one spawned evaluation needs, owned.
struct Pipeline {
    agent: Arc<dyn Agent>,
    judge: Arc<JudgeClient>,
    scorer: RuleScorer,
    config: Arc<EvalConfig>,
}

impl Pipeline {
    #[instrument(skip_all, fields(prompt = %prompt))]
    async fn evaluate(self, prompt: String, admission: Arc<Semaphore>) -> EvalResult<ScoredRecord> {
        let _permit = admission
            .acquire_owned()
            .await
            .map_err(|e| EvalError::Admission(e.to_string()))?;

        if !self.config.delay_between_requests.is_zero() {
            tokio::time::sleep(self.config.delay_between_requests).await;
        }

        let session = SessionId::mint(SESSION_USER);
        let timeout = self.config.agent_timeout;
        let (reply, token_count) = tokio::time::timeout(timeout, self.agent.ask(&prompt, &session))
            .await
            .map_err(|_| AgentError::Timeout(format!("no reply within {:?}", timeout)))??;

        let rule = self.scorer.score(&reply.answer);

        let verdict = self.judge.grade(&reply.answer).await;
        if let JudgeVerdict::Degraded { reason, .. } = &verdict {
            obs::emit_judge_degraded(&prompt, reason);
        }
        let judge_degraded = verdict.degraded_reason().map(str::to_string);
        let grade = verdict.grade().clone();

        let (final_score, passed) = combine(&rule, &grade, &self.config);
        debug!(final_score, passed, rule_score = rule.score, judge_score = grade.score(), "prompt scored");

        Ok(ScoredRecord {
            prompt,
            answer: reply.answer,
            actions: reply.actions,
            tone: reply.tone,
            token_count,
            rule,
            grade,
            judge_degraded,
            final_score,
            passed,
        })
    }
}
