//! Structured lifecycle events for evaluation batches.
//!
//! Every event carries an `event` field (`batch.started`, `eval.item_failed`,
//! ...) so log pipelines can filter on it. Use
//! [`crate::telemetry::init_tracing`] with `json = true` for machine output.

use std::path::Path;

use tracing::{info, warn};

/// Batch-scoped span; attach it to the batch future with
/// [`tracing::Instrument::instrument`].
///
/// ```ignore
/// runner.run(prompts).instrument(batch_span("style_eval", 12)).await;
/// // every event inside is tagged with batch = "style_eval"
/// ```
pub fn batch_span(batch: &str, prompts: usize) -> tracing::Span {
    tracing::info_span!("brandvoice.batch", batch = %batch, prompts = prompts)
}

pub fn emit_batch_started(prompts: usize, chunk_size: usize, chunks: usize) {
    info!(
        event = "batch.started",
        prompts = prompts,
        chunk_size = chunk_size,
        chunks = chunks,
    );
}

pub fn emit_chunk_finished(chunk: usize, chunks: usize, scored: u64, failed: u64) {
    info!(
        event = "batch.chunk_finished",
        chunk = chunk,
        chunks = chunks,
        scored = scored,
        failed = failed,
    );
}

/// Warning level: the prompt produced no score.
pub fn emit_item_failed(prompt: &str, error: &dyn std::fmt::Display) {
    warn!(event = "eval.item_failed", prompt = %prompt, error = %error);
}

pub fn emit_judge_degraded(prompt: &str, reason: &str) {
    warn!(event = "judge.degraded", prompt = %prompt, reason = %reason);
}

pub fn emit_batch_finished(duration_ms: u64, scored: u64, failed: u64) {
    info!(
        event = "batch.finished",
        duration_ms = duration_ms,
        scored = scored,
        failed = failed,
    );
}

pub fn emit_report_written(path: &Path, scored: usize, failed: usize) {
    info!(
        event = "report.written",
        path = %path.display(),
        scored = scored,
        failed = failed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_and_events_do_not_panic() {
        let _span = batch_span("test-batch", 3).entered();
        emit_batch_started(3, 2, 2);
        emit_item_failed("p", &"boom");
        emit_batch_finished(10, 2, 1);
    }
}
