//! Batch runner isolation, admission and pacing tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use brandvoice_agent::fakes::ScriptedAgent;
use brandvoice_agent::{AgentError, Persona, StructuredReply, StyleGuide};
use brandvoice_eval::fakes::ScriptedJudge;
use brandvoice_eval::{
    BatchMetrics, BatchRunner, EvalConfig, EvaluationRecord, JudgeClient, JudgeError, RawGrade, SummaryStatus,
};

fn persona() -> Persona {
    StyleGuide::from_yaml_str(
        r#"
brand: Lumen
tone:
  persons:
    alex:
      name: Alex
      person: warm, concise, professional
      avoid: ["slang"]
      must_include: ["thank you"]
"#,
    )
    .unwrap()
    .persona("alex")
    .unwrap()
}

fn fast_config(max_concurrent: usize) -> EvalConfig {
    EvalConfig {
        max_concurrent_requests: max_concurrent,
        delay_between_batches: Duration::ZERO,
        delay_between_requests: Duration::ZERO,
        ..EvalConfig::default()
    }
}

fn runner(agent: Arc<ScriptedAgent>, judge: ScriptedJudge, config: EvalConfig) -> BatchRunner {
    runner_with(agent, Arc::new(judge), config)
}

fn runner_with(
    agent: Arc<ScriptedAgent>,
    judge: Arc<ScriptedJudge>,
    config: EvalConfig,
) -> BatchRunner {
    let judge = JudgeClient::new(judge, &persona(), &config);
    BatchRunner::new(agent, Arc::new(judge), config)
}

fn prompts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("question {}", i)).collect()
}

#[tokio::test]
async fn forced_failures_partition_the_batch() {
    let agent = Arc::new(
        ScriptedAgent::new()
            .with_failure("question 1", AgentError::Timeout("upstream slow".into()))
            .with_failure("question 3", AgentError::Authentication("bad key".into())),
    );
    let runner = runner(agent, ScriptedJudge::new(), fast_config(2));

    let input = prompts(5);
    let records = runner.run(&input).await;

    assert_eq!(records.len(), 5);
    let failed: Vec<&str> = records
        .iter()
        .filter(|r| !r.is_scored())
        .map(|r| r.prompt())
        .collect();
    assert_eq!(failed, vec!["question 1", "question 3"]);

    let report = brandvoice_eval::compile(&records, runner.config());
    assert_eq!(report.cases.len(), 3);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[1].error.contains("bad key"));

    let seen: HashSet<&str> = records.iter().map(|r| r.prompt()).collect();
    for p in &input {
        assert!(seen.contains(p.as_str()), "{} missing from records", p);
    }
}

#[tokio::test(start_paused = true)]
async fn in_flight_pipelines_never_exceed_limit() {
    let agent = Arc::new(ScriptedAgent::new().with_latency(Duration::from_millis(300)));
    let judge = Arc::new(ScriptedJudge::new().with_latency(Duration::from_millis(100)));
    let runner = runner_with(Arc::clone(&agent), Arc::clone(&judge), fast_config(2));

    let records = runner.run(&prompts(5)).await;

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(EvaluationRecord::is_scored));
    // chunks of two start together, so the limit is reached exactly
    assert_eq!(agent.max_in_flight(), 2);
    assert!(judge.max_in_flight() <= 2, "saw {}", judge.max_in_flight());
    assert_eq!(judge.call_count(), 5);
}

#[tokio::test]
async fn failed_prompt_is_never_retried() {
    let agent = Arc::new(
        ScriptedAgent::new().with_failure("question 2", AgentError::Connection("reset".into())),
    );
    let runner = runner(Arc::clone(&agent), ScriptedJudge::new(), fast_config(3));

    let records = runner.run(&prompts(4)).await;

    assert_eq!(agent.calls_for("question 2"), 1);
    let errors: Vec<_> = records.iter().filter_map(|r| r.as_failed()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].prompt, "question 2");
}

#[tokio::test]
async fn panicking_pipeline_fails_only_its_prompt() {
    let agent = Arc::new(ScriptedAgent::new().with_panic("question 0", "agent exploded"));
    let runner = runner(agent, ScriptedJudge::new(), fast_config(3));

    let records = runner.run(&prompts(3)).await;

    assert_eq!(records.len(), 3);
    let failed = records[0].as_failed().expect("first prompt must fail");
    assert_eq!(failed.prompt, "question 0");
    assert!(failed.error.contains("panicked"), "{}", failed.error);
    assert!(records[1].is_scored());
    assert!(records[2].is_scored());
}

#[tokio::test]
async fn every_pipeline_gets_a_fresh_session() {
    let agent = Arc::new(ScriptedAgent::new());
    let runner = runner(Arc::clone(&agent), ScriptedJudge::new(), fast_config(2));

    runner.run(&prompts(4)).await;

    let calls = agent.calls();
    let sessions: HashSet<_> = calls.iter().map(|c| c.session_id.clone()).collect();
    assert_eq!(sessions.len(), 4);
    assert!(calls
        .iter()
        .all(|c| c.session_id.as_str().starts_with("style_eval_")));
}

#[tokio::test(start_paused = true)]
async fn delays_pace_chunks_and_requests() {
    let agent = Arc::new(ScriptedAgent::new());
    let config = EvalConfig {
        max_concurrent_requests: 2,
        delay_between_batches: Duration::from_secs(1),
        delay_between_requests: Duration::from_millis(200),
        ..EvalConfig::default()
    };
    let runner = runner(agent, ScriptedJudge::new(), config);

    let started = tokio::time::Instant::now();
    let records = runner.run(&prompts(5)).await;
    let elapsed = started.elapsed();

    assert_eq!(records.len(), 5);
    // three chunks: two inter-chunk pauses plus one request delay per chunk
    assert!(elapsed >= Duration::from_millis(2600), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2700), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn stuck_agent_times_out_into_failed_record() {
    let agent = Arc::new(ScriptedAgent::new().with_latency(Duration::from_secs(60)));
    let config = EvalConfig {
        agent_timeout: Duration::from_secs(1),
        ..fast_config(2)
    };
    let runner = runner(agent, ScriptedJudge::new(), config);

    let records = runner.run(&prompts(1)).await;

    let failed = records[0].as_failed().expect("timed out prompt fails");
    assert!(failed.error.contains("timed out"), "{}", failed.error);
}

#[tokio::test]
async fn judge_failure_degrades_instead_of_failing() {
    let agent = Arc::new(
        ScriptedAgent::new()
            .with_reply("question 0", StructuredReply::new("Thank you, it ships today.")),
    );
    let judge = ScriptedJudge::new().with_error("ships today", JudgeError::Http("502".into()));
    let runner = runner(agent, judge, fast_config(2));

    let records = runner.run(&prompts(2)).await;

    let degraded = records[0].as_scored().expect("degraded grade still scores");
    assert_eq!(degraded.grade.score(), 50);
    assert!(degraded.judge_degraded.is_some());
    // 0.4 * 100 + 0.6 * 50
    assert_eq!(degraded.final_score, 70);
    assert!(!degraded.passed);

    let normal = records[1].as_scored().unwrap();
    assert!(normal.judge_degraded.is_none());
}

#[tokio::test]
async fn scored_record_carries_reply_and_rules() {
    let agent = Arc::new(
        ScriptedAgent::new()
            .with_reply(
                "question 0",
                StructuredReply::new("Great news 🎉!!!")
                    .with_action("Check your inbox")
                    .with_tone("excited"),
            )
            .with_token_count(17),
    );
    let judge = ScriptedJudge::new().with_grade(
        "Great news",
        RawGrade::new(60, "Too excited, uses emoji and shouting."),
    );
    let runner = runner(agent, judge, fast_config(1));

    let records = runner.run(&prompts(1)).await;
    let rec = records[0].as_scored().unwrap();

    assert_eq!(rec.answer, "Great news 🎉!!!");
    assert_eq!(rec.actions, vec!["Check your inbox"]);
    assert_eq!(rec.tone, "excited");
    assert_eq!(rec.token_count, Some(17));
    assert_eq!(rec.rule.score, 70);
    // 0.4 * 70 + 0.6 * 60 = 64
    assert_eq!(rec.final_score, 64);
    assert!(!rec.passed);
}

#[tokio::test]
async fn empty_batch_yields_empty_input_report() {
    let runner = runner(Arc::new(ScriptedAgent::new()), ScriptedJudge::new(), fast_config(5));
    let report = runner.evaluate(&[]).await;
    assert_eq!(report.summary.status, SummaryStatus::EmptyInput);
    assert!(report.cases.is_empty());
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn all_failures_yield_all_failed_report() {
    let agent = Arc::new(
        ScriptedAgent::new()
            .with_failure("question 0", AgentError::Connection("down".into()))
            .with_failure("question 1", AgentError::Connection("down".into())),
    );
    let runner = runner(agent, ScriptedJudge::new(), fast_config(5));
    let report = runner.evaluate(&prompts(2)).await;
    assert_eq!(report.summary.status, SummaryStatus::AllFailed);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.summary.pass_rate, 0.0);
}

#[tokio::test]
async fn metrics_cover_only_their_own_run() {
    let agent = Arc::new(
        ScriptedAgent::new()
            .with_reply("question 0", StructuredReply::new("Thank you, it ships today."))
            .with_failure("question 2", AgentError::Connection("reset".into())),
    );
    let judge = ScriptedJudge::new().with_error("ships today", JudgeError::Http("502".into()));
    let runner = runner(agent, judge, fast_config(2));

    let (records, first) = runner.run_with_metrics(&prompts(3)).await;
    assert_eq!(first, BatchMetrics::tally(&records));
    assert_eq!(first.evaluations_started, 3);
    assert_eq!(first.evaluations_scored, 2);
    assert_eq!(first.evaluations_failed, 1);
    assert_eq!(first.grades_degraded, 1);

    let (_, second) = runner
        .run_with_metrics(&["question 1".to_string(), "question 3".to_string()])
        .await;
    assert_eq!(second.evaluations_started, 2);
    assert_eq!(second.evaluations_scored, 2);
    assert_eq!(second.evaluations_failed, 0);
    assert_eq!(second.grades_degraded, 0);
}
