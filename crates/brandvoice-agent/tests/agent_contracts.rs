//! Contract tests for the agent surface using the in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use brandvoice_agent::fakes::ScriptedAgent;
use brandvoice_agent::{Agent, AgentError, SessionId, StructuredReply, StyleGuide};

#[tokio::test]
async fn scripted_reply_is_returned_with_token_count() {
    let agent = ScriptedAgent::new()
        .with_reply("where is my order?", StructuredReply::new("It ships today."))
        .with_token_count(42);

    let (reply, tokens) = agent
        .ask("where is my order?", &SessionId::mint("test"))
        .await
        .unwrap();

    assert_eq!(reply.answer, "It ships today.");
    assert_eq!(tokens, Some(42));
}

#[tokio::test]
async fn unscripted_prompt_gets_default_reply() {
    let agent = ScriptedAgent::new().with_default_reply(StructuredReply::new("Default."));
    let (reply, tokens) = agent.ask("anything", &SessionId::mint("test")).await.unwrap();
    assert_eq!(reply.answer, "Default.");
    assert_eq!(tokens, None);
}

#[tokio::test]
async fn scripted_failure_is_returned() {
    let agent = ScriptedAgent::new()
        .with_failure("hi", AgentError::Connection("connection reset".into()));
    let err = agent.ask("hi", &SessionId::mint("test")).await.unwrap_err();
    assert_eq!(err, AgentError::Connection("connection reset".into()));
}

#[tokio::test]
async fn calls_are_recorded_with_session_ids() {
    let agent = ScriptedAgent::new();
    let s1 = SessionId::mint("u");
    let s2 = SessionId::mint("u");
    agent.ask("a", &s1).await.unwrap();
    agent.ask("a", &s2).await.unwrap();
    agent.ask("b", &s1).await.unwrap();

    assert_eq!(agent.calls_for("a"), 2);
    assert_eq!(agent.calls_for("b"), 1);
    let calls = agent.calls();
    assert_eq!(calls[0].session_id, s1);
    assert_eq!(calls[1].session_id, s2);
}

#[tokio::test(start_paused = true)]
async fn in_flight_high_water_mark_is_tracked() {
    let agent = Arc::new(ScriptedAgent::new().with_latency(Duration::from_millis(100)));

    let mut handles = Vec::new();
    for i in 0..3 {
        let agent = Arc::clone(&agent);
        handles.push(tokio::spawn(async move {
            agent
                .ask(&format!("q{i}"), &SessionId::mint("test"))
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(agent.max_in_flight(), 3);
}

#[test]
fn style_guide_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("style_guide.yaml");
    std::fs::write(
        &path,
        "brand: Lumen\ntone:\n  persons:\n    alex:\n      name: Alex\n      person: calm\n",
    )
    .unwrap();

    let guide = StyleGuide::load(&path).unwrap();
    let alex = guide.persona("alex").unwrap();
    assert_eq!(alex.brand(), "Lumen");
    assert_eq!(alex.description(), "calm");
}

#[test]
fn missing_style_guide_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = StyleGuide::load(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("not readable"));
}
