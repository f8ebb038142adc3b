//! In-memory fakes for the agent contract (testing only)
//!
//! `ScriptedAgent` answers from a per-prompt script and records every call,
//! including how many calls were in flight at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::reply::{Agent, SessionId, StructuredReply};
use crate::AgentResult;

/// Scripted behaviour for one prompt.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(StructuredReply),
    Fail(AgentError),
    /// Panic inside the call, to exercise task isolation.
    Panic(String),
}

/// One recorded `ask` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub session_id: SessionId,
}

/// Agent fake driven by a prompt -> [`Script`] table.
#[derive(Debug)]
pub struct ScriptedAgent {
    scripts: HashMap<String, Script>,
    default_reply: StructuredReply,
    latency: Duration,
    token_count: Option<u64>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for ScriptedAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            default_reply: StructuredReply::new("Thank you for reaching out, happy to help.")
                .with_tone("polite"),
            latency: Duration::ZERO,
            token_count: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply used for prompts without a script.
    pub fn with_default_reply(mut self, reply: StructuredReply) -> Self {
        self.default_reply = reply;
        self
    }

    pub fn with_reply(mut self, prompt: &str, reply: StructuredReply) -> Self {
        self.scripts.insert(prompt.to_string(), Script::Reply(reply));
        self
    }

    pub fn with_failure(mut self, prompt: &str, error: AgentError) -> Self {
        self.scripts.insert(prompt.to_string(), Script::Fail(error));
        self
    }

    pub fn with_panic(mut self, prompt: &str, message: &str) -> Self {
        self.scripts
            .insert(prompt.to_string(), Script::Panic(message.to_string()));
        self
    }

    /// Simulated response time for every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_token_count(mut self, tokens: u64) -> Self {
        self.token_count = Some(tokens);
        self
    }

    /// Highest number of concurrent `ask` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made for `prompt`.
    pub fn calls_for(&self, prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.prompt == prompt)
            .count()
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn ask(
        &self,
        text: &str,
        session_id: &SessionId,
    ) -> AgentResult<(StructuredReply, Option<u64>)> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: text.to_string(),
            session_id: session_id.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.scripts.get(text) {
            Some(Script::Reply(reply)) => Ok((reply.clone(), self.token_count)),
            Some(Script::Fail(err)) => Err(err.clone()),
            Some(Script::Panic(msg)) => panic!("{}", msg),
            None => Ok((self.default_reply.clone(), self.token_count)),
        }
    }
}
