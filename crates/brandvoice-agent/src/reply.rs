//! The agent call surface consumed by evaluators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AgentResult;

/// A source reference attached to a grounded answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub page: Option<u32>,
    pub snippet: String,
}

impl Citation {
    /// A citation counts only when source and snippet carry text and a page is set.
    pub fn is_valid(&self) -> bool {
        self.page.is_some() && !self.source.trim().is_empty() && !self.snippet.trim().is_empty()
    }
}

/// Structured reply produced by the support agent for one user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReply {
    /// Main answer sentence shown to the customer.
    pub answer: String,

    /// Step-by-step actions or clarifications.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Supporting citations (empty for FAQ-only answers).
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Self-reported confidence label.
    #[serde(default)]
    pub confidence: String,

    /// Self-assessment of whether the reply stayed within the persona's tone.
    #[serde(default)]
    pub tone: String,
}

impl StructuredReply {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// True when at least one citation passes [`Citation::is_valid`].
    pub fn has_valid_citations(&self) -> bool {
        self.citations.iter().any(Citation::is_valid)
    }
}

impl std::fmt::Display for StructuredReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.answer, self.actions.join("\n"))
    }
}

/// Conversation identifier handed to the agent.
///
/// Minted fresh per evaluation so concurrent evaluations never share
/// conversational state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Mint a new session id scoped to `user_id`.
    pub fn mint(user_id: &str) -> Self {
        SessionId(format!("{}_{}", user_id, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The customer-support agent.
///
/// Implementations wrap a hosted model; evaluators only see this trait.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer `text` within conversation `session_id`.
    ///
    /// Returns the structured reply and the token count reported by the
    /// model, when available.
    async fn ask(
        &self,
        text: &str,
        session_id: &SessionId,
    ) -> AgentResult<(StructuredReply, Option<u64>)>;
}
