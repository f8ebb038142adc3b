//! Error types for brandvoice-agent

use thiserror::Error;

/// Failures surfaced by an agent call.
///
/// Variants mirror the transport failures a hosted model can produce. The
/// batch engine treats all of them as per-item failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The agent did not answer within its deadline
    #[error("agent request timed out: {0}")]
    Timeout(String),

    /// The agent service could not be reached
    #[error("agent connection failed: {0}")]
    Connection(String),

    /// Credentials were rejected by the agent service
    #[error("agent authentication failed: {0}")]
    Authentication(String),

    /// The agent answered but the reply could not be parsed
    #[error("agent returned an invalid reply: {0}")]
    InvalidReply(String),

    /// Anything else
    #[error("agent error: {0}")]
    Other(String),
}

impl AgentError {
    /// Whether an interactive session should stop after this error.
    ///
    /// Only authentication failures end a session; batch mode ignores this.
    pub fn is_session_terminal(&self) -> bool {
        matches!(self, AgentError::Authentication(_))
    }
}

/// Errors that can occur while loading the style guide
#[derive(Error, Debug)]
pub enum PersonaError {
    /// Style guide file could not be read
    #[error("style guide not readable at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML did not match the style guide schema
    #[error("invalid style guide: {0}")]
    Invalid(#[from] serde_yaml::Error),

    /// Requested persona is not defined
    #[error("persona '{name}' not found; available personas: {available:?}")]
    UnknownPersona { name: String, available: Vec<String> },
}

/// Errors that can occur while parsing an order snapshot
#[derive(Error, Debug)]
pub enum OrderBookError {
    /// JSON did not match the order schema
    #[error("invalid order snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_failure_is_session_terminal() {
        assert!(AgentError::Authentication("bad key".into()).is_session_terminal());
        assert!(!AgentError::Timeout("15s".into()).is_session_terminal());
        assert!(!AgentError::Connection("reset".into()).is_session_terminal());
        assert!(!AgentError::Other("boom".into()).is_session_terminal());
    }

    #[test]
    fn unknown_persona_lists_available() {
        let err = PersonaError::UnknownPersona {
            name: "pahom".to_string(),
            available: vec!["alex".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("pahom"));
        assert!(msg.contains("alex"));
    }
}
