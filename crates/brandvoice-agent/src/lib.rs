//! Brandvoice Agent: contracts for the customer-support agent under evaluation
//!
//! This crate defines everything the evaluation engine needs to know about the
//! agent without depending on how the agent is built:
//!
//! ## Layer 0 - Collaborator contracts
//!
//! - `Agent`: async `ask(text, session_id)` returning a `StructuredReply`
//! - `StyleGuide` / `Persona`: brand voice rules loaded from YAML
//! - `OrderBook`: read-only order snapshot injected into whoever needs lookups
//!
//! In-memory fakes for tests live in the `fakes` module.

mod error;
pub mod fakes;
pub mod orders;
pub mod persona;
pub mod reply;

pub use error::{AgentError, OrderBookError, PersonaError};
pub use orders::{Order, OrderBook};
pub use persona::{Persona, PersonDetails, StyleGuide, ToneConfig, DEFAULT_NO_DATA_FALLBACK};
pub use reply::{Agent, Citation, SessionId, StructuredReply};

/// Result type for agent calls
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Result type for persona loading
pub type PersonaResult<T> = std::result::Result<T, PersonaError>;
