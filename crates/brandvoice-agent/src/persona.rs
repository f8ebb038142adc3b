//! Brand voice configuration.
//!
//! A style guide defines the brand and one or more personas. Evaluators and
//! the judge prompt work from a resolved [`Persona`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersonaError;
use crate::PersonaResult;

/// Fallback used when a persona defines no `no_data` phrase.
pub const DEFAULT_NO_DATA_FALLBACK: &str = "Sorry, I don't have information on this question.";

/// One persona definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetails {
    /// Character name
    pub name: String,
    /// Character description used as the tone reference
    pub person: String,
    /// Phrasing the persona must avoid
    #[serde(default)]
    pub avoid: Vec<String>,
    /// Phrasing the persona must use
    #[serde(default)]
    pub must_include: Vec<String>,
    /// Canned answers for edge cases, keyed by situation (`no_data`, ...)
    #[serde(default)]
    pub fallback: BTreeMap<String, String>,
}

fn default_sentences_max() -> u32 {
    3
}

fn default_bullets() -> bool {
    true
}

/// Tone section of the style guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneConfig {
    pub persons: BTreeMap<String, PersonDetails>,
    #[serde(default = "default_sentences_max")]
    pub sentences_max: u32,
    #[serde(default = "default_bullets")]
    pub bullets: bool,
}

/// Root of the style guide YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleGuide {
    pub brand: String,
    pub tone: ToneConfig,
}

impl StyleGuide {
    /// Parse a style guide from YAML text.
    pub fn from_yaml_str(yaml: &str) -> PersonaResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a style guide file.
    pub fn load(path: &Path) -> PersonaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PersonaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let guide = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), personas = guide.tone.persons.len(), "style guide loaded");
        Ok(guide)
    }

    /// Names of all defined personas, sorted.
    pub fn available_personas(&self) -> Vec<String> {
        self.tone.persons.keys().cloned().collect()
    }

    /// Resolve a persona by key.
    pub fn persona(&self, key: &str) -> PersonaResult<Persona> {
        let details = self
            .tone
            .persons
            .get(key)
            .ok_or_else(|| PersonaError::UnknownPersona {
                name: key.to_string(),
                available: self.available_personas(),
            })?;

        Ok(Persona {
            key: key.to_string(),
            brand: self.brand.clone(),
            details: details.clone(),
            sentences_max: self.tone.sentences_max,
            bullets: self.tone.bullets,
        })
    }
}

/// A persona resolved against its style guide. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    key: String,
    brand: String,
    details: PersonDetails,
    sentences_max: u32,
    bullets: bool,
}

impl Persona {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    /// Tone description of the persona.
    pub fn description(&self) -> &str {
        &self.details.person
    }

    pub fn avoid(&self) -> &[String] {
        &self.details.avoid
    }

    pub fn must_include(&self) -> &[String] {
        &self.details.must_include
    }

    /// Phrase the agent uses when it has no data for a question.
    pub fn no_data_fallback(&self) -> &str {
        self.details
            .fallback
            .get("no_data")
            .map(String::as_str)
            .unwrap_or(DEFAULT_NO_DATA_FALLBACK)
    }

    /// Persona section of the agent's system prompt.
    pub fn system_prompt(&self) -> String {
        let bullet_list = |items: &[String]| {
            items
                .iter()
                .map(|item| format!("  - {}", item))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let layout = if self.bullets {
            "Use lists and bullet points"
        } else {
            "Avoid lists"
        };

        format!(
            "You are {}, a helpful assistant of the {} online store.\n\
             Character: {}\n\n\
             Communication rules:\n\
             Avoid:\n{}\n\n\
             Always use:\n{}\n\n\
             Constraints:\n\
             - At most {} sentences per answer\n\
             - {}\n\n\
             When data is missing: {}",
            self.details.name,
            self.brand,
            self.details.person,
            bullet_list(&self.details.avoid),
            bullet_list(&self.details.must_include),
            self.sentences_max,
            layout,
            self.no_data_fallback(),
        )
    }
}
