//! OpenAI-compatible chat-completions judge backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{JudgeBackend, JudgePrompt, RawGrade};
use crate::error::JudgeError;

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Judge endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeSettings {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        JudgeSettings {
            api_url: std::env::var("BRANDVOICE_JUDGE_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: std::env::var("BRANDVOICE_JUDGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: std::env::var("BRANDVOICE_JUDGE_API_KEY").ok(),
            temperature: 0.3,
            timeout: Duration::from_secs(15),
        }
    }
}

impl JudgeSettings {
    /// Settings from `BRANDVOICE_JUDGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn new(api_url: &str, model: &str) -> Self {
        JudgeSettings {
            api_url: api_url.to_string(),
            model: model.to_string(),
            api_key: None,
            temperature: 0.3,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Judge backed by a chat-completions HTTP endpoint.
pub struct HttpJudgeBackend {
    settings: JudgeSettings,
    http_client: reqwest::Client,
}

impl HttpJudgeBackend {
    pub fn new(settings: JudgeSettings) -> Result<Self, JudgeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("brandvoice-eval/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()?;

        Ok(HttpJudgeBackend {
            settings,
            http_client,
        })
    }

    pub fn settings(&self) -> &JudgeSettings {
        &self.settings
    }

    fn request_body(&self, prompt: &JudgePrompt) -> Value {
        let mut messages: Vec<Value> = prompt
            .system
            .iter()
            .map(|line| json!({ "role": "system", "content": line }))
            .collect();
        messages.push(json!({ "role": "user", "content": prompt.human }));

        json!({
            "model": self.settings.model,
            "temperature": self.settings.temperature,
            "response_format": { "type": "json_object" },
            "messages": messages,
        })
    }
}

#[async_trait]
impl JudgeBackend for HttpJudgeBackend {
    async fn complete(&self, prompt: &JudgePrompt) -> Result<RawGrade, JudgeError> {
        let url = self.settings.completions_url();
        debug!(url = %url, model = %self.settings.model, "Sending judge request");

        let mut request = self.http_client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| JudgeError::MalformedOutput("response has no choices".into()))?;

        parse_grade_content(&content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Pull the first JSON object out of a model reply and read it as a grade.
///
/// Models sometimes wrap the object in prose or code fences; anything before
/// the first `{` and after the object is ignored.
pub fn parse_grade_content(content: &str) -> Result<RawGrade, JudgeError> {
    let start = content
        .find('{')
        .ok_or_else(|| JudgeError::MalformedOutput(format!("no JSON object in {:?}", content)))?;

    let value = serde_json::Deserializer::from_str(&content[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| JudgeError::MalformedOutput("empty judge output".into()))?
        .map_err(|e| JudgeError::MalformedOutput(e.to_string()))?;

    let score = value
        .get("score")
        .and_then(score_as_i64)
        .ok_or_else(|| JudgeError::MalformedOutput(format!("missing integer score in {}", value)))?;
    let notes = value
        .get("notes")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(RawGrade::new(score, notes))
}

/// Integral numbers only; `85.0` counts, `85.5` does not.
fn score_as_i64(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}
