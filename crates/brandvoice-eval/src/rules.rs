//! Deterministic rule checks on a reply.

use serde::{Deserialize, Serialize};

use crate::config::EvalConfig;

/// A rule the reply broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    EmojiFound,
    ExcessiveExclamation,
    TooLong,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Violation::EmojiFound => "emoji_found",
            Violation::ExcessiveExclamation => "excessive_exclamation",
            Violation::TooLong => "too_long",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw observations behind the rule score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChecks {
    pub has_emoji: bool,
    pub has_triple_exclamation: bool,
    /// Length in characters.
    pub length: usize,
    pub exceeds_max_length: bool,
}

/// Outcome of the rule checks for one reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    /// 0..=100
    pub score: u8,
    /// In check order.
    pub violations: Vec<Violation>,
    pub checks: RuleChecks,
}

/// Penalty-based scorer. Stateless after construction, so it is shared
/// between concurrent pipelines without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleScorer {
    emoji_penalty: u32,
    exclamation_penalty: u32,
    length_penalty: u32,
    max_length: usize,
}

impl RuleScorer {
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            emoji_penalty: config.emoji_penalty,
            exclamation_penalty: config.exclamation_penalty,
            length_penalty: config.length_penalty,
            max_length: config.max_length,
        }
    }

    pub fn score(&self, text: &str) -> RuleResult {
        let length = text.chars().count();
        let checks = RuleChecks {
            has_emoji: contains_emoji(text),
            has_triple_exclamation: text.contains("!!!"),
            length,
            exceeds_max_length: length > self.max_length,
        };

        let mut score: i64 = 100;
        let mut violations = Vec::new();

        if checks.has_emoji {
            score -= i64::from(self.emoji_penalty);
            violations.push(Violation::EmojiFound);
        }
        if checks.has_triple_exclamation {
            score -= i64::from(self.exclamation_penalty);
            violations.push(Violation::ExcessiveExclamation);
        }
        if checks.exceeds_max_length {
            score -= i64::from(self.length_penalty);
            violations.push(Violation::TooLong);
        }

        RuleResult {
            score: score.clamp(0, 100) as u8,
            violations,
            checks,
        }
    }
}

/// True when any character (or regional-indicator pair) is an emoji in the
/// Unicode emoji data.
pub fn contains_emoji(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| {
        is_emoji(c) || chars.get(i + 1).is_some_and(|&next| is_flag(c, next))
    })
}

/// Looks the character up as-is and in emoji presentation (`U+FE0F`), so
/// text-default emoji such as `☀` count too. ASCII never matches on its own.
fn is_emoji(c: char) -> bool {
    if c.is_ascii() {
        return false;
    }
    let mut buf = String::with_capacity(8);
    buf.push(c);
    if emojis::get(&buf).is_some() {
        return true;
    }
    buf.push('\u{FE0F}');
    emojis::get(&buf).is_some()
}

fn is_flag(first: char, second: char) -> bool {
    let mut buf = String::with_capacity(8);
    buf.push(first);
    buf.push(second);
    emojis::get(&buf).is_some()
}
