//! Validated judge grades.

use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// Shortest acceptable justification, counted on trimmed text.
pub const MIN_NOTES_CHARS: usize = 5;

/// Neutral score substituted when the judge cannot be trusted.
pub const NEUTRAL_SCORE: u8 = 50;

/// Unvalidated `{score, notes}` payload as returned by a judge backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrade {
    pub score: i64,
    #[serde(default)]
    pub notes: String,
}

impl RawGrade {
    pub fn new(score: i64, notes: impl Into<String>) -> Self {
        Self {
            score,
            notes: notes.into(),
        }
    }
}

/// Judge score in 0..=100 with a meaningful justification.
///
/// Only constructible through validation; deserialisation validates too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrade")]
pub struct Grade {
    score: u8,
    notes: String,
}

impl Grade {
    pub fn new(score: i64, notes: impl Into<String>) -> Result<Self, GradeError> {
        let notes = notes.into();
        if !(0..=100).contains(&score) {
            return Err(GradeError::ScoreOutOfRange(score));
        }
        if notes.trim().chars().count() < MIN_NOTES_CHARS {
            return Err(GradeError::NotesTooShort {
                min: MIN_NOTES_CHARS,
            });
        }
        Ok(Self {
            score: score as u8,
            notes,
        })
    }

    /// Neutral grade recorded when grading failed.
    pub fn neutral(reason: &str) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            notes: format!("[ERROR] Grading failed: {}. Assigned neutral score.", reason),
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Same score, `note` appended to the notes.
    pub(crate) fn annotated(self, note: &str) -> Self {
        Self {
            score: self.score,
            notes: format!("{} {}", self.notes, note),
        }
    }
}

impl TryFrom<RawGrade> for Grade {
    type Error = GradeError;

    fn try_from(raw: RawGrade) -> Result<Self, Self::Error> {
        Grade::new(raw.score, raw.notes)
    }
}

/// Result of grading one reply.
///
/// `Degraded` carries the neutral grade used in place of the judge's output
/// and the reason the real output could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JudgeVerdict {
    Ok { grade: Grade },
    Degraded { grade: Grade, reason: String },
}

impl JudgeVerdict {
    pub fn degraded(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        JudgeVerdict::Degraded {
            grade: Grade::neutral(&reason),
            reason,
        }
    }

    pub fn grade(&self) -> &Grade {
        match self {
            JudgeVerdict::Ok { grade } | JudgeVerdict::Degraded { grade, .. } => grade,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, JudgeVerdict::Degraded { .. })
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            JudgeVerdict::Ok { .. } => None,
            JudgeVerdict::Degraded { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(Grade::new(0, "terrible tone").unwrap().score(), 0);
        assert_eq!(Grade::new(100, "flawless reply").unwrap().score(), 100);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            Grade::new(101, "too generous").unwrap_err(),
            GradeError::ScoreOutOfRange(101)
        );
        assert_eq!(
            Grade::new(-1, "negative score").unwrap_err(),
            GradeError::ScoreOutOfRange(-1)
        );
    }

    #[test]
    fn rejects_near_empty_notes() {
        assert!(Grade::new(70, "").is_err());
        assert!(Grade::new(70, "  ok  ").is_err());
        assert!(Grade::new(70, "fine!").is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Grade = serde_json::from_str(r#"{"score": 85, "notes": "warm and concise"}"#)
            .expect("valid grade");
        assert_eq!(ok.score(), 85);

        assert!(serde_json::from_str::<Grade>(r#"{"score": 150, "notes": "too high"}"#).is_err());
        assert!(serde_json::from_str::<Grade>(r#"{"score": 60}"#).is_err());
    }

    #[test]
    fn neutral_grade_is_fifty_and_explains() {
        let g = Grade::neutral("timeout");
        assert_eq!(g.score(), NEUTRAL_SCORE);
        assert!(g.notes().contains("Grading failed: timeout"));
    }

    #[test]
    fn annotation_keeps_score() {
        let g = Grade::new(30, "rude tone").unwrap().annotated("[WARNING]");
        assert_eq!(g.score(), 30);
        assert_eq!(g.notes(), "rude tone [WARNING]");
    }

    #[test]
    fn verdict_accessors() {
        let ok = JudgeVerdict::Ok {
            grade: Grade::new(90, "on brand voice").unwrap(),
        };
        assert!(!ok.is_degraded());
        assert_eq!(ok.degraded_reason(), None);
        assert_eq!(ok.grade().score(), 90);

        let degraded = JudgeVerdict::degraded("malformed output");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.degraded_reason(), Some("malformed output"));
        assert_eq!(degraded.grade().score(), 50);
    }
}
