//! Weighted blend of rule and judge scores.

use crate::config::EvalConfig;
use crate::judge::Grade;
use crate::rules::RuleResult;

/// Absorbs binary representation error so `0.4 * 100 + 0.6 * 80` floors to 88.
const FLOOR_EPSILON: f64 = 1e-9;

/// Final score and pass flag for one reply.
///
/// `final = floor(rule_weight * rule + judge_weight * judge)`; a reply
/// passes when `final >= passing_threshold`.
pub fn combine(rule: &RuleResult, grade: &Grade, config: &EvalConfig) -> (i64, bool) {
    let weighted = config.rule_weight * f64::from(rule.score)
        + config.judge_weight * f64::from(grade.score());
    let final_score = (weighted + FLOOR_EPSILON).floor() as i64;
    let passed = final_score >= i64::from(config.passing_threshold);
    (final_score, passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleScorer;

    fn rule(score_text: &str) -> RuleResult {
        RuleScorer::from_config(&EvalConfig::default()).score(score_text)
    }

    fn grade(score: i64) -> Grade {
        Grade::new(score, "judge notes").unwrap()
    }

    #[test]
    fn default_weights() {
        let (score, passed) = combine(&rule("Clean reply."), &grade(80), &EvalConfig::default());
        assert_eq!(score, 88);
        assert!(passed);
    }

    #[test]
    fn floors_fractional_scores() {
        // 0.4 * 80 + 0.6 * 75 = 77.0; 0.4 * 80 + 0.6 * 77 = 78.2
        let emoji = rule("Hi 😊");
        assert_eq!(combine(&emoji, &grade(75), &EvalConfig::default()).0, 77);
        assert_eq!(combine(&emoji, &grade(77), &EvalConfig::default()).0, 78);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = EvalConfig {
            rule_weight: 0.5,
            judge_weight: 0.5,
            ..EvalConfig::default()
        };
        // 0.5 * 100 + 0.5 * 60 = 80
        let (score, passed) = combine(&rule("Fine."), &grade(60), &config);
        assert_eq!(score, 80);
        assert!(passed);

        let (score, passed) = combine(&rule("Fine."), &grade(58), &config);
        assert_eq!(score, 79);
        assert!(!passed);
    }

    #[test]
    fn unnormalized_weights_scale() {
        let config = EvalConfig {
            rule_weight: 1.0,
            judge_weight: 1.0,
            ..EvalConfig::default()
        };
        assert_eq!(combine(&rule("Fine."), &grade(50), &config).0, 150);
    }
}
