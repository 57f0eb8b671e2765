use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::{PromotionConfig, ScoreBounds};
use crate::error::{PromotionError, PromotionResult};
use crate::types::{Challenger, Champion, PromotionDecision, ScoreRole};

/// Absolute tolerance applied at the threshold boundary, so that an
/// improvement equal to the threshold up to float rounding still promotes.
pub const BOUNDARY_EPSILON: f64 = 1e-12;

// ============================================================================
// Public API
// ============================================================================

/// Reject NaN, infinite and out-of-bounds scores.
pub fn validate_score(
    model: &str,
    role: ScoreRole,
    version: u64,
    score: f64,
    bounds: ScoreBounds,
) -> PromotionResult<f64> {
    let reason = if score.is_nan() {
        Some("score is NaN".to_string())
    } else if score.is_infinite() {
        Some("score is infinite".to_string())
    } else if !bounds.contains(score) {
        Some(format!(
            "score outside bounds [{}, {}]",
            bounds.min, bounds.max
        ))
    } else {
        None
    };

    match reason {
        None => Ok(score),
        Some(reason) => Err(PromotionError::InvalidScore {
            model: model.to_string(),
            role,
            version,
            value: Some(score),
            reason,
        }),
    }
}

/// True when `improvement` meets `threshold` (inclusive).
pub fn meets_threshold(improvement: f64, threshold: f64) -> bool {
    improvement >= threshold - BOUNDARY_EPSILON
}

/// Compare a challenger with the champion. Pure: no registry access.
///
/// Scores must already be validated; this function only decides.
pub fn decide(
    config: &PromotionConfig,
    model: &str,
    challenger: &Challenger,
    champion: &Champion,
) -> PromotionDecision {
    let improvement = challenger.score - champion.score;
    let promoted = meets_threshold(improvement, config.threshold);

    let reason = if promoted {
        format!(
            "{} improvement {:+.6} >= threshold {:.6}: v{} replaces v{} as @{}",
            config.metric,
            improvement,
            config.threshold,
            challenger.version,
            champion.version,
            config.champion_alias
        )
    } else {
        format!(
            "{} improvement {:+.6} < threshold {:.6}: v{} stays @{}",
            config.metric,
            improvement,
            config.threshold,
            champion.version,
            config.champion_alias
        )
    };

    PromotionDecision {
        model_name: model.to_string(),
        metric: config.metric.clone(),
        challenger_version: challenger.version,
        champion_version: champion.version,
        challenger_score: challenger.score,
        champion_score: champion.score,
        threshold: config.threshold,
        improvement,
        promoted,
        reason,
    }
}

/// Description written onto a demoted champion. Any previous description is
/// kept after the demotion line.
pub fn demotion_description(
    decision: &PromotionDecision,
    alias: &str,
    previous: Option<&str>,
    at: DateTime<Utc>,
) -> String {
    let head = format!(
        "Demoted from @{alias} on {}: replaced by v{} ({} {:.4} vs {:.4}, improvement {:+.4}).",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        decision.challenger_version,
        decision.metric,
        decision.challenger_score,
        decision.champion_score,
        decision.improvement,
    );
    match previous.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prev) => format!("{head}\nPrevious description: {prev}"),
        None => head,
    }
}

/// Structured annotation stored under the rejection tag key of a rejected
/// challenger.
pub fn rejection_annotation(decision: &PromotionDecision) -> serde_json::Value {
    json!({
        "decision": "rejected",
        "metric": decision.metric,
        "challenger_score": decision.challenger_score,
        "champion_score": decision.champion_score,
        "champion_version": decision.champion_version,
        "improvement": decision.improvement,
        "threshold": decision.threshold,
        "reason": decision.reason,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn challenger(score: f64) -> Challenger {
        Challenger {
            version: 2,
            run_id: "run-2".into(),
            score,
        }
    }

    fn champion(score: f64) -> Champion {
        Champion {
            version: 1,
            run_id: "run-1".into(),
            score,
            description: None,
        }
    }

    fn decision(c: f64, ch: f64) -> PromotionDecision {
        decide(&PromotionConfig::default(), "m", &challenger(c), &champion(ch))
    }

    #[test]
    fn clear_improvement_promotes() {
        let d = decision(0.768, 0.760);
        assert!(d.promoted);
        assert!((d.improvement - 0.008).abs() < 1e-12);
        assert!(d.reason.contains("v2 replaces v1"));
    }

    #[test]
    fn small_improvement_rejects() {
        let d = decision(0.762, 0.760);
        assert!(!d.promoted);
        assert!(d.reason.contains("v1 stays @champion"));
    }

    #[test]
    fn exact_threshold_promotes() {
        assert!(decision(0.765, 0.760).promoted);
    }

    #[test]
    fn regression_rejects() {
        let d = decision(0.700, 0.760);
        assert!(!d.promoted);
        assert!(d.improvement < 0.0);
    }

    #[test]
    fn decision_echoes_inputs() {
        let d = decision(0.768, 0.760);
        assert_eq!(d.model_name, "m");
        assert_eq!(d.metric, "roc_auc");
        assert_eq!(d.challenger_version, 2);
        assert_eq!(d.champion_version, 1);
        assert_eq!(d.threshold, 0.005);
        assert_eq!(d.challenger_score - d.champion_score, d.improvement);
    }

    #[test]
    fn promoted_matches_threshold_comparison_away_from_boundary() {
        let cfg = PromotionConfig::default();
        for i in 0..=100 {
            let c = i as f64 / 100.0;
            for j in 0..=100 {
                let ch = j as f64 / 100.0;
                let d = decide(&cfg, "m", &challenger(c), &champion(ch));
                let diff = c - ch - cfg.threshold;
                if diff.abs() > 1e-9 {
                    assert_eq!(d.promoted, diff > 0.0, "c={c} ch={ch}");
                }
            }
        }
    }

    #[test]
    fn validate_score_rejects_nan_inf_and_out_of_range() {
        let b = ScoreBounds::UNIT;
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.01, 1.2] {
            let err = validate_score("m", ScoreRole::Challenger, 2, bad, b).unwrap_err();
            assert!(matches!(
                err,
                PromotionError::InvalidScore {
                    role: ScoreRole::Challenger,
                    version: 2,
                    ..
                }
            ));
        }
        assert_eq!(validate_score("m", ScoreRole::Champion, 1, 0.0, b).unwrap(), 0.0);
        assert_eq!(validate_score("m", ScoreRole::Champion, 1, 1.0, b).unwrap(), 1.0);
    }

    #[test]
    fn demotion_description_keeps_previous_text() {
        let d = decision(0.768, 0.760);
        let at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let fresh = demotion_description(&d, "champion", None, at);
        assert!(fresh.starts_with("Demoted from @champion on 2026-03-01 12:00:00 UTC"));
        assert!(fresh.contains("replaced by v2"));
        assert!(!fresh.contains("Previous description"));

        let kept = demotion_description(&d, "champion", Some("RF baseline"), at);
        assert!(kept.ends_with("Previous description: RF baseline"));
    }

    #[test]
    fn rejection_annotation_carries_scores() {
        let d = decision(0.762, 0.760);
        let v = rejection_annotation(&d);
        assert_eq!(v["decision"], "rejected");
        assert_eq!(v["challenger_score"], 0.762);
        assert_eq!(v["champion_score"], 0.760);
        assert_eq!(v["champion_version"], 1);
        assert_eq!(v["threshold"], 0.005);
    }
}
