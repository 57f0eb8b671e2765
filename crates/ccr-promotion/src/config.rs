use serde::{Deserialize, Serialize};

/// Default minimum improvement a challenger needs over the champion.
pub const DEFAULT_THRESHOLD: f64 = 0.005;
pub const DEFAULT_METRIC: &str = "roc_auc";
pub const DEFAULT_CHAMPION_ALIAS: &str = "champion";
pub const DEFAULT_REJECTION_TAG_KEY: &str = "promotion_decision";

/// Inclusive range a comparison metric must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub min: f64,
    pub max: f64,
}

impl ScoreBounds {
    /// Bounds for probability-style metrics such as ROC-AUC.
    pub const UNIT: ScoreBounds = ScoreBounds { min: 0.0, max: 1.0 };

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Promotion policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    /// Minimum `challenger - champion` improvement. Inclusive.
    pub threshold: f64,
    /// Run metric both versions are compared on.
    pub metric: String,
    /// Alias naming the production version.
    pub champion_alias: String,
    /// Version tag key that carries the rejection annotation.
    pub rejection_tag_key: String,
    pub score_bounds: ScoreBounds,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: DEFAULT_METRIC.to_string(),
            champion_alias: DEFAULT_CHAMPION_ALIAS.to_string(),
            rejection_tag_key: DEFAULT_REJECTION_TAG_KEY.to_string(),
            score_bounds: ScoreBounds::UNIT,
        }
    }
}

impl PromotionConfig {
    /// Stable-ordered list of configuration problems (empty when valid).
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.threshold.is_finite() {
            out.push(format!("threshold must be finite, got {}", self.threshold));
        }
        if self.metric.trim().is_empty() {
            out.push("metric must not be empty".to_string());
        }
        if self.champion_alias.trim().is_empty() {
            out.push("champion_alias must not be empty".to_string());
        }
        if self.rejection_tag_key.trim().is_empty() {
            out.push("rejection_tag_key must not be empty".to_string());
        }
        let b = self.score_bounds;
        if !b.min.is_finite() || !b.max.is_finite() || b.min > b.max {
            out.push(format!(
                "score_bounds must be a finite range, got [{}, {}]",
                b.min, b.max
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = PromotionConfig::default();
        assert!(c.problems().is_empty());
        assert_eq!(c.threshold, 0.005);
        assert_eq!(c.champion_alias, "champion");
    }

    #[test]
    fn problems_are_reported_in_field_order() {
        let c = PromotionConfig {
            threshold: f64::NAN,
            metric: " ".into(),
            score_bounds: ScoreBounds { min: 1.0, max: 0.0 },
            ..PromotionConfig::default()
        };
        let p = c.problems();
        assert_eq!(p.len(), 3);
        assert!(p[0].contains("threshold"));
        assert!(p[1].contains("metric"));
        assert!(p[2].contains("score_bounds"));
    }

    #[test]
    fn partial_yaml_style_json_fills_defaults() {
        let c: PromotionConfig = serde_json::from_str(r#"{"threshold": 0.01}"#).unwrap();
        assert_eq!(c.threshold, 0.01);
        assert_eq!(c.metric, "roc_auc");
        assert_eq!(c.score_bounds, ScoreBounds::UNIT);
    }
}
