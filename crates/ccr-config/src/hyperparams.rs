use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    RandomForest,
    GradientBoosting,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random_forest" | "rf" => Ok(ModelFamily::RandomForest),
            "gradient_boosting" | "gb" => Ok(ModelFamily::GradientBoosting),
            other => bail!("unknown model family '{other}' (random-forest|gradient-boosting)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Balanced,
    Uniform,
}

impl ClassWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassWeight::Balanced => "balanced",
            ClassWeight::Uniform => "uniform",
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    pub n_estimators: u32,
    /// `None` grows trees until leaves are pure.
    pub max_depth: Option<u32>,
    pub min_samples_split: u32,
    pub min_samples_leaf: u32,
    pub class_weight: ClassWeight,
    pub random_state: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 5,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Balanced,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingParams {
    pub n_estimators: u32,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub subsample: f64,
    pub random_state: u64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 4,
            learning_rate: 0.05,
            subsample: 0.8,
            random_state: 42,
        }
    }
}

/// Hyperparameters of one training run, typed per family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum HyperParams {
    RandomForest(RandomForestParams),
    GradientBoosting(GradientBoostingParams),
}

impl HyperParams {
    pub fn family(&self) -> ModelFamily {
        match self {
            HyperParams::RandomForest(_) => ModelFamily::RandomForest,
            HyperParams::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }

    /// Reject values no trainer accepts. All problems are reported at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        match self {
            HyperParams::RandomForest(p) => {
                if p.n_estimators == 0 {
                    problems.push("n_estimators must be >= 1".to_string());
                }
                if p.max_depth == Some(0) {
                    problems.push("max_depth must be >= 1 or null".to_string());
                }
                if p.min_samples_split < 2 {
                    problems.push("min_samples_split must be >= 2".to_string());
                }
                if p.min_samples_leaf == 0 {
                    problems.push("min_samples_leaf must be >= 1".to_string());
                }
            }
            HyperParams::GradientBoosting(p) => {
                if p.n_estimators == 0 {
                    problems.push("n_estimators must be >= 1".to_string());
                }
                if p.max_depth == 0 {
                    problems.push("max_depth must be >= 1".to_string());
                }
                if !(p.learning_rate.is_finite() && p.learning_rate > 0.0) {
                    problems.push(format!("learning_rate must be > 0, got {}", p.learning_rate));
                }
                if !(p.subsample > 0.0 && p.subsample <= 1.0) {
                    problems.push(format!("subsample must be in (0, 1], got {}", p.subsample));
                }
            }
        }
        if !problems.is_empty() {
            bail!(
                "HYPERPARAMS_INVALID family={}: {}",
                self.family(),
                problems.join("; ")
            );
        }
        Ok(())
    }

    /// Flat string map as logged to a tracked run.
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        m.insert("model_type".to_string(), self.family().to_string());
        match self {
            HyperParams::RandomForest(p) => {
                m.insert("n_estimators".into(), p.n_estimators.to_string());
                m.insert(
                    "max_depth".into(),
                    p.max_depth.map_or_else(|| "None".to_string(), |d| d.to_string()),
                );
                m.insert("min_samples_split".into(), p.min_samples_split.to_string());
                m.insert("min_samples_leaf".into(), p.min_samples_leaf.to_string());
                m.insert("class_weight".into(), p.class_weight.as_str().to_string());
                m.insert("random_state".into(), p.random_state.to_string());
            }
            HyperParams::GradientBoosting(p) => {
                m.insert("n_estimators".into(), p.n_estimators.to_string());
                m.insert("max_depth".into(), p.max_depth.to_string());
                m.insert("learning_rate".into(), p.learning_rate.to_string());
                m.insert("subsample".into(), p.subsample.to_string());
                m.insert("random_state".into(), p.random_state.to_string());
            }
        }
        m
    }
}

/// `models:` section: one parameter block per family.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub random_forest: RandomForestParams,
    pub gradient_boosting: GradientBoostingParams,
}

impl ModelsConfig {
    pub fn params_for(&self, family: ModelFamily) -> HyperParams {
        match family {
            ModelFamily::RandomForest => HyperParams::RandomForest(self.random_forest.clone()),
            ModelFamily::GradientBoosting => {
                HyperParams::GradientBoosting(self.gradient_boosting.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_parses_cli_spellings() {
        assert_eq!("random-forest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("GB".parse::<ModelFamily>().unwrap(), ModelFamily::GradientBoosting);
        assert!("xgboost".parse::<ModelFamily>().is_err());
    }

    #[test]
    fn defaults_validate() {
        let m = ModelsConfig::default();
        m.params_for(ModelFamily::RandomForest).validate().unwrap();
        m.params_for(ModelFamily::GradientBoosting).validate().unwrap();
    }

    #[test]
    fn validation_reports_every_problem() {
        let hp = HyperParams::GradientBoosting(GradientBoostingParams {
            n_estimators: 0,
            subsample: 1.5,
            ..GradientBoostingParams::default()
        });
        let msg = hp.validate().unwrap_err().to_string();
        assert!(msg.contains("n_estimators"));
        assert!(msg.contains("subsample"));
        assert!(msg.starts_with("HYPERPARAMS_INVALID family=gradient_boosting"));
    }

    #[test]
    fn param_map_matches_logged_layout() {
        let rf = ModelsConfig::default().params_for(ModelFamily::RandomForest);
        let m = rf.to_param_map();
        assert_eq!(m["model_type"], "random_forest");
        assert_eq!(m["n_estimators"], "100");
        assert_eq!(m["max_depth"], "10");
        assert_eq!(m["class_weight"], "balanced");

        let unbounded = HyperParams::RandomForest(RandomForestParams {
            max_depth: None,
            ..RandomForestParams::default()
        });
        assert_eq!(unbounded.to_param_map()["max_depth"], "None");
    }
}
