use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ccr_promotion::PromotionConfig;

use crate::hyperparams::ModelsConfig;

/// Typed view over the merged config document.
///
/// Every section is optional in YAML; absent keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub exports: ExportsConfig,
    pub promotion: PromotionConfig,
    pub data: DataConfig,
    pub refresh: RefreshConfig,
    pub split: SplitConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Registered model name.
    pub name: String,
    /// Experiment runs are tracked under.
    pub experiment: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "customer-churn-classifier".to_string(),
            experiment: "customer-churn-prediction".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the file-backed registry.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("mlruns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportsConfig {
    pub root: PathBuf,
}

impl Default for ExportsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("exports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_path: PathBuf,
    pub processed_path: PathBuf,
    pub n_samples: usize,
    pub seed: u64,
    pub churn_rate: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/customers.csv"),
            processed_path: PathBuf::from("data/processed/customers_cleaned.csv"),
            n_samples: 10_000,
            seed: 42,
            churn_rate: 0.3,
        }
    }
}

/// Parameters of the dataset refresh (outlier removal plus new records).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Records with `age` above this are dropped.
    pub max_age: u32,
    pub new_records: usize,
    pub seed: u64,
    pub churn_rate: f64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_age: 75,
            new_records: 2_000,
            seed: 43,
            churn_rate: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_size: f64,
    pub seed: u64,
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            stratify: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: PipelineConfig =
            serde_json::from_value(v.clone()).context("config does not match pipeline schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Cross-field checks serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.promotion.problems();
        if self.model.name.trim().is_empty() {
            problems.push("model.name must not be empty".to_string());
        }
        for (key, rate) in [
            ("data.churn_rate", self.data.churn_rate),
            ("refresh.churn_rate", self.refresh.churn_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                problems.push(format!("{key} must be in [0, 1], got {rate}"));
            }
        }
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            problems.push(format!(
                "split.test_size must be in (0, 1), got {}",
                self.split.test_size
            ));
        }
        if !problems.is_empty() {
            bail!("CONFIG_INVALID: {}", problems.join("; "));
        }
        Ok(())
    }

    /// `exports/promotions/<model>` for the configured model.
    pub fn promotion_export_dir(&self, model: &str) -> PathBuf {
        self.exports.root.join("promotions").join(model)
    }

    /// Hash-chained audit log shared by every mutating command.
    pub fn audit_log_path(&self) -> PathBuf {
        self.exports.root.join("audit").join("audit.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = PipelineConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.model.name, "customer-churn-classifier");
        assert_eq!(cfg.promotion.threshold, 0.005);
        assert_eq!(cfg.refresh.max_age, 75);
    }

    #[test]
    fn invalid_values_are_collected() {
        let v = serde_json::json!({
            "data": {"churn_rate": 1.5},
            "split": {"test_size": 0.0},
        });
        let msg = PipelineConfig::from_json(&v).unwrap_err().to_string();
        assert!(msg.contains("data.churn_rate"));
        assert!(msg.contains("split.test_size"));
    }

    #[test]
    fn wrong_type_is_a_schema_error() {
        let v = serde_json::json!({"data": {"n_samples": "many"}});
        let err = PipelineConfig::from_json(&v).unwrap_err();
        assert!(format!("{err:#}").contains("pipeline schema"));
    }

    #[test]
    fn export_dir_is_per_model() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            cfg.promotion_export_dir("m"),
            PathBuf::from("exports/promotions/m")
        );
    }
}
