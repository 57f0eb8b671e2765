use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// One tracked training run: parameters in, metrics out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub experiment: String,
    pub run_name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Metric record. A key, once logged, keeps its value for the life of the run.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub started_at_utc: DateTime<Utc>,
}

/// Arguments for [`crate::Tracker::create_run`].
#[derive(Debug, Clone, Default)]
pub struct NewRun {
    pub experiment: String,
    pub run_name: String,
    pub tags: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Registered models
// ---------------------------------------------------------------------------

/// A registered model version as seen by callers.
///
/// `aliases` is derived from the owning model's alias table at read time;
/// it is never stored on the version itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: u64,
    pub run_id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub created_at_utc: DateTime<Utc>,
}

impl ModelVersion {
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }
}

/// Stored form of a version (no alias list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVersion {
    pub version: u64,
    pub run_id: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub created_at_utc: DateTime<Utc>,
}

/// A registered model: its versions plus the alias table.
///
/// The alias table maps `alias -> version`, so an alias can point at one
/// version at most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<u64, StoredVersion>,
    #[serde(default)]
    pub aliases: BTreeMap<String, u64>,
    pub created_at_utc: DateTime<Utc>,
}

impl RegisteredModel {
    pub fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            tags: BTreeMap::new(),
            versions: BTreeMap::new(),
            aliases: BTreeMap::new(),
            created_at_utc: now,
        }
    }

    /// Next version number (1 for an empty model).
    pub fn next_version(&self) -> u64 {
        self.versions.keys().next_back().copied().unwrap_or(0) + 1
    }

    /// Materialize a caller-facing [`ModelVersion`] with its aliases.
    pub fn view(&self, v: &StoredVersion) -> ModelVersion {
        let aliases = self
            .aliases
            .iter()
            .filter(|(_, ver)| **ver == v.version)
            .map(|(alias, _)| alias.clone())
            .collect();
        ModelVersion {
            name: self.name.clone(),
            version: v.version,
            run_id: v.run_id.clone(),
            aliases,
            description: v.description.clone(),
            tags: v.tags.clone(),
            created_at_utc: v.created_at_utc,
        }
    }
}

/// Summary of a registered model returned by [`crate::ModelRegistry::get_model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub aliases: BTreeMap<String, u64>,
    pub latest_version: Option<u64>,
}
