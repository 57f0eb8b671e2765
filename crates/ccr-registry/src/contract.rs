//! Collaborator contracts for the model registry and experiment tracker.
//!
//! Every method takes `&self`: a handle is a client onto shared state that
//! lives elsewhere (a file, a server, a mutex-guarded map). One handle may
//! implement all three traits at once.

use std::collections::BTreeMap;

use crate::error::RegistryResult;
use crate::types::{ModelSummary, ModelVersion, NewRun, RunRecord};

/// Registered-model side: versions, aliases, descriptions and tags.
pub trait ModelRegistry {
    /// The version currently holding `alias`.
    ///
    /// `ModelNotFound` when the model is unknown, `AliasNotFound` when no
    /// version holds the alias.
    fn get_version_by_alias(&self, model: &str, alias: &str) -> RegistryResult<ModelVersion>;

    fn get_version(&self, model: &str, version: u64) -> RegistryResult<ModelVersion>;

    /// Point `alias` at `version`, removing it from whichever version held it.
    ///
    /// One call, one state transition: no observer ever sees the alias on
    /// zero or two versions.
    fn reassign_alias(&self, model: &str, alias: &str, version: u64) -> RegistryResult<()>;

    fn delete_alias(&self, model: &str, alias: &str) -> RegistryResult<()>;

    fn update_version_description(
        &self,
        model: &str,
        version: u64,
        text: &str,
    ) -> RegistryResult<()>;

    fn set_version_tag(&self, model: &str, version: u64, key: &str, value: &str)
        -> RegistryResult<()>;

    /// All versions, ascending by version number.
    fn list_versions(&self, model: &str) -> RegistryResult<Vec<ModelVersion>>;

    fn get_model(&self, model: &str) -> RegistryResult<ModelSummary>;

    fn set_model_description(&self, model: &str, text: &str) -> RegistryResult<()>;

    fn set_model_tag(&self, model: &str, key: &str, value: &str) -> RegistryResult<()>;
}

/// Read side of run metrics.
pub trait MetricStore {
    fn get_metrics(&self, run_id: &str) -> RegistryResult<BTreeMap<String, f64>>;
}

/// Write side of experiment tracking. Produces the runs and versions that
/// challengers are built from.
pub trait Tracker {
    fn create_run(&self, run: NewRun) -> RegistryResult<RunRecord>;

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> RegistryResult<()>;

    /// Log metrics. Re-logging an identical value is a no-op; a different
    /// value for an existing key is `MetricConflict`.
    fn log_metrics(&self, run_id: &str, metrics: &BTreeMap<String, f64>) -> RegistryResult<()>;

    fn set_run_tags(&self, run_id: &str, tags: &BTreeMap<String, String>) -> RegistryResult<()>;

    /// Register the run's model as the next version of `model`, creating the
    /// registered model on first use.
    fn register_version(&self, model: &str, run_id: &str) -> RegistryResult<ModelVersion>;

    fn get_run(&self, run_id: &str) -> RegistryResult<RunRecord>;

    /// Runs of one experiment, oldest first.
    fn search_runs(&self, experiment: &str) -> RegistryResult<Vec<RunRecord>>;
}
