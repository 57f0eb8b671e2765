//! Registry wrapper with injectable failures.
//!
//! Delegates to an in-memory store, counting every mutating call and failing
//! the operations armed with [`FaultyRegistry::fail_on`]. A failed call does
//! not reach the inner store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use ccr_registry::{
    MemoryStore, MetricStore, ModelRegistry, ModelSummary, ModelVersion, NewRun, RegistryError,
    RegistryResult, RunRecord, Tracker,
};

/// Operations a fault can be armed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fault {
    GetVersionByAlias,
    GetMetrics,
    ReassignAlias,
    UpdateDescription,
    SetVersionTag,
}

#[derive(Debug, Default)]
pub struct FaultyRegistry {
    inner: MemoryStore,
    armed: Mutex<BTreeSet<Fault>>,
    writes: Mutex<Vec<String>>,
}

impl FaultyRegistry {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            armed: Mutex::new(BTreeSet::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Make every later call of `op` fail with a backend error.
    pub fn fail_on(&self, op: Fault) {
        self.armed.lock().unwrap_or_else(|e| e.into_inner()).insert(op);
    }

    pub fn heal(&self) {
        self.armed.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Mutating registry calls attempted so far, in order, as
    /// `"<op> <model> v<version>"`.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self, op: Fault) -> RegistryResult<()> {
        if self.armed.lock().unwrap_or_else(|e| e.into_inner()).contains(&op) {
            return Err(RegistryError::Backend(format!("injected fault on {op:?}")));
        }
        Ok(())
    }

    fn record(&self, op: &str, model: &str, version: u64) {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("{op} {model} v{version}"));
    }
}

impl ModelRegistry for FaultyRegistry {
    fn get_version_by_alias(&self, model: &str, alias: &str) -> RegistryResult<ModelVersion> {
        self.check(Fault::GetVersionByAlias)?;
        self.inner.get_version_by_alias(model, alias)
    }

    fn get_version(&self, model: &str, version: u64) -> RegistryResult<ModelVersion> {
        self.inner.get_version(model, version)
    }

    fn reassign_alias(&self, model: &str, alias: &str, version: u64) -> RegistryResult<()> {
        self.record("reassign_alias", model, version);
        self.check(Fault::ReassignAlias)?;
        self.inner.reassign_alias(model, alias, version)
    }

    fn delete_alias(&self, model: &str, alias: &str) -> RegistryResult<()> {
        self.inner.delete_alias(model, alias)
    }

    fn update_version_description(
        &self,
        model: &str,
        version: u64,
        text: &str,
    ) -> RegistryResult<()> {
        self.record("update_version_description", model, version);
        self.check(Fault::UpdateDescription)?;
        self.inner.update_version_description(model, version, text)
    }

    fn set_version_tag(
        &self,
        model: &str,
        version: u64,
        key: &str,
        value: &str,
    ) -> RegistryResult<()> {
        self.record("set_version_tag", model, version);
        self.check(Fault::SetVersionTag)?;
        self.inner.set_version_tag(model, version, key, value)
    }

    fn list_versions(&self, model: &str) -> RegistryResult<Vec<ModelVersion>> {
        self.inner.list_versions(model)
    }

    fn get_model(&self, model: &str) -> RegistryResult<ModelSummary> {
        self.inner.get_model(model)
    }

    fn set_model_description(&self, model: &str, text: &str) -> RegistryResult<()> {
        self.inner.set_model_description(model, text)
    }

    fn set_model_tag(&self, model: &str, key: &str, value: &str) -> RegistryResult<()> {
        self.inner.set_model_tag(model, key, value)
    }
}

impl MetricStore for FaultyRegistry {
    fn get_metrics(&self, run_id: &str) -> RegistryResult<BTreeMap<String, f64>> {
        self.check(Fault::GetMetrics)?;
        self.inner.get_metrics(run_id)
    }
}

impl Tracker for FaultyRegistry {
    fn create_run(&self, run: NewRun) -> RegistryResult<RunRecord> {
        self.inner.create_run(run)
    }

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> RegistryResult<()> {
        self.inner.log_params(run_id, params)
    }

    fn log_metrics(&self, run_id: &str, metrics: &BTreeMap<String, f64>) -> RegistryResult<()> {
        self.inner.log_metrics(run_id, metrics)
    }

    fn set_run_tags(&self, run_id: &str, tags: &BTreeMap<String, String>) -> RegistryResult<()> {
        self.inner.set_run_tags(run_id, tags)
    }

    fn register_version(&self, model: &str, run_id: &str) -> RegistryResult<ModelVersion> {
        self.inner.register_version(model, run_id)
    }

    fn get_run(&self, run_id: &str) -> RegistryResult<RunRecord> {
        self.inner.get_run(run_id)
    }

    fn search_runs(&self, experiment: &str) -> RegistryResult<Vec<RunRecord>> {
        self.inner.search_runs(experiment)
    }
}
