//! Shared fixtures for scenario tests: seeded registries and a fault-injecting
//! registry wrapper.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use ccr_registry::{ModelRegistry, NewRun, Tracker};

mod faulty;

pub use faulty::{Fault, FaultyRegistry};

pub const MODEL: &str = "customer-churn-classifier";
pub const EXPERIMENT: &str = "customer-churn-prediction";
pub const CHAMPION: &str = "champion";

/// A registered version created by [`seed_version`].
#[derive(Debug, Clone, PartialEq)]
pub struct Seeded {
    pub version: u64,
    pub run_id: String,
    pub roc_auc: f64,
}

/// Create a run with `roc_auc` logged and register it as the next version
/// of `model`.
pub fn seed_version<S>(store: &S, model: &str, run_name: &str, roc_auc: f64) -> Result<Seeded>
where
    S: Tracker + ?Sized,
{
    seed_version_with(
        store,
        model,
        run_name,
        &BTreeMap::from([("roc_auc".to_string(), roc_auc)]),
    )
    .map(|(version, run_id)| Seeded {
        version,
        run_id,
        roc_auc,
    })
}

/// As [`seed_version`] with an arbitrary metric map (possibly without
/// `roc_auc`, possibly non-finite).
pub fn seed_version_with<S>(
    store: &S,
    model: &str,
    run_name: &str,
    metrics: &BTreeMap<String, f64>,
) -> Result<(u64, String)>
where
    S: Tracker + ?Sized,
{
    let run = store
        .create_run(NewRun {
            experiment: EXPERIMENT.to_string(),
            run_name: run_name.to_string(),
            tags: BTreeMap::from([("model_type".to_string(), run_name.to_string())]),
        })
        .context("create run")?;
    store
        .log_metrics(&run.run_id, metrics)
        .context("log metrics")?;
    let mv = store
        .register_version(model, &run.run_id)
        .context("register version")?;
    Ok((mv.version, run.run_id))
}

/// Seed one version and point the champion alias at it.
pub fn seed_champion<S>(store: &S, model: &str, roc_auc: f64) -> Result<Seeded>
where
    S: Tracker + ModelRegistry + ?Sized,
{
    let seeded = seed_version(store, model, "random_forest", roc_auc)?;
    store
        .reassign_alias(model, CHAMPION, seeded.version)
        .context("assign champion alias")?;
    Ok(seeded)
}

/// Versions of `model` holding `alias`. A healthy registry returns at most one.
pub fn alias_holders<R>(registry: &R, model: &str, alias: &str) -> Result<Vec<u64>>
where
    R: ModelRegistry + ?Sized,
{
    Ok(registry
        .list_versions(model)
        .context("list versions")?
        .into_iter()
        .filter(|v| v.has_alias(alias))
        .map(|v| v.version)
        .collect())
}

/// Parse a JSON tag value written by the promotion engine.
pub fn tag_json<R>(registry: &R, model: &str, version: u64, key: &str) -> Result<serde_json::Value>
where
    R: ModelRegistry + ?Sized,
{
    let mv = registry.get_version(model, version).context("get version")?;
    let raw = mv
        .tags
        .get(key)
        .with_context(|| format!("version {version} has no tag '{key}'"))?;
    serde_json::from_str(raw).context("parse tag json")
}
