//! Plain data model behind every store implementation.
//!
//! `RegistryState` holds the whole registry/tracker document and applies
//! operations to it. Stores differ only in where the document lives.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ModelSummary, ModelVersion, NewRun, RegisteredModel, RunRecord, StoredVersion};

/// Current on-disk schema version of the registry document.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    pub schema_version: u32,
    #[serde(default)]
    pub models: BTreeMap<String, RegisteredModel>,
    /// Insertion ordered.
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            models: BTreeMap::new(),
            runs: Vec::new(),
        }
    }
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Models
    // -----------------------------------------------------------------------

    fn model(&self, name: &str) -> RegistryResult<&RegisteredModel> {
        self.models
            .get(name)
            .ok_or_else(|| RegistryError::ModelNotFound {
                model: name.to_string(),
            })
    }

    fn model_mut(&mut self, name: &str) -> RegistryResult<&mut RegisteredModel> {
        self.models
            .get_mut(name)
            .ok_or_else(|| RegistryError::ModelNotFound {
                model: name.to_string(),
            })
    }

    fn version_mut(&mut self, name: &str, version: u64) -> RegistryResult<&mut StoredVersion> {
        self.model_mut(name)?
            .versions
            .get_mut(&version)
            .ok_or_else(|| RegistryError::VersionNotFound {
                model: name.to_string(),
                version,
            })
    }

    pub fn get_version(&self, name: &str, version: u64) -> RegistryResult<ModelVersion> {
        let m = self.model(name)?;
        let v = m
            .versions
            .get(&version)
            .ok_or_else(|| RegistryError::VersionNotFound {
                model: name.to_string(),
                version,
            })?;
        Ok(m.view(v))
    }

    pub fn get_version_by_alias(&self, name: &str, alias: &str) -> RegistryResult<ModelVersion> {
        let m = self.model(name)?;
        let version = m
            .aliases
            .get(alias)
            .copied()
            .ok_or_else(|| RegistryError::AliasNotFound {
                model: name.to_string(),
                alias: alias.to_string(),
            })?;
        self.get_version(name, version)
    }

    pub fn reassign_alias(&mut self, name: &str, alias: &str, version: u64) -> RegistryResult<()> {
        let m = self.model_mut(name)?;
        if !m.versions.contains_key(&version) {
            return Err(RegistryError::VersionNotFound {
                model: name.to_string(),
                version,
            });
        }
        m.aliases.insert(alias.to_string(), version);
        Ok(())
    }

    pub fn delete_alias(&mut self, name: &str, alias: &str) -> RegistryResult<()> {
        let m = self.model_mut(name)?;
        match m.aliases.remove(alias) {
            Some(_) => Ok(()),
            None => Err(RegistryError::AliasNotFound {
                model: name.to_string(),
                alias: alias.to_string(),
            }),
        }
    }

    pub fn update_version_description(
        &mut self,
        name: &str,
        version: u64,
        text: &str,
    ) -> RegistryResult<()> {
        self.version_mut(name, version)?.description = Some(text.to_string());
        Ok(())
    }

    pub fn set_version_tag(
        &mut self,
        name: &str,
        version: u64,
        key: &str,
        value: &str,
    ) -> RegistryResult<()> {
        self.version_mut(name, version)?
            .tags
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn list_versions(&self, name: &str) -> RegistryResult<Vec<ModelVersion>> {
        let m = self.model(name)?;
        Ok(m.versions.values().map(|v| m.view(v)).collect())
    }

    pub fn get_model(&self, name: &str) -> RegistryResult<ModelSummary> {
        let m = self.model(name)?;
        Ok(ModelSummary {
            name: m.name.clone(),
            description: m.description.clone(),
            tags: m.tags.clone(),
            aliases: m.aliases.clone(),
            latest_version: m.versions.keys().next_back().copied(),
        })
    }

    pub fn set_model_description(&mut self, name: &str, text: &str) -> RegistryResult<()> {
        self.model_mut(name)?.description = Some(text.to_string());
        Ok(())
    }

    pub fn set_model_tag(&mut self, name: &str, key: &str, value: &str) -> RegistryResult<()> {
        self.model_mut(name)?
            .tags
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn register_version(
        &mut self,
        name: &str,
        run_id: &str,
        now: DateTime<Utc>,
    ) -> RegistryResult<ModelVersion> {
        // A version must point at a tracked run.
        self.run(run_id)?;

        let m = self
            .models
            .entry(name.to_string())
            .or_insert_with(|| RegisteredModel::new(name, now));
        let version = m.next_version();
        let stored = StoredVersion {
            version,
            run_id: run_id.to_string(),
            description: None,
            tags: BTreeMap::new(),
            created_at_utc: now,
        };
        m.versions.insert(version, stored);
        self.get_version(name, version)
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    fn run(&self, run_id: &str) -> RegistryResult<&RunRecord> {
        self.runs
            .iter()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| RegistryError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    fn run_mut(&mut self, run_id: &str) -> RegistryResult<&mut RunRecord> {
        self.runs
            .iter_mut()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| RegistryError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    pub fn get_run(&self, run_id: &str) -> RegistryResult<RunRecord> {
        self.run(run_id).cloned()
    }

    pub fn create_run(&mut self, new: NewRun, now: DateTime<Utc>) -> RunRecord {
        let record = RunRecord {
            run_id: Uuid::new_v4().simple().to_string(),
            experiment: new.experiment,
            run_name: new.run_name,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            tags: new.tags,
            started_at_utc: now,
        };
        self.runs.push(record.clone());
        record
    }

    pub fn log_params(
        &mut self,
        run_id: &str,
        params: &BTreeMap<String, String>,
    ) -> RegistryResult<()> {
        let run = self.run_mut(run_id)?;
        for (k, v) in params {
            run.params.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    /// All-or-nothing: a conflict on any key leaves the run untouched.
    pub fn log_metrics(
        &mut self,
        run_id: &str,
        metrics: &BTreeMap<String, f64>,
    ) -> RegistryResult<()> {
        let run = self.run_mut(run_id)?;
        for (k, &v) in metrics {
            if let Some(&existing) = run.metrics.get(k) {
                if !same_metric_value(existing, v) {
                    return Err(RegistryError::MetricConflict {
                        run_id: run_id.to_string(),
                        key: k.clone(),
                        existing,
                        attempted: v,
                    });
                }
            }
        }
        for (k, &v) in metrics {
            run.metrics.insert(k.clone(), v);
        }
        Ok(())
    }

    pub fn set_run_tags(
        &mut self,
        run_id: &str,
        tags: &BTreeMap<String, String>,
    ) -> RegistryResult<()> {
        let run = self.run_mut(run_id)?;
        for (k, v) in tags {
            run.tags.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    pub fn get_metrics(&self, run_id: &str) -> RegistryResult<BTreeMap<String, f64>> {
        Ok(self.run(run_id)?.metrics.clone())
    }

    pub fn search_runs(&self, experiment: &str) -> Vec<RunRecord> {
        self.runs
            .iter()
            .filter(|r| r.experiment == experiment)
            .cloned()
            .collect()
    }
}

/// NaN compares equal to NaN here so an identical re-log is still a no-op.
fn same_metric_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_versions(n: usize) -> (RegistryState, Vec<u64>) {
        let mut s = RegistryState::new();
        let now = Utc::now();
        let mut versions = Vec::new();
        for i in 0..n {
            let run = s.create_run(
                NewRun {
                    experiment: "exp".into(),
                    run_name: format!("run-{i}"),
                    ..Default::default()
                },
                now,
            );
            versions.push(s.register_version("m", &run.run_id, now).unwrap().version);
        }
        (s, versions)
    }

    #[test]
    fn versions_are_numbered_from_one() {
        let (_, versions) = state_with_versions(3);
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn reassign_moves_alias_off_previous_holder() {
        let (mut s, _) = state_with_versions(2);
        s.reassign_alias("m", "champion", 1).unwrap();
        s.reassign_alias("m", "champion", 2).unwrap();

        let holders: Vec<u64> = s
            .list_versions("m")
            .unwrap()
            .into_iter()
            .filter(|v| v.has_alias("champion"))
            .map(|v| v.version)
            .collect();
        assert_eq!(holders, vec![2]);
    }

    #[test]
    fn reassign_to_unknown_version_leaves_alias_untouched() {
        let (mut s, _) = state_with_versions(1);
        s.reassign_alias("m", "champion", 1).unwrap();
        let err = s.reassign_alias("m", "champion", 9).unwrap_err();
        assert!(matches!(err, RegistryError::VersionNotFound { version: 9, .. }));
        assert_eq!(s.get_version_by_alias("m", "champion").unwrap().version, 1);
    }

    #[test]
    fn register_requires_known_run() {
        let mut s = RegistryState::new();
        let err = s.register_version("m", "nope", Utc::now()).unwrap_err();
        assert!(matches!(err, RegistryError::RunNotFound { .. }));
        assert!(s.models.is_empty());
    }

    #[test]
    fn metric_conflict_is_all_or_nothing() {
        let mut s = RegistryState::new();
        let run = s.create_run(NewRun::default(), Utc::now());
        s.log_metrics(&run.run_id, &BTreeMap::from([("roc_auc".to_string(), 0.76)]))
            .unwrap();

        let err = s
            .log_metrics(
                &run.run_id,
                &BTreeMap::from([
                    ("accuracy".to_string(), 0.7),
                    ("roc_auc".to_string(), 0.80),
                ]),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::MetricConflict { .. }));

        let metrics = s.get_metrics(&run.run_id).unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics["roc_auc"], 0.76);
    }
}
