//! Trait wiring shared by the concrete stores.
//!
//! A store only needs inherent `read` and `write` methods that hand a
//! `RegistryState` to a closure; this macro maps every contract method onto
//! the matching `RegistryState` operation.

macro_rules! impl_store_contracts {
    ($store:ty) => {
        impl $crate::contract::ModelRegistry for $store {
            fn get_version_by_alias(
                &self,
                model: &str,
                alias: &str,
            ) -> $crate::RegistryResult<$crate::ModelVersion> {
                self.read(|s| s.get_version_by_alias(model, alias))
            }

            fn get_version(
                &self,
                model: &str,
                version: u64,
            ) -> $crate::RegistryResult<$crate::ModelVersion> {
                self.read(|s| s.get_version(model, version))
            }

            fn reassign_alias(
                &self,
                model: &str,
                alias: &str,
                version: u64,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.reassign_alias(model, alias, version))
            }

            fn delete_alias(&self, model: &str, alias: &str) -> $crate::RegistryResult<()> {
                self.write(|s| s.delete_alias(model, alias))
            }

            fn update_version_description(
                &self,
                model: &str,
                version: u64,
                text: &str,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.update_version_description(model, version, text))
            }

            fn set_version_tag(
                &self,
                model: &str,
                version: u64,
                key: &str,
                value: &str,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.set_version_tag(model, version, key, value))
            }

            fn list_versions(
                &self,
                model: &str,
            ) -> $crate::RegistryResult<Vec<$crate::ModelVersion>> {
                self.read(|s| s.list_versions(model))
            }

            fn get_model(&self, model: &str) -> $crate::RegistryResult<$crate::ModelSummary> {
                self.read(|s| s.get_model(model))
            }

            fn set_model_description(&self, model: &str, text: &str) -> $crate::RegistryResult<()> {
                self.write(|s| s.set_model_description(model, text))
            }

            fn set_model_tag(
                &self,
                model: &str,
                key: &str,
                value: &str,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.set_model_tag(model, key, value))
            }
        }

        impl $crate::contract::MetricStore for $store {
            fn get_metrics(
                &self,
                run_id: &str,
            ) -> $crate::RegistryResult<std::collections::BTreeMap<String, f64>> {
                self.read(|s| s.get_metrics(run_id))
            }
        }

        impl $crate::contract::Tracker for $store {
            fn create_run(&self, run: $crate::NewRun) -> $crate::RegistryResult<$crate::RunRecord> {
                let now = chrono::Utc::now();
                self.write(|s| Ok(s.create_run(run, now)))
            }

            fn log_params(
                &self,
                run_id: &str,
                params: &std::collections::BTreeMap<String, String>,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.log_params(run_id, params))
            }

            fn log_metrics(
                &self,
                run_id: &str,
                metrics: &std::collections::BTreeMap<String, f64>,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.log_metrics(run_id, metrics))
            }

            fn set_run_tags(
                &self,
                run_id: &str,
                tags: &std::collections::BTreeMap<String, String>,
            ) -> $crate::RegistryResult<()> {
                self.write(|s| s.set_run_tags(run_id, tags))
            }

            fn register_version(
                &self,
                model: &str,
                run_id: &str,
            ) -> $crate::RegistryResult<$crate::ModelVersion> {
                let now = chrono::Utc::now();
                self.write(|s| s.register_version(model, run_id, now))
            }

            fn get_run(&self, run_id: &str) -> $crate::RegistryResult<$crate::RunRecord> {
                self.read(|s| s.get_run(run_id))
            }

            fn search_runs(
                &self,
                experiment: &str,
            ) -> $crate::RegistryResult<Vec<$crate::RunRecord>> {
                self.read(|s| Ok(s.search_runs(experiment)))
            }
        }
    };
}

pub(crate) use impl_store_contracts;
