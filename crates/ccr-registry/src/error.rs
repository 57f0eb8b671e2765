use std::fmt;

/// Errors returned by registry, metric-store and tracker implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No registered model with this name.
    ModelNotFound { model: String },
    /// The model exists but no version holds the alias.
    AliasNotFound { model: String, alias: String },
    /// The model exists but the version does not.
    VersionNotFound { model: String, version: u64 },
    /// No tracked run with this id.
    RunNotFound { run_id: String },
    /// A metric was already logged for the run with a different value.
    MetricConflict {
        run_id: String,
        key: String,
        existing: f64,
        attempted: f64,
    },
    /// Storage or transport failure in the backing store.
    Backend(String),
}

impl RegistryError {
    /// True for the "thing does not exist" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::ModelNotFound { .. }
                | RegistryError::AliasNotFound { .. }
                | RegistryError::VersionNotFound { .. }
                | RegistryError::RunNotFound { .. }
        )
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::ModelNotFound { model } => {
                write!(f, "registered model '{model}' not found")
            }
            RegistryError::AliasNotFound { model, alias } => {
                write!(f, "model '{model}' has no version aliased '@{alias}'")
            }
            RegistryError::VersionNotFound { model, version } => {
                write!(f, "model '{model}' has no version {version}")
            }
            RegistryError::RunNotFound { run_id } => write!(f, "run '{run_id}' not found"),
            RegistryError::MetricConflict {
                run_id,
                key,
                existing,
                attempted,
            } => write!(
                f,
                "metric '{key}' of run '{run_id}' is immutable (logged {existing}, attempted {attempted})"
            ),
            RegistryError::Backend(msg) => write!(f, "registry backend error: {msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}

pub type RegistryResult<T> = Result<T, RegistryError>;
