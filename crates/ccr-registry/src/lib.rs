//! Model registry and experiment tracker contracts plus the stores that
//! implement them.

mod contract;
mod error;
mod file_store;
mod memory;
mod state;
mod store_impl;
mod types;

pub use contract::{MetricStore, ModelRegistry, Tracker};
pub use error::{RegistryError, RegistryResult};
pub use file_store::{FileStore, REGISTRY_FILE};
pub use memory::MemoryStore;
pub use state::{RegistryState, SCHEMA_VERSION};
pub use types::{
    ModelSummary, ModelVersion, NewRun, RegisteredModel, RunRecord, StoredVersion,
};
