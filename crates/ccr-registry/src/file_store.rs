//! JSON-file backed registry and tracker.
//!
//! Layout: `<root>/registry.json`. Every mutation is load, apply, write a
//! temp file next to the document, rename over it. The rename is the commit
//! point, so each contract call is exactly one persisted transition.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::state::{RegistryState, SCHEMA_VERSION};
use crate::store_impl::impl_store_contracts;

pub const REGISTRY_FILE: &str = "registry.json";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> RegistryResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            RegistryError::Backend(format!("create store dir {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    /// Current document (empty when nothing was written yet).
    pub fn load(&self) -> RegistryResult<RegistryState> {
        let path = self.document_path();
        if !path.exists() {
            return Ok(RegistryState::new());
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| RegistryError::Backend(format!("read {}: {e}", path.display())))?;
        let state: RegistryState = serde_json::from_str(&raw)
            .map_err(|e| RegistryError::Backend(format!("parse {}: {e}", path.display())))?;
        if state.schema_version != SCHEMA_VERSION {
            return Err(RegistryError::Backend(format!(
                "unsupported registry schema_version {} (expected {})",
                state.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(state)
    }

    fn persist(&self, state: &RegistryState) -> RegistryResult<()> {
        let path = self.document_path();
        let tmp = self.root.join(format!("{REGISTRY_FILE}.tmp"));
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| RegistryError::Backend(format!("serialize registry: {e}")))?;
        fs::write(&tmp, format!("{json}\n"))
            .map_err(|e| RegistryError::Backend(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| {
            RegistryError::Backend(format!("rename {} -> {}: {e}", tmp.display(), path.display()))
        })?;
        debug!(path = %path.display(), "registry document committed");
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let state = self.load()?;
        f(&state)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut state = self.load()?;
        let out = f(&mut state)?;
        self.persist(&state)?;
        Ok(out)
    }
}

impl_store_contracts!(FileStore);
