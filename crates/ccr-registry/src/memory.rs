use std::sync::Mutex;

use crate::error::{RegistryError, RegistryResult};
use crate::state::RegistryState;
use crate::store_impl::impl_store_contracts;

/// Process-local store. Used by tests and by dry runs that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<RegistryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: RegistryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> RegistryResult<RegistryState> {
        self.read(|s| Ok(s.clone()))
    }

    fn read<T>(&self, f: impl FnOnce(&RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let guard = self
            .state
            .lock()
            .map_err(|_| RegistryError::Backend("memory store lock poisoned".to_string()))?;
        f(&guard)
    }

    /// Operations run against a scratch copy that replaces the live state only
    /// on success, so a failed operation never leaves a partial write behind.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut RegistryState) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RegistryError::Backend("memory store lock poisoned".to_string()))?;
        let mut scratch = guard.clone();
        let out = f(&mut scratch)?;
        *guard = scratch;
        Ok(out)
    }
}

impl_store_contracts!(MemoryStore);
