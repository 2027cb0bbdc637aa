use super::{GlobalState, StateStore, StoreError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// State kept in process memory. Updates are serialized by a mutex.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<GlobalState>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    #[must_use]
    pub fn with_state(state: GlobalState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn guard(&self) -> MutexGuard<'_, GlobalState> {
        // A panic inside an update closure leaves the state as it was before that update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<GlobalState, StoreError> {
        Ok(self.guard().clone())
    }

    fn save(&self, state: &GlobalState) -> Result<(), StoreError> {
        *self.guard() = state.clone();
        Ok(())
    }

    fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut GlobalState) -> T,
    {
        let mut guard = self.guard();
        let mut working = guard.clone();
        let output = f(&mut working);
        *guard = working;
        Ok(output)
    }
}
