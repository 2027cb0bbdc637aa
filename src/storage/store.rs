use super::{GlobalState, StoreError};
use crate::config::StateFormat;
use crate::lock::{LockSettings, StateLock};
use crate::utils::serialization;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Load/save contract over the whole [`GlobalState`].
///
/// Stores always read and write the complete state. Callers that change one
/// directory must go through [`StateStore::update`] so the read-modify-write
/// cycle is serialized against other writers.
pub trait StateStore {
    /// Load the full state. A store that was never written yields an empty state.
    ///
    /// # Errors
    /// Returns an error if persisted state exists but cannot be read or decoded.
    fn load(&self) -> Result<GlobalState, StoreError>;

    /// Atomically replace the persisted state.
    ///
    /// # Errors
    /// Returns an error if the state cannot be encoded or written.
    fn save(&self, state: &GlobalState) -> Result<(), StoreError>;

    /// Load, apply `f`, and save, excluding other writers for the whole cycle.
    ///
    /// # Errors
    /// Returns an error if the lock, load, or save fails. On error nothing is saved.
    fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut GlobalState) -> T;
}

/// State persisted as a single file inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    state_dir: PathBuf,
    format: StateFormat,
    lock: LockSettings,
}

impl FileStateStore {
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>, format: StateFormat) -> Self {
        Self {
            state_dir: state_dir.into(),
            format,
            lock: LockSettings::default(),
        }
    }

    #[must_use]
    pub const fn with_lock_settings(mut self, lock: LockSettings) -> Self {
        self.lock = lock;
        self
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Path of the state file for the configured format.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(self.format.file_name())
    }

    fn decode(&self, path: &Path, data: &[u8]) -> Result<GlobalState, StoreError> {
        let decoded = match self.format {
            StateFormat::Json => serialization::from_json(data),
            StateFormat::Binary => serialization::deserialize(data),
        };
        decoded.map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })
    }

    fn encode(&self, state: &GlobalState) -> Result<Vec<u8>, StoreError> {
        let encoded = match self.format {
            StateFormat::Json => serialization::to_json(state),
            StateFormat::Binary => serialization::serialize(state),
        };
        encoded.map_err(|e| StoreError::Encode(format!("{e:#}")))
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<GlobalState, StoreError> {
        let path = self.state_path();
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(state = %path.display(), "no persisted state yet");
                return Ok(GlobalState::new());
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let state = self.decode(&path, &data)?;
        tracing::debug!(
            state = %path.display(),
            directories = state.len(),
            "loaded state"
        );
        Ok(state)
    }

    fn save(&self, state: &GlobalState) -> Result<(), StoreError> {
        let path = self.state_path();
        let data = self.encode(state)?;

        std::fs::create_dir_all(&self.state_dir).map_err(|e| StoreError::io(&self.state_dir, e))?;

        // Write beside the target and rename over it so readers never see a partial file
        let mut temp = tempfile::Builder::new()
            .prefix(".state-")
            .suffix(".tmp")
            .tempfile_in(&self.state_dir)
            .map_err(|e| StoreError::io(&self.state_dir, e))?;
        temp.write_all(&data)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        tracing::info!(
            state = %path.display(),
            directories = state.len(),
            bytes = data.len(),
            "saved state"
        );
        Ok(())
    }

    fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut GlobalState) -> T,
    {
        let lock = StateLock::acquire(&self.state_dir, self.lock)?;
        let mut state = self.load()?;
        let output = f(&mut state);
        self.save(&state)?;
        lock.release()?;
        Ok(output)
    }
}
