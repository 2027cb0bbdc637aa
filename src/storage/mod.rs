//! Snapshot data model and persistence.
//!
//! A [`GlobalState`] holds one [`DirectorySnapshot`] per analyzed directory.
//! It is always loaded and saved as a whole through a [`StateStore`].

/// Categorized storage failures.
pub mod errors;
/// In-process store used for tests and embedding.
pub mod memory;
/// File-backed store with atomic replacement and advisory locking.
pub mod store;

pub use errors::StoreError;
pub use memory::MemoryStateStore;
pub use store::{FileStateStore, StateStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fingerprint of one immediate child (file or subdirectory) of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFingerprint {
    /// Base name of the entry, for display
    pub name: String,
    /// Lower-case hex SHA-256 digest of the entry content
    pub digest: String,
    /// Starts at 1, bumped by one on every observed digest change
    pub version: u64,
}

impl EntryFingerprint {
    /// Creates a freshly observed fingerprint at version 1.
    #[must_use]
    pub fn new(name: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            digest: digest.into(),
            version: 1,
        }
    }
}

/// Full child path to fingerprint. Ordered so every listing is sorted by path.
pub type EntryMap = BTreeMap<PathBuf, EntryFingerprint>;

/// Last-known fingerprints for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    /// Canonical directory path, duplicated from the key in [`GlobalState`]
    pub directory_path: PathBuf,
    /// Fingerprints keyed by full child path
    #[serde(default)]
    pub entries: EntryMap,
}

impl DirectorySnapshot {
    #[must_use]
    pub const fn new(directory_path: PathBuf, entries: EntryMap) -> Self {
        Self {
            directory_path,
            entries,
        }
    }
}

/// Every snapshot ever persisted, keyed by directory path.
///
/// Serializes as a plain mapping from directory path to snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalState {
    pub directories: BTreeMap<PathBuf, DirectorySnapshot>,
}

impl GlobalState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self, directory: &Path) -> Option<&DirectorySnapshot> {
        self.directories.get(directory)
    }

    /// Entries recorded for `directory`, or an empty map if it was never analyzed.
    #[must_use]
    pub fn previous_entries(&self, directory: &Path) -> EntryMap {
        self.directories
            .get(directory)
            .map(|snapshot| snapshot.entries.clone())
            .unwrap_or_default()
    }

    /// Replaces the snapshot for its directory, leaving every other directory untouched.
    pub fn insert_snapshot(&mut self, snapshot: DirectorySnapshot) {
        self.directories
            .insert(snapshot.directory_path.clone(), snapshot);
    }

    pub fn remove_snapshot(&mut self, directory: &Path) -> Option<DirectorySnapshot> {
        self.directories.remove(directory)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

/// One classified path from a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryChange {
    /// Present now, absent from the previous snapshot
    Added(PathBuf),
    /// Present in both with a different digest
    Changed(PathBuf),
    /// Present previously, absent now (removed or skipped this round)
    Deleted(PathBuf),
}

impl EntryChange {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Added(p) | Self::Changed(p) | Self::Deleted(p) => p,
        }
    }

    /// Returns a single-character representation of the change.
    #[must_use]
    pub const fn status_char(&self) -> char {
        match self {
            Self::Added(_) => 'A',
            Self::Changed(_) => 'M',
            Self::Deleted(_) => 'D',
        }
    }
}

/// Outcome of one analysis. Each list is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub added: Vec<PathBuf>,
    pub changed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl ComparisonResult {
    /// True when nothing was added, changed, or deleted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.changed.len() + self.deleted.len()
    }

    /// Flattens the three lists into tagged changes, added first.
    #[must_use]
    pub fn changes(&self) -> Vec<EntryChange> {
        self.added
            .iter()
            .cloned()
            .map(EntryChange::Added)
            .chain(self.changed.iter().cloned().map(EntryChange::Changed))
            .chain(self.deleted.iter().cloned().map(EntryChange::Deleted))
            .collect()
    }
}
