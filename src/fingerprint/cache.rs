use crate::utils::serialization;
use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

/// Cached digest with the file stamp it was computed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDigest {
    /// SHA-256 hex digest
    pub digest: String,
    /// File size when the digest was computed
    pub size: u64,
    /// Modification time, whole seconds since the epoch
    pub mtime_secs: u64,
    /// Sub-second part of the modification time
    pub mtime_nanos: u32,
}

impl CachedDigest {
    fn matches(&self, stamp: (u64, u64, u32)) -> bool {
        (self.size, self.mtime_secs, self.mtime_nanos) == stamp
    }
}

/// File digests keyed by absolute path, reused while (size, mtime) is unchanged.
///
/// Shared between hashing threads. Files with no usable mtime are never cached.
#[derive(Debug, Default)]
pub struct DigestCache {
    entries: DashMap<PathBuf, CachedDigest>,
    dirty: AtomicBool,
}

/// (size, seconds, nanoseconds) or `None` when the platform gives no mtime.
fn stamp(metadata: &Metadata) -> Option<(u64, u64, u32)> {
    let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some((metadata.len(), modified.as_secs(), modified.subsec_nanos()))
}

impl DigestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file. A missing or unreadable cache starts empty.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(data) = std::fs::read(path) else {
            return Self::new();
        };

        match serialization::deserialize::<BTreeMap<PathBuf, CachedDigest>>(&data) {
            Ok(entries) => Self {
                entries: entries.into_iter().collect(),
                dirty: AtomicBool::new(false),
            },
            Err(e) => {
                tracing::warn!(cache = %path.display(), error = %e, "discarding corrupt digest cache");
                Self::new()
            }
        }
    }

    /// Persist the cache if anything changed since it was loaded.
    ///
    /// Entries for files that no longer exist are dropped first.
    ///
    /// # Errors
    /// Returns an error if the cache file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.entries.retain(|file, _| {
            let exists = file.exists();
            if !exists {
                self.dirty.store(true, Ordering::Relaxed);
            }
            exists
        });

        if !self.dirty.load(Ordering::Relaxed) {
            return Ok(());
        }

        let snapshot: BTreeMap<PathBuf, CachedDigest> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let data = serialization::serialize(&snapshot).context("Failed to serialize digest cache")?;

        let dir = path
            .parent()
            .with_context(|| format!("Cache path has no parent: {}", path.display()))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary digest cache")?;
        temp.write_all(&data)
            .context("Failed to write digest cache")?;
        temp.persist(path)
            .with_context(|| format!("Failed to replace digest cache: {}", path.display()))?;

        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Cached digest for `path` if its size and mtime are unchanged.
    #[must_use]
    pub fn lookup(&self, path: &Path, metadata: &Metadata) -> Option<String> {
        let stamp = stamp(metadata)?;
        let cached = self.entries.get(path)?;
        cached.matches(stamp).then(|| cached.digest.clone())
    }

    /// Remember `digest` for `path` at its current size and mtime.
    pub fn record(&self, path: &Path, metadata: &Metadata, digest: &str) {
        let Some((size, mtime_secs, mtime_nanos)) = stamp(metadata) else {
            return;
        };
        self.entries.insert(
            path.to_path_buf(),
            CachedDigest {
                digest: digest.to_string(),
                size,
                mtime_secs,
                mtime_nanos,
            },
        );
        self.dirty.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
