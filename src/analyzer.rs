//! One scan-and-compare cycle for a directory.
//!
//! The directory is scanned outside the state lock; the lock is held only for
//! load, compare, merge, and save, so the comparison always runs against the
//! latest persisted snapshot even when several analyses overlap.

use crate::DirsnapContext;
use crate::differ::Differ;
use crate::fingerprint::{DigestCache, Fingerprinter};
use crate::lock::LockSettings;
use crate::scanner::{EntryScanner, ScanLimits, ScanWarning};
use crate::storage::{ComparisonResult, DirectorySnapshot, FileStateStore, StateStore};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A comparison plus the entries skipped while producing it
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Canonical path the snapshot is stored under
    pub directory: PathBuf,
    /// New, changed, and deleted entries
    pub result: ComparisonResult,
    /// Side-channel skip and truncation signals
    pub warnings: Vec<ScanWarning>,
}

/// Digest cache shared with the scanner and where it is persisted
#[derive(Debug)]
struct CacheHandle {
    cache: Arc<DigestCache>,
    path: PathBuf,
}

/// Scans directories and records their snapshots in a [`StateStore`]
#[derive(Debug)]
pub struct Analyzer<S> {
    scanner: EntryScanner,
    store: S,
    cache: Option<CacheHandle>,
}

impl<S: StateStore> Analyzer<S> {
    #[must_use]
    pub const fn new(scanner: EntryScanner, store: S) -> Self {
        Self {
            scanner,
            store,
            cache: None,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn scanner(&self) -> &EntryScanner {
        &self.scanner
    }

    /// Analyze `directory` and return the comparison against its last snapshot.
    ///
    /// Skipped entries are logged but not returned; use
    /// [`Analyzer::analyze_with_warnings`] to receive them.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or listed, or if
    /// the state cannot be locked, loaded, or saved. Nothing is persisted on error.
    pub fn analyze(&self, directory: &Path) -> Result<ComparisonResult> {
        Ok(self.analyze_with_warnings(directory)?.result)
    }

    /// Analyze `directory`, returning the comparison and the scan warnings.
    ///
    /// # Errors
    ///
    /// Same as [`Analyzer::analyze`].
    pub fn analyze_with_warnings(&self, directory: &Path) -> Result<Analysis> {
        let key = canonical_key(directory)?;
        let outcome = self.scanner.scan(&key)?;
        let mut current = outcome.entries;

        let result = self
            .store
            .update(|state| {
                let previous = state.previous_entries(&key);
                let result = Differ::compare(&previous, &mut current);
                state.insert_snapshot(DirectorySnapshot::new(key.clone(), current));
                result
            })
            .with_context(|| format!("Failed to record snapshot for {}", key.display()))?;

        tracing::info!(
            directory = %key.display(),
            added = result.added.len(),
            changed = result.changed.len(),
            deleted = result.deleted.len(),
            skipped = outcome.warnings.len(),
            "analysis complete"
        );

        self.persist_cache();

        Ok(Analysis {
            directory: key,
            result,
            warnings: outcome.warnings,
        })
    }

    /// Persisted snapshot for `directory`, without scanning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or the state cannot be loaded.
    pub fn snapshot(&self, directory: &Path) -> Result<Option<DirectorySnapshot>> {
        let key = lookup_key(directory);
        let state = self.store.load()?;
        Ok(state.snapshot(&key).cloned())
    }

    /// Every directory with a persisted snapshot, in path order.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be loaded.
    pub fn directories(&self) -> Result<Vec<DirectorySnapshot>> {
        let state = self.store.load()?;
        Ok(state.directories.into_values().collect())
    }

    /// Drop the persisted snapshot for `directory`. Other directories are untouched.
    ///
    /// Returns whether a snapshot existed. Works for directories that no longer exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be locked, loaded, or saved.
    pub fn forget(&self, directory: &Path) -> Result<bool> {
        let key = lookup_key(directory);
        let removed = self
            .store
            .update(|state| state.remove_snapshot(&key).is_some())?;
        if removed {
            tracing::info!(directory = %key.display(), "forgot snapshot");
        }
        Ok(removed)
    }

    fn persist_cache(&self) {
        if let Some(handle) = &self.cache
            && let Err(e) = handle.cache.save(&handle.path)
        {
            tracing::warn!(cache = %handle.path.display(), error = %e, "failed to save digest cache");
        }
    }
}

impl Analyzer<FileStateStore> {
    /// Build an analyzer backed by the context's state directory and configuration.
    #[must_use]
    pub fn from_context(ctx: &DirsnapContext) -> Self {
        let config = &ctx.config;
        let mut fingerprinter =
            Fingerprinter::new(config.performance.mmap_threshold, config.scan.follow_symlinks);

        let cache = config.scan.digest_cache.then(|| {
            let path = ctx.state_dir.join(crate::DIGEST_CACHE_FILE);
            let cache = Arc::new(DigestCache::load(&path));
            CacheHandle { cache, path }
        });
        if let Some(handle) = &cache {
            fingerprinter = fingerprinter.with_cache(Arc::clone(&handle.cache));
        }

        let scanner = EntryScanner::new(ScanLimits::from(&config.scan), fingerprinter)
            .with_threads(config.performance.parallel_threads);
        let store = FileStateStore::new(&ctx.state_dir, config.core.format)
            .with_lock_settings(LockSettings::from(&config.lock));

        Self {
            scanner,
            store,
            cache,
        }
    }
}

/// Canonical form of an existing directory, used as the state key.
fn canonical_key(directory: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(directory)
        .with_context(|| format!("Failed to resolve directory: {}", directory.display()))
}

/// Canonical form when the directory still exists, the absolute path otherwise.
fn lookup_key(directory: &Path) -> PathBuf {
    std::fs::canonicalize(directory)
        .or_else(|_| std::path::absolute(directory))
        .unwrap_or_else(|_| directory.to_path_buf())
}
