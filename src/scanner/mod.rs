//! Entry scanner: fingerprints the immediate children of one directory.
//!
//! Top-level files are admitted through two limits before hashing: a count
//! ceiling (first N files in name order) and a per-file size ceiling.
//! Subdirectories are not counted and are fingerprinted as one opaque entry
//! summarizing their whole subtree. Anything that cannot be read is skipped
//! with a [`ScanWarning`]; only failing to list the directory itself is an error.

/// Skip and truncation signals produced while scanning.
pub mod warning;

pub use warning::ScanWarning;

use crate::config::{Config, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES};
use crate::fingerprint::Fingerprinter;
use crate::storage::{EntryFingerprint, EntryMap};
use crate::utils::thread_pool;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

/// Admission limits applied to top-level files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Maximum number of top-level files fingerprinted per scan
    pub max_files: usize,
    /// Files larger than this many bytes are skipped
    pub max_file_size: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl From<&crate::config::ScanConfig> for ScanLimits {
    fn from(config: &crate::config::ScanConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_size: config.max_file_size,
        }
    }
}

/// Fingerprints of the surviving entries plus everything that was skipped
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Fingerprints keyed by full child path, all at version 1
    pub entries: EntryMap,
    /// Skipped entries and truncation, in the order they were met
    pub warnings: Vec<ScanWarning>,
}

/// Scanner for the immediate children of a directory
#[derive(Debug, Clone)]
pub struct EntryScanner {
    limits: ScanLimits,
    fingerprinter: Fingerprinter,
    threads: usize,
}

impl Default for EntryScanner {
    fn default() -> Self {
        Self::new(ScanLimits::default(), Fingerprinter::default())
    }
}

fn record(warnings: &mut Vec<ScanWarning>, warning: ScanWarning) {
    tracing::warn!(path = %warning.path().display(), "{warning}");
    warnings.push(warning);
}

#[cfg(unix)]
fn special_kind(file_type: &FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_fifo() {
        "FIFO"
    } else if file_type.is_socket() {
        "socket"
    } else if file_type.is_block_device() || file_type.is_char_device() {
        "device"
    } else {
        "special"
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: &FileType) -> &'static str {
    "special"
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl EntryScanner {
    #[must_use]
    pub fn new(limits: ScanLimits, fingerprinter: Fingerprinter) -> Self {
        Self {
            limits,
            fingerprinter,
            threads: thread_pool::available_threads().min(8),
        }
    }

    /// Build a scanner from configuration, without a digest cache.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let fingerprinter = Fingerprinter::new(
            config.performance.mmap_threshold,
            config.scan.follow_symlinks,
        );
        Self::new(ScanLimits::from(&config.scan), fingerprinter)
            .with_threads(config.performance.parallel_threads)
    }

    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub const fn limits(&self) -> ScanLimits {
        self.limits
    }

    #[must_use]
    pub const fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    /// Scan `directory` and fingerprint every admitted child.
    ///
    /// Entry keys are `directory.join(name)`, so callers that want canonical
    /// keys pass a canonical directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `directory` itself cannot be listed or the hashing
    /// pool cannot be started. Individual entries never fail the scan.
    pub fn scan(&self, directory: &Path) -> Result<ScanOutcome> {
        let mut warnings = Vec::new();
        let (mut files, mut dirs) = self.list_children(directory, &mut warnings)?;

        files.sort();
        dirs.sort();

        if files.len() > self.limits.max_files {
            record(
                &mut warnings,
                ScanWarning::Truncated {
                    directory: directory.to_path_buf(),
                    limit: self.limits.max_files,
                    found: files.len(),
                },
            );
            files.truncate(self.limits.max_files);
        }

        let files = self.admit_by_size(files, &mut warnings);
        tracing::debug!(
            directory = %directory.display(),
            files = files.len(),
            directories = dirs.len(),
            "fingerprinting entries"
        );

        let fingerprinter = &self.fingerprinter;
        let (file_digests, dir_digests) = thread_pool::run_in_pool(self.threads, || {
            rayon::join(
                || {
                    files
                        .into_par_iter()
                        .map(|path| {
                            let digest = fingerprinter.file_digest(&path);
                            (path, digest)
                        })
                        .collect::<Vec<(PathBuf, io::Result<String>)>>()
                },
                || {
                    dirs.into_par_iter()
                        .map(|path| {
                            let digest = fingerprinter.directory_digest(&path);
                            (path, digest)
                        })
                        .collect::<Vec<(PathBuf, io::Result<String>)>>()
                },
            )
        })?;

        let mut entries = EntryMap::new();
        for (path, digest) in file_digests.into_iter().chain(dir_digests) {
            match digest {
                Ok(digest) => {
                    let name = display_name(&path);
                    entries.insert(path, EntryFingerprint::new(name, digest));
                }
                Err(e) => record(&mut warnings, ScanWarning::from_io(&path, &e)),
            }
        }

        Ok(ScanOutcome { entries, warnings })
    }

    /// Split the children of `directory` into files and subdirectories.
    fn list_children(
        &self,
        directory: &Path,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let read_dir = fs::read_dir(directory)
            .with_context(|| format!("Failed to read directory: {}", directory.display()))?;

        let mut files = Vec::new();
        let mut dirs = Vec::new();

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    record(warnings, ScanWarning::from_io(directory, &e));
                    continue;
                }
            };
            let path = entry.path();

            // Entry keys are persisted as text
            if entry.file_name().to_str().is_none() {
                record(
                    warnings,
                    ScanWarning::Unsupported {
                        path,
                        kind: "non-UTF-8 name",
                    },
                );
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    record(warnings, ScanWarning::from_io(&path, &e));
                    continue;
                }
            };

            let file_type = if file_type.is_symlink() {
                if !self.fingerprinter.follow_symlinks() {
                    record(
                        warnings,
                        ScanWarning::Unsupported {
                            path,
                            kind: "symbolic link",
                        },
                    );
                    continue;
                }
                match fs::metadata(&path) {
                    Ok(metadata) => metadata.file_type(),
                    Err(e) => {
                        record(warnings, ScanWarning::from_io(&path, &e));
                        continue;
                    }
                }
            } else {
                file_type
            };

            if file_type.is_file() {
                files.push(path);
            } else if file_type.is_dir() {
                dirs.push(path);
            } else {
                let kind = special_kind(&file_type);
                record(warnings, ScanWarning::Unsupported { path, kind });
            }
        }

        Ok((files, dirs))
    }

    /// Drop files above the size limit or whose size cannot be read.
    fn admit_by_size(&self, files: Vec<PathBuf>, warnings: &mut Vec<ScanWarning>) -> Vec<PathBuf> {
        let limit = self.limits.max_file_size;
        let mut admitted = Vec::with_capacity(files.len());

        for path in files {
            match fs::metadata(&path) {
                Ok(metadata) if metadata.len() > limit => record(
                    warnings,
                    ScanWarning::Oversized {
                        path,
                        size: metadata.len(),
                        limit,
                    },
                ),
                Ok(_) => admitted.push(path),
                Err(e) => record(warnings, ScanWarning::from_io(&path, &e)),
            }
        }

        admitted
    }
}
