#![allow(clippy::arithmetic_side_effects)] // Counters and version bumps cannot realistically overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Dirsnap - Point-in-time Directory Change Detector
//!
//! Dirsnap fingerprints the immediate contents of a directory, compares them
//! with the snapshot taken the last time that same directory was analyzed,
//! and reports what is new, changed, or deleted. The new snapshot is then
//! persisted for the next run. There is no watcher: every invocation is one
//! full scan-and-compare cycle.
//!
//! ## Features
//!
//! - **Content fingerprints**: SHA-256 per file; a subdirectory is one entry
//!   whose digest summarizes its entire subtree in sorted path order
//! - **Per-entry versions**: start at 1 and increase by one on every detected change
//! - **Scan limits**: a file count ceiling and a per-file size ceiling, with
//!   skipped entries reported as warnings
//! - **Safe persistence**: the whole state is written atomically under an
//!   advisory lock so concurrent analyses never lose each other's updates
//! - **Parallel hashing**: Rayon thread pool, optional size/mtime digest cache
//!
//! ## Architecture
//!
//! - [`scanner`]: enumerates a directory's children and applies the limits
//! - [`fingerprint`]: file and directory digests, digest cache
//! - [`differ`]: new/changed/deleted classification and version resolution
//! - [`storage`]: snapshot data model and state stores
//! - [`analyzer`]: ties the above together behind `analyze`
//! - [`config`]: configuration parsing and validation
//! - [`output`]: terminal rendering
//!
//! ## Example Usage
//!
//! ```no_run
//! use dirsnap::{DirsnapContext, analyzer::Analyzer};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = DirsnapContext::new()?;
//! let analyzer = Analyzer::from_context(&ctx);
//!
//! let result = analyzer.analyze(Path::new("/srv/data"))?;
//! for path in &result.changed {
//!     println!("modified: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

/// Scan-and-compare orchestration.
pub mod analyzer;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Classification of previous against current fingerprints.
pub mod differ;

/// Content digests for files and directory subtrees.
pub mod fingerprint;

/// Advisory locking of the persisted state.
pub mod lock;

/// Output formatting and colorized rendering.
pub mod output;

/// Directory entry enumeration with admission limits.
pub mod scanner;

/// Snapshot data model and state persistence.
pub mod storage;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the dirsnap binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default state directory name within the home directory.
pub const DEFAULT_STATE_DIR: &str = ".dirsnap";

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/dirsnap/config";

/// State file name for the JSON format.
pub const STATE_FILE_JSON: &str = "state.json";

/// State file name for the binary format.
pub const STATE_FILE_BINARY: &str = "state.bin";

/// Digest cache file name inside the state directory.
pub const DIGEST_CACHE_FILE: &str = "digest-cache.bin";

/// Resolved locations and settings for one dirsnap invocation.
///
/// # Examples
///
/// ```no_run
/// use dirsnap::DirsnapContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Default paths, honoring DIRSNAP_CONFIG_PATH and DIRSNAP_STATE_PATH
/// let ctx = DirsnapContext::new()?;
///
/// // Explicit paths (for testing)
/// let ctx = DirsnapContext::new_explicit(
///     "/tmp/dirsnap-state".into(),
///     "/tmp/dirsnap-config".into(),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirsnapContext {
    /// Directory holding the state file, lock file, and digest cache.
    pub state_dir: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl DirsnapContext {
    /// Creates a context from the default or environment-provided paths.
    ///
    /// `DIRSNAP_CONFIG_PATH` overrides the config location and
    /// `DIRSNAP_STATE_PATH` overrides the configured state directory.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the configuration
    /// file cannot be read, created, or validated.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var("DIRSNAP_CONFIG_PATH") {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let config = config::Config::load(&config_path)?;

        let state_dir = if let Ok(path) = std::env::var("DIRSNAP_STATE_PATH") {
            PathBuf::from(path)
        } else {
            utils::expand_tilde(&config.core.state_dir)
        };

        Ok(Self {
            state_dir,
            config_path,
            config,
        })
    }

    /// Creates a context with explicit paths, writing a default config if none exists.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(state_dir: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            config::Config::load(&config_path)?
        } else {
            let mut config = config::Config::default();
            config.core.state_dir.clone_from(&state_dir);
            config.save(&config_path)?;
            config
        };

        Ok(Self {
            state_dir,
            config_path,
            config,
        })
    }

    /// Path of the state file for the configured format.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(self.config.core.format.file_name())
    }
}
