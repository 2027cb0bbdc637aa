#![allow(dead_code)]

use anyhow::Result;
use dirsnap::DirsnapContext;
use dirsnap::analyzer::Analyzer;
use dirsnap::config::StateFormat;
use dirsnap::scanner::{EntryScanner, ScanLimits};
use dirsnap::fingerprint::Fingerprinter;
use dirsnap::storage::FileStateStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch area with a directory to analyze and a separate state directory
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub target: PathBuf,
    pub state_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("target");
        let state_dir = temp_dir.path().join("state");
        fs::create_dir_all(&target)?;
        Ok(Self {
            temp_dir,
            target,
            state_dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Canonical target directory, the form used as the state key
    pub fn root(&self) -> PathBuf {
        fs::canonicalize(&self.target).expect("target exists")
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.target.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Analyzer over the on-disk state store with the given limits
    pub fn analyzer(&self, limits: ScanLimits) -> Analyzer<FileStateStore> {
        let scanner = EntryScanner::new(limits, Fingerprinter::default()).with_threads(2);
        Analyzer::new(scanner, FileStateStore::new(&self.state_dir, StateFormat::Json))
    }

    /// Context whose config and state live inside the scratch area
    pub fn context(&self) -> Result<DirsnapContext> {
        DirsnapContext::new_explicit(self.state_dir.clone(), self.path().join("config"))
    }
}
