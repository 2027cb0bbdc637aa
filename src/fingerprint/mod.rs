//! Content fingerprints.
//!
//! A file fingerprint is the lower-case hex SHA-256 of its bytes. A directory
//! fingerprint is the SHA-256 of the concatenated file fingerprints of every
//! file in its subtree, taken in lexicographic path order, so it only depends
//! on content and relative layout and never on enumeration order.

/// Size/mtime keyed digest memo persisted between scans.
pub mod cache;

pub use cache::DigestCache;

use memmap2::MmapOptions;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Files at or above this size are hashed through a memory map.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1_048_576;

/// Computes the SHA-256 of raw bytes as lower-case hex.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Computes the SHA-256 of a file's contents.
///
/// # Errors
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> io::Result<String> {
    hash_file_with_threshold(path, DEFAULT_MMAP_THRESHOLD)
}

/// Computes a file digest, memory mapping files of at least `mmap_threshold` bytes.
///
/// # Errors
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn hash_file_with_threshold(path: &Path, mmap_threshold: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    if size == 0 {
        return Ok(hash_bytes(b""));
    }

    if size < mmap_threshold {
        let mut content = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        file.read_to_end(&mut content)?;
        Ok(hash_bytes(&content))
    } else {
        // SAFETY: the map is read-only and dropped before returning.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        Ok(hash_bytes(&mmap))
    }
}

/// Combines already computed file digests into a directory digest.
///
/// Digests are concatenated in lexicographic order of their paths, whatever
/// order they are passed in. An empty list yields the digest of the empty string.
#[must_use]
pub fn combine_digests(mut file_digests: Vec<(PathBuf, String)>) -> String {
    file_digests.sort_by(|(a, _), (b, _)| a.as_os_str().cmp(b.as_os_str()));

    let mut hasher = Sha256::new();
    for (_, digest) in &file_digests {
        hasher.update(digest.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Computes file and directory digests with the configured I/O strategy.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    mmap_threshold: u64,
    follow_symlinks: bool,
    cache: Option<Arc<DigestCache>>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_MMAP_THRESHOLD, false)
    }
}

impl Fingerprinter {
    #[must_use]
    pub const fn new(mmap_threshold: u64, follow_symlinks: bool) -> Self {
        Self {
            mmap_threshold,
            follow_symlinks,
            cache: None,
        }
    }

    /// Memoize file digests in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DigestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    #[must_use]
    pub const fn cache(&self) -> Option<&Arc<DigestCache>> {
        self.cache.as_ref()
    }

    /// Digest of one file, served from the cache when size and mtime still match.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn file_digest(&self, path: &Path) -> io::Result<String> {
        let Some(cache) = &self.cache else {
            return hash_file_with_threshold(path, self.mmap_threshold);
        };

        let metadata = std::fs::metadata(path)?;
        if let Some(digest) = cache.lookup(path, &metadata) {
            return Ok(digest);
        }

        let digest = hash_file_with_threshold(path, self.mmap_threshold)?;
        cache.record(path, &metadata, &digest);
        Ok(digest)
    }

    /// Aggregate digest over every file below `dir`.
    ///
    /// Descendant files are hashed in parallel; the result is still ordered
    /// by path. Any unreadable descendant fails the whole directory.
    ///
    /// # Errors
    /// Returns the first I/O error met while walking or hashing the subtree.
    pub fn directory_digest(&self, dir: &Path) -> io::Result<String> {
        let files = self.subtree_files(dir)?;

        let digests = files
            .into_par_iter()
            .map(|path| {
                let digest = self.file_digest(&path)?;
                Ok((path, digest))
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(combine_digests(digests))
    }

    /// Every file in the subtree rooted at `dir`, at any depth.
    ///
    /// Symlinks to files count as files and hash their target. Symlinked
    /// directories are only descended into when following symlinks, and a
    /// dangling symlink is an error.
    fn subtree_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).follow_links(self.follow_symlinks) {
            let entry = entry.map_err(io::Error::from)?;
            let file_type = entry.file_type();
            if file_type.is_file()
                || (file_type.is_symlink() && std::fs::metadata(entry.path())?.is_file())
            {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}
