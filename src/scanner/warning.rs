use crate::utils::format_size;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Why an entry was left out of a scan. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanWarning {
    /// More top-level files than the count limit; the rest were not considered
    Truncated {
        #[serde(serialize_with = "lossy_path")]
        directory: PathBuf,
        limit: usize,
        found: usize,
    },
    /// File larger than the size limit
    Oversized {
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        size: u64,
        limit: u64,
    },
    /// Permission denied while reading the entry
    AccessDenied {
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        reason: String,
    },
    /// Any other I/O failure while reading the entry
    Unreadable {
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        reason: String,
    },
    /// Symlink (when not followed), socket, FIFO, device, or a name that is not UTF-8
    Unsupported {
        #[serde(serialize_with = "lossy_path")]
        path: PathBuf,
        kind: &'static str,
    },
}

/// Warnings name entries the state cannot hold, so paths are written lossily.
fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

impl ScanWarning {
    /// Maps an I/O failure on `path` to the matching warning.
    #[must_use]
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::AccessDenied {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        } else {
            Self::Unreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    }

    /// Path of the skipped entry, or the scanned directory for truncation.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Truncated { directory, .. } => directory,
            Self::Oversized { path, .. }
            | Self::AccessDenied { path, .. }
            | Self::Unreadable { path, .. }
            | Self::Unsupported { path, .. } => path,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().to_string(),
    )
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                directory,
                limit,
                found,
            } => write!(
                f,
                "{} holds {found} files; only the first {limit} were processed",
                directory.display()
            ),
            Self::Oversized { path, size, limit } => write!(
                f,
                "Skipped file '{}': {} exceeds the {} limit",
                file_name(path),
                format_size(*size),
                format_size(*limit)
            ),
            Self::AccessDenied { path, reason } => {
                write!(f, "Access denied to '{}': {reason}", file_name(path))
            }
            Self::Unreadable { path, reason } => {
                write!(f, "Skipped '{}': {reason}", file_name(path))
            }
            Self::Unsupported { path, kind } => {
                write!(f, "Skipped '{}': {kind} entries are not scanned", file_name(path))
            }
        }
    }
}
