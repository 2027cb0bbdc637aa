use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Categorized state store failures with actionable guidance
#[derive(Debug)]
pub enum StoreError {
    /// Reading, writing, or replacing a store file failed
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Persisted state exists but cannot be decoded
    Malformed {
        /// State file that failed to decode
        path: PathBuf,
        /// Decoder message
        reason: String,
    },
    /// In-memory state could not be encoded
    Encode(String),
    /// Another process kept the state lock for the whole timeout
    LockTimeout {
        /// Lock file path
        path: PathBuf,
        /// How long acquisition was retried
        waited: Duration,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get actionable guidance for resolving this error
    #[must_use]
    pub const fn guidance(&self) -> &'static str {
        match self {
            Self::Io { .. } => "Check that the state directory exists and is writable",
            Self::Malformed { .. } => {
                "The state file is corrupt; move it aside to start from an empty state"
            }
            Self::Encode(_) => "A path in the state cannot be encoded; rename non-UTF-8 entries",
            Self::LockTimeout { .. } => {
                "Another analysis is still running; retry once it has finished"
            }
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "State store I/O error at {}: {source}", path.display())
            }
            Self::Malformed { path, reason } => {
                write!(f, "Malformed state file {}: {reason}", path.display())
            }
            Self::Encode(reason) => write!(f, "Failed to encode state: {reason}"),
            Self::LockTimeout { path, waited } => write!(
                f,
                "Timed out after {} waiting for state lock {}",
                humantime::format_duration(*waited),
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
