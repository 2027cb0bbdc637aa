//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion)
//! - Human-readable sizes
//!
//! # Submodules
//!
//! - [`serialization`]: JSON and binary state encoding
//! - [`thread_pool`]: hashing thread pool

/// JSON and bincode serialization helpers
pub mod serialization;
/// Thread pool configuration for parallel hashing
pub mod thread_pool;

use std::path::{Path, PathBuf};

/// Expands a path starting with `~` to the user's home directory.
///
/// Paths without a leading `~/`, or when no home directory is known, are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Formats a byte count with binary units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = size as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size} {}", UNITS[0])
    } else {
        format!("{value:.2} {}", UNITS[unit_index])
    }
}
