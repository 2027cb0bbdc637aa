pub mod analyze;
pub mod forget;
pub mod list;
pub mod show;

use anyhow::{Context, Result};
use std::path::Path;

/// Precondition shared by the commands that take a directory argument.
///
/// # Errors
///
/// Returns a user-facing error if `directory` does not exist or is not a directory.
pub fn ensure_directory(directory: &Path) -> Result<()> {
    let metadata = std::fs::metadata(directory)
        .with_context(|| format!("Directory does not exist: {}", directory.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("Not a directory: {}", directory.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_directory() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x")?;

        assert!(ensure_directory(dir.path()).is_ok());
        let err = ensure_directory(&file).unwrap_err();
        assert!(err.to_string().contains("Not a directory"));
        let err = ensure_directory(&dir.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        Ok(())
    }
}
