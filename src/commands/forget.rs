use crate::DirsnapContext;
use crate::analyzer::Analyzer;
use crate::output;
use anyhow::Result;
use std::path::Path;

/// Remove a directory's stored snapshot; its next analysis starts from scratch
///
/// # Errors
///
/// Returns an error if the state cannot be locked, loaded, or saved.
pub fn execute(ctx: &DirsnapContext, directory: &Path) -> Result<()> {
    let analyzer = Analyzer::from_context(ctx);
    if analyzer.forget(directory)? {
        output::success(&format!("Forgot snapshot of {}", directory.display()));
    } else {
        output::warning(&format!("No snapshot recorded for {}", directory.display()));
    }
    Ok(())
}
