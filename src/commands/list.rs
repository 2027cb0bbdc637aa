use crate::DirsnapContext;
use crate::analyzer::Analyzer;
use crate::output;
use anyhow::Result;
use colored::Colorize;

/// List every directory that has a stored snapshot
///
/// # Errors
///
/// Returns an error if the state cannot be loaded.
pub fn execute(ctx: &DirsnapContext) -> Result<()> {
    let analyzer = Analyzer::from_context(ctx);
    let snapshots = analyzer.directories()?;

    if snapshots.is_empty() {
        output::info("No directories analyzed yet");
        return Ok(());
    }

    for snapshot in snapshots {
        let count = snapshot.entries.len();
        let noun = if count == 1 { "entry" } else { "entries" };
        println!(
            "{}  {}",
            snapshot.directory_path.display(),
            format!("({count} {noun})").dimmed()
        );
    }
    Ok(())
}
