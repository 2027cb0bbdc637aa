use crate::DirsnapContext;
use crate::analyzer::Analyzer;
use crate::output;
use anyhow::Result;
use std::path::Path;

/// Print the stored snapshot of a directory
///
/// # Errors
///
/// Returns an error if the directory was never analyzed or the state cannot be loaded.
pub fn execute(ctx: &DirsnapContext, directory: &Path, json: bool) -> Result<()> {
    let analyzer = Analyzer::from_context(ctx);
    let Some(snapshot) = analyzer.snapshot(directory)? else {
        anyhow::bail!(
            "No snapshot recorded for {}. Run 'dirsnap analyze' first",
            directory.display()
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        output::print_snapshot(&snapshot);
    }
    Ok(())
}
