use crate::DirsnapContext;
use crate::analyzer::Analyzer;
use crate::output;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// JSON shape of an analysis; warnings stay outside the comparison itself
#[derive(Serialize)]
struct JsonReport<'a> {
    directory: &'a Path,
    result: &'a crate::storage::ComparisonResult,
    warnings: &'a [crate::scanner::ScanWarning],
}

/// Analyze a directory and print what changed since its last snapshot
///
/// # Errors
///
/// Returns an error if:
/// - The directory does not exist or is not a directory
/// - The state cannot be locked, loaded, or saved
pub fn execute(ctx: &DirsnapContext, directory: &Path, short: bool, json: bool) -> Result<()> {
    super::ensure_directory(directory)?;

    let analyzer = Analyzer::from_context(ctx);
    let analysis = analyzer.analyze_with_warnings(directory)?;

    if json {
        let report = JsonReport {
            directory: &analysis.directory,
            result: &analysis.result,
            warnings: &analysis.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::print_warnings(&analysis.warnings);
    output::print_comparison(&analysis.directory, &analysis.result, short);
    if !short {
        output::verbose(&format!("State saved to {}", ctx.state_path().display()));
    }
    Ok(())
}
