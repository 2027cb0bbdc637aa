//! Output formatting and styling for the dirsnap CLI.
//!
//! - Dimmed colors for routine messages
//! - Bold colors for warnings and errors
//! - Git-status style rendering of comparison results
//! - Verbosity control (quiet, normal, verbose)

use crate::scanner::ScanWarning;
use crate::storage::{ComparisonResult, DirectorySnapshot, EntryChange};
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress informational messages, show only warnings and errors.
    Quiet = 0,
    /// Default verbosity level, show all standard messages.
    Normal = 1,
    /// Show verbose debug messages in addition to standard output.
    Verbose = 2,
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a verbose debug message (only in verbose mode).
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints one line per skipped entry on stderr.
pub fn print_warnings(warnings: &[ScanWarning]) {
    for w in warnings {
        warning(&format!("warning: {w}"));
    }
}

fn colored_change(change: &EntryChange) -> String {
    let path = change.path().display().to_string();
    match change {
        EntryChange::Added(_) => format!("  {}   {}", "new:".green(), path.green()),
        EntryChange::Changed(_) => format!("  {}  {}", "modified:".yellow(), path.yellow()),
        EntryChange::Deleted(_) => format!("  {}   {}", "deleted:".red(), path.red()),
    }
}

/// Prints a comparison on stdout, grouped like `git status` or one `X path` line per change.
pub fn print_comparison(directory: &Path, result: &ComparisonResult, short: bool) {
    if short {
        for change in result.changes() {
            println!("{} {}", change.status_char(), change.path().display());
        }
        return;
    }

    println!("{} {}", "Analyzed".bold(), directory.display());
    if result.is_empty() {
        println!("No changes since the last snapshot");
        return;
    }

    let groups: [(&str, Vec<EntryChange>); 3] = [
        (
            "New entries:",
            result.added.iter().cloned().map(EntryChange::Added).collect(),
        ),
        (
            "Changed entries:",
            result.changed.iter().cloned().map(EntryChange::Changed).collect(),
        ),
        (
            "Deleted entries:",
            result.deleted.iter().cloned().map(EntryChange::Deleted).collect(),
        ),
    ];

    for (title, changes) in groups.iter().filter(|(_, c)| !c.is_empty()) {
        println!("\n{title}");
        for change in changes {
            println!("{}", colored_change(change));
        }
    }
}

/// Prints a persisted snapshot: version, short digest, and name per entry.
pub fn print_snapshot(snapshot: &DirectorySnapshot) {
    println!("{} {}", "Snapshot".bold(), snapshot.directory_path.display());
    if snapshot.entries.is_empty() {
        println!("(no entries)");
        return;
    }

    for entry in snapshot.entries.values() {
        let short_digest = entry.digest.get(..12).unwrap_or(&entry.digest);
        println!(
            "  {:>4}  {}  {}",
            format!("v{}", entry.version).cyan(),
            short_digest.dimmed(),
            entry.name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_round_trip() {
        let levels = [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose];
        for level in &levels {
            set_verbosity(*level);
            assert_eq!(get_verbosity(), *level);
        }
        set_verbosity(Verbosity::Normal);
    }

    #[test]
    fn test_colored_change_contains_path() {
        colored::control::set_override(false);
        let line = colored_change(&EntryChange::Changed("/d/file".into()));
        assert!(line.contains("modified:"));
        assert!(line.ends_with("/d/file"));
    }
}
