use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use dirsnap::cli::{Cli, Commands};
use dirsnap::output::{self, Verbosity};
use dirsnap::{DirsnapContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let ctx = DirsnapContext::new()?;

    match cli.command {
        Commands::Analyze {
            directory,
            short,
            json,
        } => commands::analyze::execute(&ctx, &directory, short, json),
        Commands::Show { directory, json } => commands::show::execute(&ctx, &directory, json),
        Commands::List => commands::list::execute(&ctx),
        Commands::Forget { directory } => commands::forget::execute(&ctx, &directory),
        Commands::Completion { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` enables debug logs and errors only are shown by default.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
