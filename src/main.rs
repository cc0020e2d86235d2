//! Blocks a commit when a staged file breaks the repository's hygiene rules:
//! odd characters in the path, a file with both staged and unstaged changes,
//! a forbidden marker in the contents, or a file its formatter would rewrite.
//! Formatting problems come with one copyable command that fixes them all.
use clap::{Parser, Subcommand};
use commit_hygiene::utils::{self, OutputFormat};
use std::process::ExitCode;

/// Exit status when the check itself could not run.
const FATAL_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "commit-hygiene", version)]
#[command(about = "Rejects commits whose staged files break hygiene rules")]
struct Cli {
    /// Log what the checker is doing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the staged files (this is what the pre-commit hook runs)
    Check {
        /// Report format
        #[arg(long, value_enum, default_value = "human")]
        output: OutputFormat,
    },
    /// Apply every available fix and stage the fixed files
    Fix,
    /// Write the default configuration to .git/commit-hygiene.toml
    Init,
    /// Install the pre-commit hook for this repository
    InstallHook,
    /// Validate the configuration file
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { output } => utils::run_check(output),
        Commands::Fix => utils::run_fix(),
        Commands::Init => utils::initialize_repository().map(|()| ExitCode::SUCCESS),
        Commands::InstallHook => utils::install_hooks().map(|()| ExitCode::SUCCESS),
        Commands::Validate => utils::validate_configuration().map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            ExitCode::from(FATAL_EXIT)
        }
    }
}
