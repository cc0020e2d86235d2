use anyhow::Result;
use log::{LevelFilter, debug};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use crate::builders::fixer::{ShellRunner, apply_fixes};
use crate::builders::hooks::{self, HookInstall};
use crate::builders::reporter::{ConsoleReporter, JsonReporter, ProblemReporter, Verdict};
use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::core::config::{Config, ConfigManager, ConfigProvider};
use crate::core::engine::CheckEngine;
use crate::core::git::{Git2Client, RepoSnapshot, RepoSnapshotProvider};
use crate::core::problem::Problem;

/// Report format for `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// `1 issue`, `2 issues`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Terminal logging on stderr. Warnings only, unless `--verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    // A second logger (e.g. in tests) is harmless.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

/// Opens the repository containing the current directory and its configuration.
fn open_repository() -> Result<(Git2Client, ConfigManager)> {
    let client = Git2Client::new(std::env::current_dir()?)?;
    let config_manager = ConfigManager::in_git_dir(client.common_dir());
    Ok((client, config_manager))
}

/// Captures the snapshot once and runs every check over it.
pub fn collect_problems(repo: &dyn RepoSnapshotProvider, config: &Config) -> Result<Vec<Problem>> {
    let snapshot = RepoSnapshot::capture(repo)?;
    check_snapshot(&snapshot, config)
}

fn check_snapshot(snapshot: &RepoSnapshot, config: &Config) -> Result<Vec<Problem>> {
    let engine = CheckEngine::from_config(config, &snapshot.info)?;
    engine.check_snapshot(snapshot)
}

fn use_color(config: &Config) -> bool {
    config.settings.color && io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

pub fn run_check(output: OutputFormat) -> Result<ExitCode> {
    let (client, config_manager) = open_repository()?;
    let config = config_manager.load_config()?;
    let problems = collect_problems(&client, &config)?;
    debug!("{} problems found", problems.len());

    let verdict = match output {
        OutputFormat::Human => {
            ConsoleReporter::new(use_color(&config)).report(&problems, &mut io::stderr().lock())?
        }
        OutputFormat::Json => JsonReporter.report(&problems, &mut io::stdout().lock())?,
    };
    Ok(ExitCode::from(verdict.exit_code()))
}

pub fn run_fix() -> Result<ExitCode> {
    let (client, config_manager) = open_repository()?;
    let config = config_manager.load_config()?;
    let snapshot = RepoSnapshot::capture(&client)?;
    let problems = check_snapshot(&snapshot, &config)?;

    if problems.is_empty() {
        println!("No issues detected.");
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = apply_fixes(&problems, &snapshot.info, &ShellRunner, &client)?;
    if !outcome.fixed_paths.is_empty() {
        println!("Staged {}", outcome.fixed_paths.join(" "));
    }

    let fixed = format!("{} of {}", outcome.fixed, plural(outcome.total, "issue"));
    if outcome.remaining() == 0 {
        println!("Fixed {fixed}.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "Fixed {fixed}. {} remain.",
            plural(outcome.remaining(), "issue")
        );
        Ok(ExitCode::from(Verdict::Fail.exit_code()))
    }
}

pub fn initialize_repository() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    if config_manager.initialize()? {
        println!(
            "✓ Wrote default configuration to {}",
            config_manager.get_config_path()?.display()
        );
    } else {
        println!("ℹ️  Configuration already exists");
    }
    println!("Run 'commit-hygiene install-hook' to check every commit");
    Ok(())
}

pub fn install_hooks() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    match hooks::install_pre_commit_hook(config_manager.get_git_dir())? {
        HookInstall::Installed => println!("✓ Installed pre-commit hook"),
        HookInstall::ReplacedExisting => {
            println!("ℹ️  Backed up existing pre-commit hook to pre-commit.backup");
            println!("✓ Installed pre-commit hook");
        }
        HookInstall::AlreadyInstalled => println!("ℹ️  pre-commit hook already installed"),
    }
    Ok(())
}

pub fn validate_configuration() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config()?;
    let issues = StandardValidator::new().validate_config(&config);

    if issues.is_empty() {
        println!("✓ Configuration is valid.");
        Ok(())
    } else {
        println!("⚠️  Found issues in configuration:");
        for issue in issues {
            println!("  - {issue}");
        }
        anyhow::bail!("Configuration validation failed.");
    }
}
