use anyhow::{Context, Result, bail};
use log::info;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::core::git::{RepoInfo, RepoSnapshotProvider};
use crate::core::problem::Problem;

/// What `fix` managed to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Paths whose fix command ran, in first-seen order, without duplicates.
    pub fixed_paths: Vec<String>,
    /// Paths left alone because they also have unstaged changes.
    pub skipped_paths: Vec<String>,
    pub fixed: usize,
    pub total: usize,
}

impl FixOutcome {
    pub fn remaining(&self) -> usize {
        self.total - self.fixed
    }
}

/// Runs shell commands on behalf of the fixer.
pub trait CommandRunner {
    fn run(&self, command: &str, workdir: &Path) -> Result<()>;
}

/// Runs each command through `sh -c`.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, workdir: &Path) -> Result<()> {
        info!("running: {command}");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to launch `{command}`"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` returned with non-zero exit code ({}): {}",
                command,
                output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            );
        }
        Ok(())
    }
}

/// Applies every fixable problem's command in order, then stages the fixed files.
///
/// Files that also have unstaged changes are not touched: staging them would
/// pull those changes into the commit. Their problems count as remaining.
/// A failing fix command stops everything; nothing is staged in that case.
pub fn apply_fixes(
    problems: &[Problem],
    info: &RepoInfo,
    runner: &dyn CommandRunner,
    repo: &dyn RepoSnapshotProvider,
) -> Result<FixOutcome> {
    let workdir = repo.workdir();
    let mut fixed_paths: Vec<String> = Vec::new();
    let mut skipped_paths: Vec<String> = Vec::new();
    let mut fixed = 0;

    for problem in problems {
        let Some(command) = problem.fix_command() else {
            continue;
        };
        if info.is_unstaged(problem.path()) {
            if !skipped_paths.iter().any(|p| p == problem.path()) {
                println!(
                    "Skipping fix for {}: it also has unstaged changes",
                    problem.path()
                );
                skipped_paths.push(problem.path().to_string());
            }
            continue;
        }
        println!("Applying fix for {}: {}", problem.path(), problem.message());
        println!("    {command}");
        runner.run(command, &workdir)?;
        fixed += 1;
        if !fixed_paths.iter().any(|p| p == problem.path()) {
            fixed_paths.push(problem.path().to_string());
        }
    }

    if !fixed_paths.is_empty() {
        repo.stage_files(&fixed_paths)
            .context("Failed to stage fixed files")?;
    }

    Ok(FixOutcome {
        fixed_paths,
        skipped_paths,
        fixed,
        total: problems.len(),
    })
}
