use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const HOOK_MARKER: &str = "commit-hygiene pre-commit hook";

const PRE_COMMIT_HOOK: &str = r#"#!/bin/sh
# commit-hygiene pre-commit hook

# Check if commit-hygiene is available
if ! command -v commit-hygiene > /dev/null 2>&1; then
    echo "Error: commit-hygiene not found in PATH; refusing to commit unchecked" >&2
    exit 1
fi

exec commit-hygiene check
"#;

/// What `install_pre_commit_hook` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookInstall {
    Installed,
    /// A foreign hook was moved to `pre-commit.backup` first.
    ReplacedExisting,
    AlreadyInstalled,
}

/// Installs the hook into `git_dir/hooks`.
///
/// `git_dir` is the common git directory, so the hook also runs for commits
/// made in linked worktrees.
pub fn install_pre_commit_hook(git_dir: &Path) -> Result<HookInstall> {
    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir).context("Failed to create hooks directory")?;

    let hook_path = hooks_dir.join("pre-commit");
    let mut outcome = HookInstall::Installed;

    if hook_path.exists() {
        // Check if it's already our hook
        let existing_content = fs::read_to_string(&hook_path)?;
        if existing_content.contains(HOOK_MARKER) {
            return Ok(HookInstall::AlreadyInstalled);
        }

        // Backup existing hook
        let backup_path = hooks_dir.join("pre-commit.backup");
        fs::rename(&hook_path, backup_path).context("Failed to back up existing hook")?;
        outcome = HookInstall::ReplacedExisting;
    }

    fs::write(&hook_path, PRE_COMMIT_HOOK).context("Failed to write pre-commit hook")?;

    // Make executable on Unix systems
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    Ok(outcome)
}
