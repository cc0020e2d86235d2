use anyhow::{Context, Result, anyhow};
use git2::{Delta, DiffDelta, DiffOptions, Repository};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str;

/// Trait defining the repository queries the checker needs.
/// This abstraction allows the engine to run against a fake repository in tests.
pub trait RepoSnapshotProvider {
    /// Returns the paths staged for the next commit, in the order git reports them.
    /// Staged deletions are left out since there is no file left to inspect.
    fn staged_files(&self) -> Result<Vec<String>>;

    /// Returns the tracked paths whose working tree copy differs from the index.
    fn unstaged_files(&self) -> Result<Vec<String>>;

    /// Returns the root of the working tree. Staged paths are relative to it.
    fn workdir(&self) -> PathBuf;

    /// Stages the given paths (adds them to the index).
    fn stage_files(&self, paths: &[String]) -> Result<()>;
}

/// The repository state every rule sees during one run.
///
/// Captured once before any check starts and never refreshed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub unstaged_files: HashSet<String>,
    pub workdir: PathBuf,
}

impl RepoInfo {
    pub fn new<I, S>(unstaged_files: I, workdir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unstaged_files: unstaged_files.into_iter().map(Into::into).collect(),
            workdir: workdir.into(),
        }
    }

    pub fn is_unstaged(&self, path: &str) -> bool {
        self.unstaged_files.contains(path)
    }

    /// Resolves a repository-relative path against the working tree.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.workdir.join(path)
    }

    /// Whether the working tree copy of `path` is a regular file.
    ///
    /// Submodules, directories and files deleted after staging are not.
    pub fn is_regular_file(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path)).is_ok_and(|meta| meta.is_file())
    }
}

/// The staged file list plus the frozen [`RepoInfo`].
#[derive(Debug, Clone)]
pub struct RepoSnapshot {
    pub staged: Vec<String>,
    pub info: RepoInfo,
}

impl RepoSnapshot {
    /// Queries the provider exactly once for each list.
    pub fn capture(provider: &dyn RepoSnapshotProvider) -> Result<Self> {
        let staged = provider
            .staged_files()
            .context("Failed to list staged files")?;
        let unstaged = provider
            .unstaged_files()
            .context("Failed to list unstaged files")?;
        debug!(
            "snapshot: {} staged, {} unstaged",
            staged.len(),
            unstaged.len()
        );

        Ok(Self {
            staged,
            info: RepoInfo::new(unstaged, provider.workdir()),
        })
    }
}

/// Concrete implementation of `RepoSnapshotProvider` using the git2 crate.
pub struct Git2Client {
    repo: Repository,
}

impl Git2Client {
    /// Opens the repository containing `path` (searching parent directories).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .with_context(|| format!("Not in a Git repository: {}", path.display()))?;
        if repo.is_bare() {
            anyhow::bail!("Cannot check a bare repository: {}", repo.path().display());
        }
        Ok(Self { repo })
    }

    /// The git directory shared by every worktree of the repository.
    ///
    /// For a linked worktree this is the main repository's `.git`, which is
    /// where git looks for hooks and where the configuration lives.
    pub fn common_dir(&self) -> &Path {
        self.repo.commondir()
    }
}

impl RepoSnapshotProvider for Git2Client {
    fn staged_files(&self) -> Result<Vec<String>> {
        let index = self.repo.index()?;
        let mut options = DiffOptions::new();

        // On an unborn branch there is no HEAD tree; diffing against no tree
        // compares the index with the empty tree.
        let head_tree = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(_) => None,
        };
        let diff =
            self.repo
                .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut options))?;

        let mut staged_files = Vec::new();
        for delta in diff.deltas() {
            if delta.status() == Delta::Deleted {
                continue;
            }
            staged_files.push(delta_path(&delta)?);
        }
        Ok(staged_files)
    }

    fn unstaged_files(&self) -> Result<Vec<String>> {
        let index = self.repo.index()?;
        let mut options = DiffOptions::new();
        options.include_untracked(false);

        let diff = self
            .repo
            .diff_index_to_workdir(Some(&index), Some(&mut options))?;

        diff.deltas().map(|delta| delta_path(&delta)).collect()
    }

    fn workdir(&self) -> PathBuf {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }

    fn stage_files(&self, paths: &[String]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            index
                .add_path(Path::new(path))
                .with_context(|| format!("Failed to stage {path}"))?;
        }
        index.write()?;
        Ok(())
    }
}

fn delta_path(delta: &DiffDelta<'_>) -> Result<String> {
    let bytes = delta
        .new_file()
        .path_bytes()
        .or_else(|| delta.old_file().path_bytes())
        .ok_or_else(|| anyhow!("git reported a change without a path"))?;
    Ok(decode_path(bytes))
}

/// Turns raw path bytes from the index into a string.
///
/// Bytes that are not valid UTF-8 are kept visible as `\xNN` escapes, so the
/// path rules still see (and reject) them.
pub fn decode_path(bytes: &[u8]) -> String {
    match str::from_utf8(bytes) {
        Ok(path) => path.to_string(),
        Err(_) => bytes.escape_ascii().to_string(),
    }
}
