use anyhow::{Context, Result};
use log::debug;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::core::config::Config;
use crate::core::content::ContentScanner;
use crate::core::git::{RepoInfo, RepoSnapshot};
use crate::core::problem::Problem;
use crate::core::registry::FiletypeRuleRegistry;
use crate::core::rules::PathRuleSet;

/// Runs every check over every staged path and collects the problems.
pub struct CheckEngine {
    rules: PathRuleSet,
    content: Option<ContentScanner>,
    registry: FiletypeRuleRegistry,
    jobs: usize,
}

impl CheckEngine {
    pub fn new(rules: PathRuleSet, registry: FiletypeRuleRegistry) -> Self {
        Self {
            rules,
            content: None,
            registry,
            jobs: 0,
        }
    }

    /// Builds the standard engine: all path rules, the configured content
    /// markers and one formatter check per configured extension.
    pub fn from_config(config: &Config, info: &RepoInfo) -> Result<Self> {
        let scanner = ContentScanner::new(&config.content.markers)?;
        let registry = FiletypeRuleRegistry::from_config(config, &info.workdir);

        Ok(Self::new(PathRuleSet::standard(), registry)
            .with_content(scanner)
            .with_jobs(config.settings.jobs))
    }

    pub fn with_content(mut self, scanner: ContentScanner) -> Self {
        self.content = (!scanner.is_empty()).then_some(scanner);
        self
    }

    /// Number of worker threads; `0` uses rayon's default, `1` runs sequentially.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Problems for a single path: path rules, then content markers, then the filetype check.
    pub fn check_path(&self, path: &str, info: &RepoInfo) -> Result<Vec<Problem>> {
        let mut problems = self.rules.check(path, info);

        if let Some(scanner) = &self.content {
            problems.extend(scanner.check(path, info)?);
        }

        problems.extend(self.registry.check(path, info)?);
        Ok(problems)
    }

    /// Problems for every staged path, in staged-list order.
    ///
    /// Paths are checked in parallel, but the indexed collect keeps the
    /// result in input order. The first fatal error aborts the run.
    pub fn check_all(&self, staged: &[String], info: &RepoInfo) -> Result<Vec<Problem>> {
        if self.jobs == 1 {
            let mut problems = Vec::new();
            for path in staged {
                problems.extend(self.check_path(path, info)?);
            }
            return Ok(problems);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .context("Failed to start worker threads")?;
        debug!(
            "checking {} staged paths on {} threads",
            staged.len(),
            pool.current_num_threads()
        );

        let per_path: Vec<Vec<Problem>> = pool.install(|| {
            staged
                .par_iter()
                .map(|path| self.check_path(path, info))
                .collect::<Result<Vec<Vec<Problem>>>>()
        })?;

        Ok(per_path.into_iter().flatten().collect())
    }

    /// Checks a captured snapshot.
    pub fn check_snapshot(&self, snapshot: &RepoSnapshot) -> Result<Vec<Problem>> {
        self.check_all(&snapshot.staged, &snapshot.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::{FormatStatus, Formatter};
    use crate::core::registry::{FormatCheck, WOULD_REFORMAT};
    use crate::core::rules::{DUAL_STATE, HYPHEN, WHITESPACE};
    use anyhow::bail;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Reports "would reformat" for the listed paths; fails to run for `broken`.
    struct FakeFormatter {
        unformatted: HashSet<String>,
        broken: Option<String>,
    }

    impl FakeFormatter {
        fn new(unformatted: &[&str]) -> Self {
            Self {
                unformatted: unformatted.iter().map(|s| s.to_string()).collect(),
                broken: None,
            }
        }
    }

    impl Formatter for FakeFormatter {
        fn check(&self, path: &str) -> Result<FormatStatus> {
            if self.broken.as_deref() == Some(path) {
                bail!("formatter crashed on {path}");
            }
            // Finish out of order so parallel completion order differs from input order.
            if path.starts_with('b') {
                std::thread::sleep(Duration::from_millis(20));
            }
            if self.unformatted.contains(path) {
                Ok(FormatStatus::WouldReformat)
            } else {
                Ok(FormatStatus::Formatted)
            }
        }

        fn fix_command(&self, path: &str) -> Result<String> {
            Ok(format!("black {path}"))
        }
    }

    fn engine(formatter: FakeFormatter) -> CheckEngine {
        let mut registry = FiletypeRuleRegistry::new();
        registry.register("py", FormatCheck::new(formatter));
        CheckEngine::new(PathRuleSet::standard(), registry)
    }

    fn staged(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    /// A working tree holding `files` (empty), with `unstaged` marked dirty.
    fn worktree(files: &[&str], unstaged: &[&str]) -> (tempfile::TempDir, RepoInfo) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, "").unwrap();
        }
        let info = RepoInfo::new(unstaged.iter().copied(), dir.path());
        (dir, info)
    }

    #[test]
    fn clean_paths_have_no_problems() {
        let files = ["src/lib.py", "README", "docs/guide.md"];
        let (_dir, info) = worktree(&files, &[]);
        let problems = engine(FakeFormatter::new(&[]))
            .check_all(&staged(&files), &info)
            .unwrap();
        assert!(problems.is_empty());
    }

    #[test]
    fn dual_state_path_yields_one_problem() {
        let (_dir, info) = worktree(&["notes.txt"], &["notes.txt"]);
        let problems = engine(FakeFormatter::new(&[]))
            .check_all(&staged(&["notes.txt"]), &info)
            .unwrap();
        assert_eq!(problems, vec![Problem::manual("notes.txt", DUAL_STATE)]);
    }

    #[test]
    fn dual_state_survives_file_deleted_after_staging() {
        let mut formatter = FakeFormatter::new(&[]);
        formatter.broken = Some("a.py".to_string());
        let (_dir, info) = worktree(&[], &["a.py"]);

        let problems = engine(formatter)
            .check_all(&staged(&["a.py"]), &info)
            .unwrap();
        assert_eq!(problems, vec![Problem::manual("a.py", DUAL_STATE)]);
    }

    #[test]
    fn hyphen_is_reported_regardless_of_formatting() {
        let (_dir, info) = worktree(&["my-file.py"], &[]);
        let problems = engine(FakeFormatter::new(&["my-file.py"]))
            .check_path("my-file.py", &info)
            .unwrap();
        assert_eq!(
            problems,
            vec![
                Problem::manual("my-file.py", HYPHEN),
                Problem::fixable("my-file.py", WOULD_REFORMAT, "black my-file.py"),
            ]
        );
    }

    #[test]
    fn formatting_problem_is_fixable() {
        let (_dir, info) = worktree(&["a.py"], &[]);
        let problems = engine(FakeFormatter::new(&["a.py"]))
            .check_all(&staged(&["a.py"]), &info)
            .unwrap();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].is_fixable());
        assert_eq!(problems[0].fix_command(), Some("black a.py"));
    }

    #[test]
    fn input_order_is_preserved() {
        let (_dir, info) = worktree(&["b.py", "a.py"], &[]);
        let problems = engine(FakeFormatter::new(&["b.py", "a.py"]))
            .with_jobs(4)
            .check_all(&staged(&["b.py", "a.py"]), &info)
            .unwrap();
        let paths: Vec<&str> = problems.iter().map(|p| p.path()).collect();
        assert_eq!(paths, vec!["b.py", "a.py"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let files = ["b.py", "x-y.txt", "c d.py", "ok.txt"];
        let (_dir, info) = worktree(&files, &["ok.txt"]);
        let engine = engine(FakeFormatter::new(&["b.py", "c d.py"]));

        let first = engine.check_all(&staged(&files), &info).unwrap();
        let second = engine.check_all(&staged(&files), &info).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let files = ["b1.py", "a-1.py", "b 2.py", "z.py"];
        let (_dir, info) = worktree(&files, &["z.py"]);
        let unformatted = ["b1.py", "b 2.py", "z.py"];

        let sequential = engine(FakeFormatter::new(&unformatted))
            .with_jobs(1)
            .check_all(&staged(&files), &info)
            .unwrap();
        let parallel = engine(FakeFormatter::new(&unformatted))
            .with_jobs(8)
            .check_all(&staged(&files), &info)
            .unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 6);
    }

    #[test]
    fn end_to_end_scenario() {
        let files = ["ok.txt", "bad path.txt", "fmt.py"];
        let (_dir, info) = worktree(&files, &[]);
        let problems = engine(FakeFormatter::new(&["fmt.py"]))
            .check_all(&staged(&files), &info)
            .unwrap();
        assert_eq!(
            problems,
            vec![
                Problem::manual("bad path.txt", WHITESPACE),
                Problem::fixable("fmt.py", WOULD_REFORMAT, "black fmt.py"),
            ]
        );
    }

    #[test]
    fn formatter_failure_aborts_the_run() {
        let files = ["a.py", "x.py", "y-z.txt"];
        let (_dir, info) = worktree(&files, &[]);
        let mut formatter = FakeFormatter::new(&[]);
        formatter.broken = Some("x.py".to_string());
        let err = engine(formatter)
            .check_all(&staged(&files), &info)
            .unwrap_err();
        assert!(err.to_string().contains("formatter crashed on x.py"));
    }

    #[test]
    fn content_markers_come_after_path_rules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-b.txt"), "TODO: remove\n").unwrap();
        let info = RepoInfo::new(Vec::<String>::new(), dir.path());

        let engine = engine(FakeFormatter::new(&[]))
            .with_content(ContentScanner::new(["todo: remove"]).unwrap());
        let problems = engine.check_all(&staged(&["a-b.txt"]), &info).unwrap();
        let messages: Vec<&str> = problems.iter().map(|p| p.message()).collect();
        assert_eq!(messages, vec![HYPHEN, "file contains todo: remove"]);
    }
}
