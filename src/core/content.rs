use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::fs;

use crate::core::git::RepoInfo;
use crate::core::problem::Problem;

/// Default marker. Split so this file does not trip its own check.
pub const DO_NOT_SUBMIT: &str = concat!("DO NOT ", "SUBMIT");

/// Scans staged file contents for forbidden markers such as `DO NOT SUBMIT`.
#[derive(Debug, Clone)]
pub struct ContentScanner {
    markers: Vec<(String, Regex)>,
}

impl ContentScanner {
    /// Compiles one case-insensitive literal matcher per marker. Blank markers are skipped.
    pub fn new<I, S>(markers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for marker in markers {
            let marker = marker.as_ref().trim();
            if marker.is_empty() {
                continue;
            }
            let regex = RegexBuilder::new(&regex::escape(marker))
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Invalid content marker {marker:?}"))?;
            compiled.push((marker.to_string(), regex));
        }
        Ok(Self { markers: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// One problem per marker found in `contents`.
    pub fn scan(&self, path: &str, contents: &str) -> Vec<Problem> {
        self.markers
            .iter()
            .filter(|(_, regex)| regex.is_match(contents))
            .map(|(marker, _)| Problem::manual(path, format!("file contains {marker}")))
            .collect()
    }

    /// Reads the working tree copy of `path` and scans it.
    ///
    /// Anything that is not a regular file (submodule, directory symlink, vanished file)
    /// has no contents to scan.
    pub fn check(&self, path: &str, info: &RepoInfo) -> Result<Vec<Problem>> {
        if self.markers.is_empty() {
            return Ok(Vec::new());
        }
        if !info.is_regular_file(path) {
            return Ok(Vec::new());
        }
        let full_path = info.resolve(path);
        let bytes = fs::read(&full_path)
            .with_context(|| format!("Failed to read {}", full_path.display()))?;
        Ok(self.scan(path, &String::from_utf8_lossy(&bytes)))
    }
}
