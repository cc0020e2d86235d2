use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

use crate::core::config::Config;
use crate::core::formatter::{ExternalFormatter, FormatStatus, Formatter};
use crate::core::git::RepoInfo;
use crate::core::problem::Problem;

pub const WOULD_REFORMAT: &str = "would be reformatted";

/// Trait for the extra checks attached to a file type.
///
/// Each implementation inspects one staged path and returns zero or more problems.
/// Errors mean the check itself could not run.
pub trait FiletypeCheck: Send + Sync {
    fn check(&self, path: &str, info: &RepoInfo) -> Result<Vec<Problem>>;
}

/// Formatting check: the file must already be in the formatter's canonical form.
///
/// Paths without a regular file in the working tree are skipped; there is
/// nothing to format, and the path rules still report them.
pub struct FormatCheck {
    formatter: Box<dyn Formatter>,
}

impl FormatCheck {
    pub fn new(formatter: impl Formatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
        }
    }
}

impl FiletypeCheck for FormatCheck {
    fn check(&self, path: &str, info: &RepoInfo) -> Result<Vec<Problem>> {
        if !info.is_regular_file(path) {
            debug!("{path}: no file in the working tree, not formatting");
            return Ok(Vec::new());
        }
        match self.formatter.check(path)? {
            FormatStatus::Formatted => Ok(Vec::new()),
            FormatStatus::WouldReformat => {
                let fix_command = self.formatter.fix_command(path)?;
                Ok(vec![Problem::fixable(path, WOULD_REFORMAT, fix_command)])
            }
        }
    }
}

/// Registry of filetype checks, keyed by file extension (without the dot).
#[derive(Default)]
pub struct FiletypeRuleRegistry {
    checks: HashMap<String, Box<dyn FiletypeCheck>>,
}

impl FiletypeRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration: one formatting check per `[formatters.<ext>]`.
    pub fn from_config(config: &Config, workdir: &Path) -> Self {
        let mut registry = Self::new();
        for (extension, formatter) in &config.formatters {
            registry.register(
                extension.clone(),
                FormatCheck::new(ExternalFormatter::from_config(formatter, workdir)),
            );
        }
        registry
    }

    /// Registers `check` for `extension`, replacing any earlier entry.
    pub fn register(&mut self, extension: impl Into<String>, check: impl FiletypeCheck + 'static) {
        self.checks.insert(extension.into(), Box::new(check));
    }

    pub fn get(&self, extension: &str) -> Option<&dyn FiletypeCheck> {
        self.checks.get(extension).map(|b| b.as_ref())
    }

    /// Runs the check registered for the extension of `path`, if any.
    pub fn check(&self, path: &str, info: &RepoInfo) -> Result<Vec<Problem>> {
        let extension = extension_of(path);
        match self.get(extension) {
            Some(check) => {
                debug!("{path}: running .{extension} check");
                check.check(path, info)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// The text after the final `.` of the last path segment, or `""` when there is none.
pub fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => "",
    }
}
