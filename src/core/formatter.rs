use anyhow::{Context, Result, bail};
use log::debug;
use std::borrow::Cow;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::config::FormatterConfig;

/// What a formatter said about a file in check-only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStatus {
    Formatted,
    WouldReformat,
}

/// The narrow interface the filetype checks need from a code formatter.
///
/// A formatter that could not be run at all returns `Err`; that is a fatal
/// error for the whole run, not a problem with the file.
pub trait Formatter: Send + Sync {
    /// Asks the formatter, without modifying anything, whether `path` is formatted.
    fn check(&self, path: &str) -> Result<FormatStatus>;

    /// The shell command that reformats `path` in place.
    fn fix_command(&self, path: &str) -> Result<String>;
}

/// A formatter executed as a child process, e.g. `black --check <path>`.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    command: String,
    check_args: Vec<String>,
    fix_args: Vec<String>,
    reformat_exit_codes: Vec<i32>,
    workdir: PathBuf,
}

impl ExternalFormatter {
    pub fn new(command: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            check_args: Vec::new(),
            fix_args: Vec::new(),
            reformat_exit_codes: vec![1],
            workdir: workdir.into(),
        }
    }

    pub fn from_config(config: &FormatterConfig, workdir: impl Into<PathBuf>) -> Self {
        Self {
            command: config.command.clone(),
            check_args: config.check_args.clone(),
            fix_args: config.fix_args.clone(),
            reformat_exit_codes: config.reformat_exit_codes.clone(),
            workdir: workdir.into(),
        }
    }

    pub fn with_check_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fix_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// The path as it is handed to the formatter.
///
/// Staged paths are relative to the working tree, so a leading `-` would be
/// parsed as an option. Prefixing `./` names the same file.
pub fn path_argument(path: &str) -> Cow<'_, str> {
    if path.starts_with('-') {
        Cow::Owned(format!("./{path}"))
    } else {
        Cow::Borrowed(path)
    }
}

impl Formatter for ExternalFormatter {
    fn check(&self, path: &str) -> Result<FormatStatus> {
        let output = Command::new(&self.command)
            .args(&self.check_args)
            .arg(&*path_argument(path))
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run formatter `{}`", self.command))?;

        debug!(
            "{} {} {} -> {:?}",
            self.command,
            self.check_args.join(" "),
            path,
            output.status.code()
        );

        match output.status.code() {
            Some(0) => Ok(FormatStatus::Formatted),
            Some(code) if self.reformat_exit_codes.contains(&code) => {
                Ok(FormatStatus::WouldReformat)
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let exit = match code {
                    Some(code) => format!("exit code {code}"),
                    None => "termination by signal".to_string(),
                };
                bail!(
                    "Formatter `{}` failed on {} ({}): {}",
                    self.command,
                    path,
                    exit,
                    stderr.trim()
                )
            }
        }
    }

    fn fix_command(&self, path: &str) -> Result<String> {
        let target = path_argument(path);
        let words = std::iter::once(self.command.as_str())
            .chain(self.fix_args.iter().map(String::as_str))
            .chain(std::iter::once(&*target));

        let mut quoted: Vec<Cow<'_, str>> = Vec::new();
        for word in words {
            quoted.push(
                shlex::try_quote(word)
                    .with_context(|| format!("Cannot quote {word:?} for the shell"))?,
            );
        }
        Ok(quoted.join(" "))
    }
}
