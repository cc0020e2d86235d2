use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use crate::core::problem::Problem;
use crate::utils::plural;

/// Operator chaining the fix commands: each runs only if the previous one succeeded.
pub const FIX_SEPARATOR: &str = " && ";

/// The outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Any problem at all fails the commit, fixable or not.
    pub fn from_problems(problems: &[Problem]) -> Self {
        if problems.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

/// Joins the fix commands of all fixable problems into one copyable line.
///
/// Returns `None` when nothing is fixable.
pub fn remediation_line(problems: &[Problem]) -> Option<String> {
    let commands: Vec<&str> = problems.iter().filter_map(Problem::fix_command).collect();
    if commands.is_empty() {
        None
    } else {
        Some(commands.join(FIX_SEPARATOR))
    }
}

pub trait ProblemReporter {
    /// Writes the report for `problems` and returns the verdict.
    fn report(&self, problems: &[Problem], out: &mut dyn Write) -> Result<Verdict>;
}

/// Human-readable report, meant for stderr.
///
/// ```text
/// ERROR for bad path.txt: whitespace character in file path
/// ERROR for fmt.py: would be reformatted
///
/// Found 2 issues.
/// Fix 1 of 2 issues with:
///     black fmt.py
/// ```
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl ProblemReporter for ConsoleReporter {
    fn report(&self, problems: &[Problem], out: &mut dyn Write) -> Result<Verdict> {
        let verdict = Verdict::from_problems(problems);
        if verdict == Verdict::Pass {
            return Ok(verdict);
        }

        for problem in problems {
            writeln!(
                out,
                "{} for {}: {}",
                self.paint("ERROR", |s| s.red().bold()),
                self.paint(problem.path(), |s| s.blue()),
                problem.message()
            )?;
        }

        let total = problems.len();
        writeln!(out)?;
        writeln!(out, "Found {}.", plural(total, "issue"))?;

        if let Some(line) = remediation_line(problems) {
            let fixable = problems.iter().filter(|p| p.is_fixable()).count();
            let summary = format!("Fix {fixable} of {}", plural(total, "issue"));
            let summary = if fixable == total {
                self.paint(&summary, |s| s.green())
            } else {
                self.paint(&summary, |s| s.blue())
            };
            writeln!(out, "{summary} with:")?;
            writeln!(out, "    {line}")?;
        }

        Ok(verdict)
    }
}

#[derive(Serialize)]
struct JsonProblem<'a> {
    path: &'a str,
    message: &'a str,
    fixable: bool,
    fix_command: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    problems: Vec<JsonProblem<'a>>,
    count: usize,
    fixable: usize,
    remediation: Option<String>,
}

/// Machine-readable report, one JSON document.
pub struct JsonReporter;

impl ProblemReporter for JsonReporter {
    fn report(&self, problems: &[Problem], out: &mut dyn Write) -> Result<Verdict> {
        let report = JsonReport {
            problems: problems
                .iter()
                .map(|p| JsonProblem {
                    path: p.path(),
                    message: p.message(),
                    fixable: p.is_fixable(),
                    fix_command: p.fix_command(),
                })
                .collect(),
            count: problems.len(),
            fixable: problems.iter().filter(|p| p.is_fixable()).count(),
            remediation: remediation_line(problems),
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        Ok(Verdict::from_problems(problems))
    }
}
