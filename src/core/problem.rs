use std::fmt;

/// A single hygiene violation found in a staged file.
///
/// The fields are private so that a `Problem` can only be built through
/// [`Problem::manual`] or [`Problem::fixable`]. A problem is fixable exactly
/// when it carries a fix command; there is no way to build one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    path: String,
    message: String,
    fix_command: Option<String>,
}

impl Problem {
    /// A problem that needs a human decision (rename the file, split the change, ...).
    pub fn manual(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            fix_command: None,
        }
    }

    /// A problem with a mechanical remedy.
    ///
    /// A blank `fix_command` cannot fix anything, so the problem degrades to a
    /// manual one instead.
    pub fn fixable(
        path: impl Into<String>,
        message: impl Into<String>,
        fix_command: impl Into<String>,
    ) -> Self {
        let fix_command = fix_command.into();
        let fix_command = if fix_command.trim().is_empty() {
            None
        } else {
            Some(fix_command)
        };
        Self {
            path: path.into(),
            message: message.into(),
            fix_command,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_fixable(&self) -> bool {
        self.fix_command.is_some()
    }

    pub fn fix_command(&self) -> Option<&str> {
        self.fix_command.as_deref()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
