//! Path-level hygiene rules.
//!
//! Every rule looks at the path string alone (plus the frozen [`RepoInfo`]).
//! Rules are independent: all of them run for every path and each violated
//! rule contributes its own [`Problem`].

use unicode_general_category::{GeneralCategory, get_general_category};

use crate::core::git::RepoInfo;
use crate::core::problem::Problem;

pub const DUAL_STATE: &str = "file has both staged and unstaged changes";
pub const NON_PRINTABLE: &str = "non-printable character in file path";
pub const WHITESPACE: &str = "whitespace character in file path";
pub const HYPHEN: &str = "hyphen in file path";
pub const BACKSLASH: &str = "backslash in file path";

/// A single path rule: returns the message to report when the path violates it.
pub type PathRule = fn(&str, &RepoInfo) -> Option<&'static str>;

/// The ordered set of path rules.
#[derive(Clone)]
pub struct PathRuleSet {
    rules: Vec<PathRule>,
}

impl Default for PathRuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl PathRuleSet {
    /// All built-in rules, in reporting order.
    pub fn standard() -> Self {
        let rules: Vec<PathRule> = vec![dual_state, non_printable, whitespace, hyphen, backslash];
        Self { rules }
    }

    /// Runs every rule against `path`. Never short-circuits.
    pub fn check(&self, path: &str, info: &RepoInfo) -> Vec<Problem> {
        self.rules
            .iter()
            .filter_map(|rule| rule(path, info))
            .map(|message| Problem::manual(path, message))
            .collect()
    }
}

pub fn dual_state(path: &str, info: &RepoInfo) -> Option<&'static str> {
    info.is_unstaged(path).then_some(DUAL_STATE)
}

pub fn non_printable(path: &str, _info: &RepoInfo) -> Option<&'static str> {
    path.chars().any(|c| !is_printable(c)).then_some(NON_PRINTABLE)
}

pub fn whitespace(path: &str, _info: &RepoInfo) -> Option<&'static str> {
    path.chars().any(char::is_whitespace).then_some(WHITESPACE)
}

pub fn hyphen(path: &str, _info: &RepoInfo) -> Option<&'static str> {
    path.contains('-').then_some(HYPHEN)
}

pub fn backslash(path: &str, _info: &RepoInfo) -> Option<&'static str> {
    path.contains('\\').then_some(BACKSLASH)
}

/// A character renders visibly on a terminal.
///
/// Everything in the "Other" categories (control, format, surrogate,
/// private-use, unassigned) and every separator except the plain ASCII space
/// is non-printable.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RepoInfo {
        RepoInfo::new(["dirty.txt"], "/repo")
    }

    fn messages(path: &str) -> Vec<String> {
        PathRuleSet::standard()
            .check(path, &info())
            .into_iter()
            .map(|p| p.message().to_string())
            .collect()
    }

    #[test]
    fn clean_path_has_no_problems() {
        assert!(messages("src/core/engine.rs").is_empty());
        assert!(messages("README").is_empty());
        assert!(messages("docs/café_notes.md").is_empty());
    }

    #[test]
    fn dual_state_detected() {
        assert_eq!(messages("dirty.txt"), vec![DUAL_STATE]);
    }

    #[test]
    fn hyphen_detected() {
        assert_eq!(messages("my-file.txt"), vec![HYPHEN]);
        assert_eq!(messages("-rf"), vec![HYPHEN]);
    }

    #[test]
    fn backslash_detected() {
        assert_eq!(messages("dir\\file.txt"), vec![BACKSLASH]);
    }

    #[test]
    fn space_is_whitespace_but_printable() {
        assert_eq!(messages("bad path.txt"), vec![WHITESPACE]);
    }

    #[test]
    fn tab_is_both_non_printable_and_whitespace() {
        assert_eq!(messages("a\tb.txt"), vec![NON_PRINTABLE, WHITESPACE]);
    }

    #[test]
    fn zero_width_space_is_non_printable() {
        assert_eq!(messages("a\u{200B}b.txt"), vec![NON_PRINTABLE]);
    }

    #[test]
    fn rules_are_not_short_circuited() {
        let path = "dirty-\\ x";
        let got = PathRuleSet::standard().check(path, &RepoInfo::new([path], "/"));
        let got: Vec<&str> = got.iter().map(|p| p.message()).collect();
        assert_eq!(got, vec![DUAL_STATE, WHITESPACE, HYPHEN, BACKSLASH]);
    }

    #[test]
    fn path_problems_are_never_fixable() {
        let problems = PathRuleSet::standard().check("a-b c\\d", &info());
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().all(|p| !p.is_fixable()));
        assert!(problems.iter().all(|p| p.path() == "a-b c\\d"));
    }

    #[test]
    fn printable_classification() {
        assert!(is_printable('a'));
        assert!(is_printable(' '));
        assert!(is_printable('é'));
        assert!(!is_printable('\n'));
        assert!(!is_printable('\u{7f}'));
        assert!(!is_printable('\u{00A0}'));
        assert!(!is_printable('\u{FEFF}'));
    }

    #[test]
    fn every_other_and_separator_category_is_non_printable() {
        for c in [
            '\u{0007}',  // control
            '\u{0600}',  // format: Arabic number sign
            '\u{110BD}', // format: Kaithi number sign
            '\u{E000}',  // private use
            '\u{0378}',  // unassigned
            '\u{3000}',  // space separator
            '\u{2028}',  // line separator
            '\u{2029}',  // paragraph separator
        ] {
            assert!(!is_printable(c), "{:?}", c);
            let path = format!("a{c}b.txt");
            assert!(messages(&path).contains(&NON_PRINTABLE.to_string()), "{path:?}");
        }
    }

    #[test]
    fn letters_marks_and_symbols_are_printable() {
        for c in ['Z', 'ß', 'ж', '中', '\u{0301}', '€', '½', '_', '(', '🙂'] {
            assert!(is_printable(c), "{:?}", c);
        }
    }
}
