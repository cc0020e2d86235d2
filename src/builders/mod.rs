// This file is the module declaration file for the `builders` module.
// These modules sit around the detection engine in `core`: they turn its
// output into something a user (or the commit hook) can act on.

// `fixer` module:
// Runs the fix command of every fixable problem and stages the fixed files
// again. This is what the `fix` command does.
pub mod fixer;

// `hooks` module:
// Installs the `pre-commit` hook script in `.git/hooks`, backing up any
// hook that was already there.
pub mod hooks;

// `reporter` module:
// Renders the problem list (console or JSON), builds the single chained
// remediation command, and turns the problem list into a `Verdict`.
pub mod reporter;

// `validator` module:
// Checks the configuration file for entries that could never match or that
// would misread a formatter's exit status.
pub mod validator;
