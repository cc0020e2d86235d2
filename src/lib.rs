//! commit-hygiene: a pre-commit gate.
//!
//! Before a commit goes through, every staged path is checked against a fixed
//! set of hygiene rules (characters in the path, files with both staged and
//! unstaged edits, forbidden content markers, formatting of known file types).
//! Any problem blocks the commit; formatting problems come with a fix command.
//!
//! - [`core`]: snapshot of the repository, rules, formatter checks, the engine.
//! - [`builders`]: reporting, fixing, hook installation, config validation.
//! - [`utils`]: the command handlers behind the CLI.

pub mod builders;
pub mod core;
pub mod utils;
