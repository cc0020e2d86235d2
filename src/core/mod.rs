// This file is the module declaration file for the `core` module.
// It declares the submodules that make up the detection engine: everything
// needed to go from "a list of staged paths" to "an ordered list of problems".

// `config` module:
// The TOML configuration kept in `.git/commit-hygiene.toml` (formatters per
// extension, content markers, worker threads) and the `ConfigManager` that
// loads and saves it.
pub mod config;

// `content` module:
// Scans the working tree copy of a staged file for forbidden markers.
pub mod content;

// `engine` module:
// The `CheckEngine` aggregates path rules, content markers and filetype checks
// over the whole staged list, in parallel, while keeping the input order.
pub mod engine;

// `formatter` module:
// The `Formatter` trait and the `ExternalFormatter` that shells out to tools
// such as `black --check`.
pub mod formatter;

// `git` module:
// The `RepoSnapshotProvider` trait, its git2-backed implementation, and the
// frozen `RepoInfo`/`RepoSnapshot` captured once per run.
pub mod git;

pub mod problem;
pub mod registry;
pub mod rules;
