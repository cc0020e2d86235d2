use anyhow::{Context, Result};
use git2::Repository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::content::DO_NOT_SUBMIT;

pub const CONFIG_VERSION: &str = "1.0";
const CONFIG_FILE: &str = "commit-hygiene.toml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Worker threads for the per-file checks. `0` lets rayon decide.
    #[serde(default)]
    pub jobs: usize,
    /// Colorize the console report when stderr is a terminal.
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs: 0,
            color: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContentSettings {
    /// Case-insensitive literal markers that may not appear in a staged file.
    #[serde(default)]
    pub markers: Vec<String>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            markers: vec![DO_NOT_SUBMIT.to_string()],
        }
    }
}

/// How to run one external formatter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    pub command: String,
    /// Arguments for check-only mode; the path is appended.
    #[serde(default)]
    pub check_args: Vec<String>,
    /// Arguments for fixing in place; the path is appended.
    #[serde(default)]
    pub fix_args: Vec<String>,
    /// Exit codes of check mode that mean "would reformat". Any other
    /// non-zero code is an execution error.
    #[serde(default = "default_reformat_exit_codes")]
    pub reformat_exit_codes: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub content: ContentSettings,
    /// Formatters keyed by file extension, without the leading dot.
    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut formatters = BTreeMap::new();
        formatters.insert(
            "py".to_string(),
            FormatterConfig {
                command: "black".to_string(),
                check_args: vec!["--check".to_string(), "--quiet".to_string()],
                fix_args: vec!["--quiet".to_string()],
                reformat_exit_codes: default_reformat_exit_codes(),
            },
        );

        Self {
            version: CONFIG_VERSION.to_string(),
            settings: Settings::default(),
            content: ContentSettings::default(),
            formatters,
        }
    }
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_reformat_exit_codes() -> Vec<i32> {
    vec![1]
}

pub struct ConfigManager {
    config_path: PathBuf,
    git_dir: PathBuf,
}

impl ConfigManager {
    /// Locates the repository containing the current directory.
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let repo = Repository::discover(&current_dir)
            .with_context(|| format!("Not in a Git repository: {}", current_dir.display()))?;
        Ok(Self::in_git_dir(repo.commondir()))
    }

    /// Keeps the configuration in `git_dir`, the repository's common git directory.
    pub fn in_git_dir(git_dir: impl Into<PathBuf>) -> Self {
        let git_dir = git_dir.into();
        Self {
            config_path: git_dir.join(CONFIG_FILE),
            git_dir,
        }
    }

    /// Writes the default configuration unless a config file already exists.
    /// Returns whether a file was written.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        self.save_config(&Config::default())?;
        Ok(true)
    }

    pub fn get_git_dir(&self) -> &Path {
        &self.git_dir
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<Config>;
    fn save_config(&self, config: &Config) -> Result<()>;
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_git_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str(r#"version = "1.0""#).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.content.markers, vec![DO_NOT_SUBMIT.to_string()]);
        assert!(config.formatters.is_empty());
    }

    #[test]
    fn empty_file_is_the_default_without_formatters() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.formatters.is_empty());
    }

    #[test]
    fn formatter_table_parses() {
        let config: Config = toml::from_str(
            r#"
            version = "1.0"
            [settings]
            jobs = 4

            [content]
            markers = []

            [formatters.rs]
            command = "rustfmt"
            check_args = ["--check"]
        "#,
        )
        .unwrap();
        assert_eq!(config.settings.jobs, 4);
        assert!(config.settings.color);
        assert!(config.content.markers.is_empty());
        let rs = &config.formatters["rs"];
        assert_eq!(rs.command, "rustfmt");
        assert_eq!(rs.check_args, vec!["--check"]);
        assert!(rs.fix_args.is_empty());
        assert_eq!(rs.reformat_exit_codes, vec![1]);
    }

    #[test]
    fn initialize_writes_once() {
        let git_dir = fake_git_dir();
        let manager = ConfigManager::in_git_dir(git_dir.path());
        assert!(manager.initialize().unwrap());
        assert!(!manager.initialize().unwrap());

        let path = manager.get_config_path().unwrap();
        assert_eq!(path, git_dir.path().join(CONFIG_FILE));
        assert_eq!(manager.load_config().unwrap(), Config::default());
    }

    #[test]
    fn load_without_file_gives_defaults() {
        let git_dir = fake_git_dir();
        let manager = ConfigManager::in_git_dir(git_dir.path());
        assert_eq!(manager.load_config().unwrap(), Config::default());
    }

    #[test]
    fn broken_file_is_an_error() {
        let git_dir = fake_git_dir();
        let manager = ConfigManager::in_git_dir(git_dir.path());
        fs::write(manager.get_config_path().unwrap(), "version = [").unwrap();
        assert!(manager.load_config().is_err());
    }
}
