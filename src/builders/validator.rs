use crate::core::config::{CONFIG_VERSION, Config, FormatterConfig};

/// The `ConfigValidator` trait defines the public interface for validating the
/// configuration before it is used.
pub trait ConfigValidator {
    /// Performs a full validation of the `Config` and returns a list of issues found.
    ///
    /// # Arguments
    /// * `config`: The `Config` to be validated.
    ///
    /// # Returns
    /// A vector of strings, one per issue. Empty when the config is usable.
    fn validate_config(&self, config: &Config) -> Vec<String>;

    /// Validates a single formatter entry.
    ///
    /// # Arguments
    /// * `extension`: The key of the `[formatters.<extension>]` table.
    /// * `formatter`: The formatter configured for it.
    fn validate_formatter(&self, extension: &str, formatter: &FormatterConfig) -> Vec<String>;
}

/// The `StandardValidator` catches the mistakes that would make a run silently
/// skip files or misread a formatter's exit status.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &Config) -> Vec<String> {
        let mut issues = Vec::new();

        // Check for an unsupported configuration version.
        if config.version != CONFIG_VERSION {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        if config.content.markers.iter().any(|m| m.trim().is_empty()) {
            issues.push("Empty content marker".to_string());
        }

        for (extension, formatter) in &config.formatters {
            issues.extend(self.validate_formatter(extension, formatter));
        }

        issues
    }

    fn validate_formatter(&self, extension: &str, formatter: &FormatterConfig) -> Vec<String> {
        let mut issues = Vec::new();

        // Keys are matched against the text after the last dot, so a key with
        // a dot or a slash can never match anything.
        if extension.is_empty() {
            issues.push("Formatter registered for an empty extension".to_string());
        } else if extension.contains(['.', '/']) {
            issues.push(format!(
                "Formatter extension {extension:?} must not contain '.' or '/'"
            ));
        }

        if formatter.command.trim().is_empty() {
            issues.push(format!("Formatter for .{extension} has no command"));
        }

        if formatter.reformat_exit_codes.is_empty() {
            issues.push(format!(
                "Formatter for .{extension} has no reformat exit codes; every unformatted file would abort the run"
            ));
        }
        if formatter.reformat_exit_codes.contains(&0) {
            issues.push(format!(
                "Formatter for .{extension} lists exit code 0 as \"would reformat\""
            ));
        }

        issues
    }
}
