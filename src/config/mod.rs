//! Configuration management.
//!
//! A config file is optional. When present it is TOML:
//!
//! ```toml
//! audit = true
//!
//! [policy]
//! redact_dates = true
//!
//! [[policy.custom_patterns]]
//! pattern = 'MRN-\d{6}'
//! tag = "[REDACTED-MRN]"
//!
//! [logging]
//! filter = "phiscrub=debug"
//! format = "json"
//! file = "/var/log/phiscrub.log"
//! ```

use crate::redaction::{PolicyOverrides, RedactionPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for phiscrub.
#[derive(Debug, Clone, Default)]
pub struct PhiscrubConfig {
    /// Policy overrides applied before any command-line overrides.
    pub policy: PolicyOverrides,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Emit an audit record for every redacting call.
    pub audit: bool,
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `phiscrub=debug`.
    pub filter: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Policy section.
    pub policy: Option<PolicyOverrides>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
    /// Audit flag.
    pub audit: Option<bool>,
}

impl PhiscrubConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has unknown keys.
    pub fn parse(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
        Self::parse(&contents)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/phiscrub/` on macOS)
    /// 2. XDG config dir (`~/.config/phiscrub/`)
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        Self::default_paths()
            .into_iter()
            .filter(|path| path.exists())
            .find_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                    None
                },
            })
            .unwrap_or_default()
    }

    /// Candidate config file locations, most specific first.
    #[must_use]
    pub fn default_paths() -> Vec<PathBuf> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Vec::new();
        };
        let platform = base_dirs.config_dir().join("phiscrub").join("config.toml");
        let xdg = base_dirs
            .home_dir()
            .join(".config")
            .join("phiscrub")
            .join("config.toml");
        if platform == xdg {
            vec![platform]
        } else {
            vec![platform, xdg]
        }
    }

    /// Resolves the configured policy.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured custom pattern does not compile.
    pub fn resolve_policy(&self) -> crate::Result<RedactionPolicy> {
        Ok(RedactionPolicy::resolve(&self.policy)?)
    }

    /// Layers `overrides` on top of the configured policy.
    #[must_use]
    pub fn with_policy_overrides(mut self, overrides: PolicyOverrides) -> Self {
        self.policy = self.policy.merge(overrides);
        self
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(policy) = file.policy {
            config.policy = policy;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(audit) = file.audit {
            config.audit = audit;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = PhiscrubConfig::parse(
            r#"
            audit = true

            [policy]
            redact_dates = true
            redact_phone = false

            [[policy.custom_patterns]]
            pattern = 'MRN-\d{6}'
            tag = "[REDACTED-MRN]"

            [logging]
            filter = "phiscrub=debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert!(config.audit);
        assert_eq!(config.policy.redact_dates, Some(true));
        assert_eq!(config.logging.format.as_deref(), Some("json"));

        let policy = config.resolve_policy().unwrap();
        assert!(policy.redact_dates);
        assert!(!policy.redact_phone);
        assert!(policy.redact_email);
        assert_eq!(policy.custom_patterns.len(), 1);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = PhiscrubConfig::parse("").unwrap();
        assert!(!config.audit);
        assert_eq!(config.policy, PolicyOverrides::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = PhiscrubConfig::parse("[policy]\nredact_everything = true\n").unwrap_err();
        assert!(err.to_string().contains("parse_config_file"));
    }

    #[test]
    fn test_invalid_pattern_surfaces_on_resolve() {
        let config = PhiscrubConfig::parse(
            r#"
            [[policy.custom_patterns]]
            pattern = '(oops'
            tag = "[X]"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.resolve_policy(),
            Err(crate::Error::Pattern(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[policy]\nredact_address = true").unwrap();

        let config = PhiscrubConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.policy.redact_address, Some(true));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PhiscrubConfig::load_from_file(Path::new("/nonexistent/phiscrub.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("read_config_file"));
    }

    #[test]
    fn test_cli_overrides_layer_on_config() {
        let config = PhiscrubConfig::parse("[policy]\nredact_dates = true\nredact_ssn = false\n")
            .unwrap()
            .with_policy_overrides(PolicyOverrides::new().with_ssn(true));

        let policy = config.resolve_policy().unwrap();
        assert!(policy.redact_dates);
        assert!(policy.redact_ssn);
    }
}
