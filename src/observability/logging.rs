//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_FILTER_ENV: &str = "PHISCRUB_LOG";
/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "PHISCRUB_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "phiscrub=debug,warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Filter precedence: `PHISCRUB_LOG`, then the config file, then
    /// `verbose`, then `warn`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_sources(
            settings,
            verbose,
            std::env::var(LOG_FILTER_ENV).ok(),
            std::env::var(LOG_FORMAT_ENV).ok(),
        )
    }

    fn from_sources(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env_filter: Option<String>,
        env_format: Option<String>,
    ) -> Self {
        let filter = env_filter
            .filter(|f| !f.trim().is_empty())
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| {
                if verbose {
                    VERBOSE_FILTER.to_string()
                } else {
                    DEFAULT_FILTER.to_string()
                }
            });
        let format = env_format
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map(|f| LogFormat::parse(&f))
            .unwrap_or_default();
        let file = settings.and_then(|s| s.file.clone());

        Self {
            filter,
            format,
            file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_sources(None, false, None, None);
        assert_eq!(config.filter, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_verbose() {
        let config = LoggingConfig::from_sources(None, true, None, None);
        assert_eq!(config.filter, VERBOSE_FILTER);
    }

    #[test]
    fn test_precedence() {
        let settings = LoggingSettings {
            filter: Some("phiscrub=info".to_string()),
            format: Some("json".to_string()),
            file: Some(PathBuf::from("/tmp/phiscrub.log")),
        };

        let config = LoggingConfig::from_sources(Some(&settings), true, None, None);
        assert_eq!(config.filter, "phiscrub=info");
        assert_eq!(config.format, LogFormat::Json);

        let config = LoggingConfig::from_sources(
            Some(&settings),
            true,
            Some("trace".to_string()),
            Some("pretty".to_string()),
        );
        assert_eq!(config.filter, "trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/phiscrub.log")));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Pretty);
    }
}
