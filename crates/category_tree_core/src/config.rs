//! Runtime configuration for hosts embedding the category tree core.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `log_dir`, when set, must be an absolute path.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const SUPPORTED_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];

/// Host-provided settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizerConfig {
    /// SQLite file; `None` opens an in-memory database.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_level_string")]
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_level_string(),
            log_dir: None,
        }
    }
}

impl OrganizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.log_level.trim().to_ascii_lowercase();
        if !SUPPORTED_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        if let Some(dir) = &self.log_dir {
            if !Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidLogLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{dir}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Parses and validates a JSON config document.
pub fn parse_config(json: &str) -> Result<OrganizerConfig, ConfigError> {
    let config: OrganizerConfig = serde_json::from_str(json).map_err(ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a JSON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<OrganizerConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{parse_config, ConfigError, OrganizerConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, OrganizerConfig::default());
    }

    #[test]
    fn rejects_unknown_fields_and_bad_levels() {
        assert!(matches!(
            parse_config(r#"{"colour": "blue"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            parse_config(r#"{"log_level": "loud"}"#),
            Err(ConfigError::InvalidLogLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn rejects_relative_log_dir() {
        assert!(matches!(
            parse_config(r#"{"log_dir": "logs/dev"}"#),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
