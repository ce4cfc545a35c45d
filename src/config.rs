//! Configuration via `~/.config/botmon/config.toml`
//!
//! Every key is optional. Command-line flags override file values.
//!
//! ```toml
//! base_url = "http://localhost:1314"
//! poll_interval_ms = 2000
//! request_timeout_ms = 10000
//! capacity = 2000
//! # full_load_limit = 500
//! # level = "error"
//! pin_threshold_rows = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use botmon_logs::SessionConfig;
use botmon_types::{LogLevel, UnknownLevel};
use serde::Deserialize;
use thiserror::Error;

/// Service address used when neither the file nor the command line names one
pub const DEFAULT_BASE_URL: &str = "http://localhost:1314";

/// Rows from the bottom that still count as following
pub const DEFAULT_PIN_THRESHOLD_ROWS: usize = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Level(#[from] UnknownLevel),

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub capacity: Option<usize>,
    pub full_load_limit: Option<usize>,
    pub level: Option<String>,
    pub pin_threshold_rows: Option<usize>,
}

impl FileConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default location when `path` is None.
    ///
    /// An explicitly named file must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }
}

/// `~/.config/botmon/config.toml`
pub fn default_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("botmon").join("config.toml"))
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub capacity: Option<usize>,
    pub full_load_limit: Option<usize>,
    pub level: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub session: SessionConfig,
    pub level: Option<LogLevel>,
    pub pin_threshold_rows: usize,
}

impl Settings {
    pub fn resolve(file: FileConfig, cli: Overrides) -> Result<Self, ConfigError> {
        let defaults = SessionConfig::default();

        let poll_interval_ms = cli.poll_interval_ms.or(file.poll_interval_ms);
        let request_timeout_ms = cli.request_timeout_ms.or(file.request_timeout_ms);
        let capacity = cli.capacity.or(file.capacity).unwrap_or(defaults.capacity);

        if poll_interval_ms == Some(0) {
            return Err(ConfigError::Zero {
                key: "poll_interval_ms",
            });
        }
        if request_timeout_ms == Some(0) {
            return Err(ConfigError::Zero {
                key: "request_timeout_ms",
            });
        }
        if capacity == 0 {
            return Err(ConfigError::Zero { key: "capacity" });
        }

        let session = SessionConfig {
            capacity,
            poll_interval: poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            request_timeout: request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            full_load_limit: cli.full_load_limit.or(file.full_load_limit),
        };

        let level = match cli.level.or(file.level) {
            Some(raw) => parse_level_filter(&raw)?,
            None => None,
        };

        Ok(Self {
            base_url: cli
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session,
            level,
            pin_threshold_rows: file
                .pin_threshold_rows
                .unwrap_or(DEFAULT_PIN_THRESHOLD_ROWS),
        })
    }
}

/// `all` (or empty) means no level filter
pub fn parse_level_filter(raw: &str) -> Result<Option<LogLevel>, UnknownLevel> {
    match raw.trim() {
        "" => Ok(None),
        s if s.eq_ignore_ascii_case("all") => Ok(None),
        s => s.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<FileConfig, ConfigError> {
        FileConfig::parse(content, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::resolve(parse("").unwrap(), Overrides::default()).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.session, SessionConfig::default());
        assert_eq!(settings.session.poll_interval, Duration::from_millis(2000));
        assert_eq!(settings.session.capacity, 2000);
        assert_eq!(settings.session.full_load_limit, None);
        assert_eq!(settings.level, None);
        assert_eq!(settings.pin_threshold_rows, 1);
    }

    #[test]
    fn test_file_values() {
        let file = parse(
            r#"
            base_url = "http://agent.internal:1314"
            poll_interval_ms = 500
            request_timeout_ms = 3000
            capacity = 10000
            full_load_limit = 250
            level = "WARN"
            pin_threshold_rows = 3
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(file, Overrides::default()).unwrap();
        assert_eq!(settings.base_url, "http://agent.internal:1314");
        assert_eq!(settings.session.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.session.request_timeout, Duration::from_secs(3));
        assert_eq!(settings.session.capacity, 10000);
        assert_eq!(settings.session.full_load_limit, Some(250));
        assert_eq!(settings.level, Some(LogLevel::Warn));
        assert_eq!(settings.pin_threshold_rows, 3);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse("capacity = 100\nlevel = \"error\"").unwrap();
        let cli = Overrides {
            capacity: Some(50),
            level: Some("all".into()),
            base_url: Some("http://other:9000".into()),
            ..Default::default()
        };

        let settings = Settings::resolve(file, cli).unwrap();
        assert_eq!(settings.session.capacity, 50);
        assert_eq!(settings.level, None);
        assert_eq!(settings.base_url, "http://other:9000");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            parse("poll_interval = 5"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::resolve(parse("poll_interval_ms = 0").unwrap(), Overrides::default());
        assert!(matches!(err, Err(ConfigError::Zero { key: "poll_interval_ms" })));

        let err = Settings::resolve(parse("level = \"loud\"").unwrap(), Overrides::default());
        assert!(matches!(err, Err(ConfigError::Level(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = FileConfig::load(Some(Path::new("/nonexistent/botmon/config.toml")));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }
}
