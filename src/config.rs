//! Configuration layering: defaults, then `~/.budget/config.toml`, then the
//! environment (a `.env` file is honoured), then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Parser)]
#[command(name = "budget-tracker", about = "Monthly budget and expenses in the terminal")]
pub struct Args {
    /// Base URL of the action endpoint
    #[arg(long, env = "BUDGET_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "BUDGET_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Config file (defaults to ~/.budget/config.toml)
    #[arg(long, env = "BUDGET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the logged-in session is kept
    #[arg(long, env = "BUDGET_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "BUDGET_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Route to open first, e.g. /app/expenses
    #[arg(long, default_value = "/")]
    pub start: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api: Option<ApiSection>,
    pub display: Option<DisplayConfig>,
    pub session_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub thousands_separator: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            thousands_separator: ".".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no API URL configured: set BUDGET_API_URL, --api-url or [api] base_url")]
    MissingApiUrl,

    #[error("invalid API URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// Resolved settings the application runs with.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout: Duration,
    pub display: DisplayConfig,
    pub session_path: PathBuf,
    pub log_level: String,
    pub start: String,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let file = match args.config.clone().or_else(config_path) {
            Some(path) if path.exists() => FileConfig::read(&path)?,
            _ => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self, ConfigError> {
        let api = file.api.unwrap_or_default();

        let api_base_url = args
            .api_url
            .clone()
            .or(api.base_url)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        validate_url(&api_base_url)?;

        let timeout_secs = args
            .timeout_secs
            .or(api.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let session_path = args
            .session_file
            .clone()
            .or(file.session_file)
            .or_else(|| config_dir().map(|dir| dir.join("session.json")))
            .unwrap_or_else(|| PathBuf::from(".budget").join("session.json"));

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            display: file.display.unwrap_or_default(),
            session_path,
            log_level: args
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            start: args.start.clone(),
        })
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidApiUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidApiUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".budget"))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_url: Option<&str>) -> Args {
        Args {
            api_url: api_url.map(str::to_string),
            timeout_secs: None,
            config: None,
            session_file: None,
            log_level: None,
            start: "/".to_string(),
        }
    }

    #[test]
    fn flags_win_over_file() {
        let file: FileConfig = toml::from_str(
            r#"
            log_level = "debug"
            [api]
            base_url = "https://file.example/exec"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        let config = Config::resolve(&args(Some("https://flag.example/exec")), file).unwrap();
        assert_eq!(config.api_base_url, "https://flag.example/exec");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn file_supplies_display_settings() {
        let file: FileConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://file.example/exec"
            [display]
            currency_symbol = "ARS "
            "#,
        )
        .unwrap();
        let config = Config::resolve(&args(None), file).unwrap();
        assert_eq!(config.display.currency_symbol, "ARS ");
        assert_eq!(config.display.thousands_separator, ".");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = Config::resolve(&args(None), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiUrl));
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = Config::resolve(&args(Some("ftp://x.example")), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl { .. }));
    }

    #[test]
    fn bad_toml_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = 1").unwrap();
        let err = FileConfig::read(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
