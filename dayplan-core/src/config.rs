//! Client configuration.
//!
//! One [`ClientConfig`] is built at startup and handed to every store, so
//! the event and goal stores always talk to the same backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::error::{DayplanError, DayplanResult};

static DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
static DEFAULT_ERROR_TIMEOUT: &str = "5s";
static DEFAULT_REQUEST_TIMEOUT: &str = "30s";

/// Environment variable prefix, e.g. `DAYPLAN_API_BASE_URL`.
const ENV_PREFIX: &str = "DAYPLAN";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_error_timeout() -> String {
    DEFAULT_ERROR_TIMEOUT.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

/// Config as written in `~/.config/dayplan/config.toml`.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_api_base_url")]
    api_base_url: String,

    /// How long an error notice stays visible, humantime syntax.
    #[serde(default = "default_error_timeout")]
    error_timeout: String,

    #[serde(default = "default_request_timeout")]
    request_timeout: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub error_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for `api_base_url` with default timeouts.
    pub fn new(api_base_url: &str) -> DayplanResult<Self> {
        Ok(ClientConfig {
            api_base_url: parse_base_url(api_base_url)?,
            error_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn config_path() -> DayplanResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DayplanError::Config("Could not determine config directory".into()))?
            .join("dayplan");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the user config file, creating a commented default on first
    /// run, then apply `DAYPLAN_*` environment overrides.
    pub fn load() -> DayplanResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> DayplanResult<Self> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| DayplanError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DayplanError::Config(e.to_string()))?;

        Ok(ClientConfig {
            api_base_url: parse_base_url(&raw.api_base_url)?,
            error_timeout: parse_duration("error_timeout", &raw.error_timeout)?,
            request_timeout: parse_duration("request_timeout", &raw.request_timeout)?,
        })
    }

    /// Replace the API base URL, e.g. from a command-line flag.
    pub fn with_api_base_url(mut self, api_base_url: &str) -> DayplanResult<Self> {
        self.api_base_url = parse_base_url(api_base_url)?;
        Ok(self)
    }

    /// Absolute URL for an API path given as segments, e.g.
    /// `["api", "events", id]`. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> DayplanResult<Url> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DayplanError::Config(format!("Invalid API base URL: {}", self.api_base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DayplanResult<()> {
        let contents = format!(
            "\
# dayplan configuration

# Backend the calendar talks to:
# api_base_url = \"{}\"

# How long error messages stay visible:
# error_timeout = \"{}\"

# Give up on a request after:
# request_timeout = \"{}\"
",
            DEFAULT_API_BASE_URL, DEFAULT_ERROR_TIMEOUT, DEFAULT_REQUEST_TIMEOUT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DayplanError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DayplanError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn parse_base_url(input: &str) -> DayplanResult<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| DayplanError::Config(format!("Invalid API base URL '{input}': {e}")))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(DayplanError::Config(format!(
            "API base URL must be an http(s) URL, got '{input}'"
        )));
    }

    Ok(url)
}

fn parse_duration(field: &str, input: &str) -> DayplanResult<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| DayplanError::Config(format!("Invalid {field} '{input}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        let url = config.endpoint(&["api", "events", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/events/abc");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let config = ClientConfig::new("https://example.com/calendar/").unwrap();
        let url = config.endpoint(&["api", "events", "goals"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/calendar/api/events/goals");
    }

    #[test]
    fn endpoint_encodes_ids() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        let url = config.endpoint(&["api", "events", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/events/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("mailto:someone@example.com").is_err());
        assert!(ClientConfig::new("ftp://example.com").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"http://calendar.local:8080\"\nerror_timeout = \"10s\"\n",
        )
        .unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://calendar.local:8080/");
        assert_eq!(config.error_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn default_config_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        ClientConfig::create_default_config(&path).unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.error_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_duration_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "error_timeout = \"soon\"\n").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, DayplanError::Config(_)));
    }
}
