use crate::error::{config_error, ManagerResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the OAuth client secret descriptor
pub const DEFAULT_SECRET_FILE: &str = "keys/google_calendar.json";
/// Default location of the cached session
pub const DEFAULT_SESSION_TOKEN: &str = "token.json";
/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_FILE: &str = "config/gcal.toml";
/// View and edit events on all calendars
pub const CALENDAR_EVENTS_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";
/// Google Calendar v3 REST root
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Configuration for a calendar session
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Client secret descriptor, only read when no usable session exists
    pub secret_file_path: PathBuf,
    /// Cached session file, created or overwritten after every login or refresh
    pub session_token_path: PathBuf,
    /// Scopes requested during the interactive flow
    pub scopes: Vec<String>,
    /// Base URL of the Calendar REST API
    pub api_base_url: String,
}

/// Settings accepted from the TOML file. Scopes cannot be set here.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    secret_file_path: Option<PathBuf>,
    session_token_path: Option<PathBuf>,
    api_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_FILE, DEFAULT_SESSION_TOKEN)
    }
}

impl Config {
    /// Create a configuration for the given secret and session paths
    pub fn new(secret_file_path: impl Into<PathBuf>, session_token_path: impl Into<PathBuf>) -> Self {
        Self {
            secret_file_path: secret_file_path.into(),
            session_token_path: session_token_path.into(),
            scopes: vec![CALENDAR_EVENTS_SCOPE.to_string()],
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Replace the requested scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Point the client at a different API root
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Load configuration from `.env`, the config file and the environment
    pub fn load() -> ManagerResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = match fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(_) => Self::default(),
        };

        if let Ok(path) = env::var("GCAL_SECRET_FILE") {
            config.secret_file_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("GCAL_SESSION_TOKEN") {
            config.session_token_path = PathBuf::from(path);
        }
        if let Ok(url) = env::var("GCAL_API_BASE_URL") {
            config.api_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration, filling unspecified values with defaults
    pub fn from_toml_str(content: &str) -> ManagerResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(path) = file.secret_file_path {
            config.secret_file_path = path;
        }
        if let Some(path) = file.session_token_path {
            config.session_token_path = path;
        }
        if let Some(url) = file.api_base_url {
            config.api_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that can never produce a working session
    pub fn validate(&self) -> ManagerResult<()> {
        if is_empty_path(&self.secret_file_path) {
            return Err(config_error("secret_file_path must not be empty"));
        }
        if is_empty_path(&self.session_token_path) {
            return Err(config_error("session_token_path must not be empty"));
        }
        if self.scopes.is_empty() {
            return Err(config_error("at least one scope is required"));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| config_error(&format!("Invalid api_base_url '{}': {}", self.api_base_url, e)))?;
        Ok(())
    }
}

fn is_empty_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
