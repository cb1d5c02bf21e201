use crate::error::{credential_error, ManagerResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Google's OAuth2 token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Google's OAuth2 consent endpoint
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
/// Tokens this close to expiry are treated as already expired
pub const REFRESH_THRESHOLD_SECS: i64 = 225;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

/// OAuth2 token material in Google's "authorized user" file layout
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Credential {
    /// Read a cached session. A missing file is not an error.
    pub fn from_file(path: &Path) -> ManagerResult<Option<Self>> {
        if !path.exists() {
            debug!("No session file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let credential = serde_json::from_str(&content)?;
        Ok(Some(credential))
    }

    /// Write the session, replacing whatever was there before
    pub fn save(&self, path: &Path) -> ManagerResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Session written to {}", path.display());

        Ok(())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether the token is at or past its expiry, minus the refresh threshold.
    /// An expiry too far in the past to subtract from counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry
                .checked_sub_signed(Duration::seconds(REFRESH_THRESHOLD_SECS))
                .map_or(true, |threshold| now >= threshold),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A credential is valid when it carries an access token that has not expired
    pub fn is_valid(&self) -> bool {
        self.token.is_some() && !self.is_expired()
    }

    /// Refresh is only possible for an expired token that has a refresh token
    pub fn can_refresh(&self) -> bool {
        self.is_expired() && self.refresh_token.is_some()
    }
}

/// Application identity from the client secret descriptor
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The console wraps the secret in either an "installed" or a "web" object
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_file(path: &Path) -> ManagerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            credential_error(&format!(
                "Failed to read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ManagerResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| credential_error(&format!("Malformed client secret: {}", e)))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| credential_error("Client secret has neither 'installed' nor 'web' section"))
    }
}
