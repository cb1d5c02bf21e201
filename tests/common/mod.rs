#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gcal_manager::components::google_calendar::{
    Authorizer, CalendarClient, ClientSecret, Credential, SessionManager, TokenManager,
};
use gcal_manager::config::{Config, CALENDAR_EVENTS_SCOPE};
use gcal_manager::error::{other_error, ManagerResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::MockServer;

/// Fake interactive flow that hands out a fixed credential and counts how often it ran
pub struct CountingAuthorizer {
    calls: AtomicUsize,
    credential: Option<Credential>,
}

impl CountingAuthorizer {
    pub fn returning(credential: Credential) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            credential: Some(credential),
        })
    }

    /// An authorizer for tests where the interactive flow must not run
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            credential: None,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for CountingAuthorizer {
    async fn authorize(
        &self,
        _tokens: &TokenManager,
        _secret: &ClientSecret,
        _scopes: &[String],
    ) -> ManagerResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credential
            .clone()
            .ok_or_else(|| other_error("interactive flow was not expected"))
    }
}

pub fn credential(token: &str, expires_in_minutes: i64, token_uri: &str) -> Credential {
    Credential {
        token: Some(token.to_string()),
        refresh_token: Some("refresh-123".to_string()),
        token_uri: token_uri.to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: vec![CALENDAR_EVENTS_SCOPE.to_string()],
        expiry: Some(Utc::now() + Duration::minutes(expires_in_minutes)),
    }
}

pub fn token_uri(server: &MockServer) -> String {
    format!("{}/token", server.uri())
}

pub fn write_secret(dir: &Path, token_uri: &str) -> PathBuf {
    let path = dir.join("keys").join("google_calendar.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let secret = serde_json::json!({
        "installed": {
            "client_id": "client-id",
            "client_secret": "client-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost"]
        }
    });
    std::fs::write(&path, secret.to_string()).unwrap();
    path
}

pub fn config_for(dir: &Path, server: &MockServer) -> Config {
    Config::new(dir.join("keys").join("google_calendar.json"), dir.join("token.json"))
        .with_api_base_url(server.uri())
}

pub fn read_session(config: &Config) -> Credential {
    Credential::from_file(&config.session_token_path)
        .unwrap()
        .expect("session file should exist")
}

/// Calendar client backed by a valid cached session pointing at `server`
pub async fn client_for(server: &MockServer, dir: &Path) -> CalendarClient {
    let config = config_for(dir, server);
    credential("cached-token", 60, &token_uri(server))
        .save(&config.session_token_path)
        .unwrap();

    SessionManager::with_authorizer(config, CountingAuthorizer::refusing())
        .initialize()
        .await
        .unwrap()
}
