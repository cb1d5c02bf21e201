use super::client::CalendarClient;
use super::credential::{ClientSecret, Credential};
use super::flow::{Authorizer, LocalServerFlow};
use super::token::TokenManager;
use crate::config::Config;
use crate::error::{Error, ManagerResult};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

/// Acquires a credential and hands out a calendar client bound to it.
///
/// Construction does no I/O. All file and network work happens in
/// [`initialize`](Self::initialize):
///
/// 1. load the session file if it exists,
/// 2. keep it if it is valid,
/// 3. otherwise refresh it when it is merely expired and has a refresh token,
/// 4. otherwise run the interactive flow with the client secret,
/// 5. write the new credential back to the session file.
pub struct SessionManager {
    config: Config,
    authorizer: Arc<dyn Authorizer>,
}

impl SessionManager {
    /// Create a manager that uses the browser based flow when a login is needed
    pub fn new(config: Config) -> Self {
        Self::with_authorizer(config, Arc::new(LocalServerFlow::new()))
    }

    pub fn with_authorizer(config: Config, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { config, authorizer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Obtain a valid credential and construct the calendar client
    pub async fn initialize(&self) -> ManagerResult<CalendarClient> {
        let client = Client::builder().build().map_err(Error::Construction)?;
        let tokens = TokenManager::new(client.clone());

        let credential = self.acquire_credential(&tokens).await?;
        CalendarClient::new(client, credential, &self.config.api_base_url)
    }

    async fn acquire_credential(&self, tokens: &TokenManager) -> ManagerResult<Credential> {
        let session_path = &self.config.session_token_path;

        let cached = match Credential::from_file(session_path) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", session_path.display(), e);
                None
            }
        };

        if let Some(credential) = &cached {
            if credential.is_valid() {
                info!("Using cached session from {}", session_path.display());
                return Ok(credential.clone());
            }
        }

        let credential = match cached {
            Some(credential) if credential.can_refresh() => {
                info!("Cached session expired, refreshing");
                tokens.refresh(&credential).await?
            }
            _ => {
                info!("No usable session, starting interactive authorization");
                let secret = ClientSecret::from_file(&self.config.secret_file_path)?;
                self.authorizer
                    .authorize(tokens, &secret, &self.config.scopes)
                    .await?
            }
        };

        // Save the credential for the next run
        credential.save(session_path)?;
        info!("Session saved to {}", session_path.display());

        Ok(credential)
    }
}
