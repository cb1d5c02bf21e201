use super::credential::{ClientSecret, Credential};
use crate::error::{authorization_error, ManagerResult};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Fallback lifetime when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Successful response of the OAuth2 token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space separated, present when the server narrows the grant
    #[serde(default)]
    scope: Option<String>,
}

/// Talks to the OAuth2 token endpoint
#[derive(Clone)]
pub struct TokenManager {
    client: Client,
}

impl TokenManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Exchange an authorization code from the consent redirect for a credential
    pub async fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ManagerResult<Credential> {
        let params = [
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let token = self.request_token(&secret.token_uri, &params).await?;
        info!("Authorization code exchanged for a new token");

        Ok(Credential {
            token: Some(token.access_token),
            refresh_token: token.refresh_token,
            token_uri: secret.token_uri.clone(),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            scopes: granted_scopes(token.scope.as_deref(), scopes),
            expiry: Some(expiry_from(token.expires_in)?),
        })
    }

    /// Refresh an expired credential
    pub async fn refresh(&self, credential: &Credential) -> ManagerResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| authorization_error("No refresh token in credential"))?;

        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let token = self.request_token(&credential.token_uri, &params).await?;
        info!("Access token refreshed");

        Ok(Credential {
            token: Some(token.access_token),
            // Google usually keeps the original refresh token
            refresh_token: token.refresh_token.or_else(|| credential.refresh_token.clone()),
            token_uri: credential.token_uri.clone(),
            client_id: credential.client_id.clone(),
            client_secret: credential.client_secret.clone(),
            scopes: granted_scopes(token.scope.as_deref(), &credential.scopes),
            expiry: Some(expiry_from(token.expires_in)?),
        })
    }

    async fn request_token(&self, token_uri: &str, params: &[(&str, &str)]) -> ManagerResult<TokenResponse> {
        debug!("Requesting token from {}", token_uri);

        let response = self
            .client
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| authorization_error(&format!("Failed to reach token endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(authorization_error(&format!(
                "Token request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| authorization_error(&format!("Failed to parse token response: {}", e)))
    }
}

fn expiry_from(expires_in: Option<i64>) -> ManagerResult<DateTime<Utc>> {
    let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
    TimeDelta::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| authorization_error(&format!("Invalid expires_in in token response: {}", expires_in)))
}

fn granted_scopes(granted: Option<&str>, requested: &[String]) -> Vec<String> {
    match granted {
        Some(scope) if !scope.trim().is_empty() => scope.split_whitespace().map(str::to_string).collect(),
        _ => requested.to_vec(),
    }
}
