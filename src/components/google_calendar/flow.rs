use super::credential::{ClientSecret, Credential};
use super::token::TokenManager;
use crate::error::{authorization_error, credential_error, other_error, ManagerResult};
use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

/// Obtains a fresh credential from the user when no cached session can be used
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        tokens: &TokenManager,
        secret: &ClientSecret,
        scopes: &[String],
    ) -> ManagerResult<Credential>;
}

/// Installed-application flow: consent page in the browser, redirect to a local listener
#[derive(Debug, Clone)]
pub struct LocalServerFlow {
    host: String,
    port: u16,
    open_browser: bool,
    state: Option<String>,
}

impl Default for LocalServerFlow {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            open_browser: true,
            state: None,
        }
    }
}

impl LocalServerFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on a fixed port instead of an ephemeral one
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Only log the consent URL instead of launching a browser
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Use a fixed `state` value instead of a random one per login
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

#[async_trait]
impl Authorizer for LocalServerFlow {
    async fn authorize(
        &self,
        tokens: &TokenManager,
        secret: &ClientSecret,
        scopes: &[String],
    ) -> ManagerResult<Credential> {
        let server = tiny_http::Server::http((self.host.as_str(), self.port))
            .map_err(|e| authorization_error(&format!("Failed to start callback listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| authorization_error("Callback listener has no IP address"))?;

        // Must name the address the listener is bound to
        let redirect_uri = format!("http://{}:{}/", self.host, port);
        let state = self
            .state
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let auth_url = authorization_url(secret, &redirect_uri, scopes, &state)?;

        info!("Please visit this URL to authorize this application: {}", auth_url);
        if self.open_browser {
            if let Err(e) = webbrowser::open(auth_url.as_str()) {
                warn!("Could not open a browser: {}", e);
            }
        }

        // Blocks until the browser comes back to us
        let request = tokio::task::spawn_blocking(move || -> std::io::Result<tiny_http::Request> {
            loop {
                let request = server.recv()?;
                if is_callback(request.url()) {
                    return Ok(request);
                }
                let _ = request.respond(tiny_http::Response::empty(404));
            }
        })
        .await
        .map_err(|e| other_error(&format!("Callback listener task failed: {}", e)))??;

        let code = match parse_callback(request.url(), &state) {
            Ok(code) => {
                let response = tiny_http::Response::from_string(
                    "The authentication flow has completed. You may close this window.",
                );
                let _ = request.respond(response);
                code
            }
            Err(e) => {
                let response = tiny_http::Response::from_string(format!("Authorization failed: {}", e))
                    .with_status_code(400);
                let _ = request.respond(response);
                return Err(e);
            }
        };

        tokens.exchange_code(secret, &code, &redirect_uri, scopes).await
    }
}

/// Build the consent page URL
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> ManagerResult<Url> {
    let mut url = Url::parse(&secret.auth_uri)
        .map_err(|e| credential_error(&format!("Invalid auth_uri '{}': {}", secret.auth_uri, e)))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secret.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");

    Ok(url)
}

fn callback_url(request_url: &str) -> Option<Url> {
    Url::parse("http://localhost").ok()?.join(request_url).ok()
}

fn is_callback(request_url: &str) -> bool {
    callback_url(request_url)
        .map(|url| url.query_pairs().any(|(key, _)| key == "code" || key == "error"))
        .unwrap_or(false)
}

/// Extract the authorization code from the redirect request target
pub fn parse_callback(request_url: &str, expected_state: &str) -> ManagerResult<String> {
    let url = callback_url(request_url)
        .ok_or_else(|| authorization_error(&format!("Malformed callback URL: {}", request_url)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(authorization_error(&format!("Authorization was denied: {}", error)));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(authorization_error("State mismatch in authorization callback"));
    }

    code.ok_or_else(|| authorization_error("No authorization code found in callback"))
}
