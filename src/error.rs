use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the calendar session
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(gcal_manager::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(gcal_manager::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(gcal_manager::serialization))]
    Serialization(String),

    #[error("Credential error: {0}")]
    #[diagnostic(
        code(gcal_manager::credential),
        help("Check the client secret file, or delete the session file to log in again")
    )]
    Credential(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(code(gcal_manager::authorization))]
    Authorization(String),

    #[error("Failed to construct calendar client: {0}")]
    #[diagnostic(code(gcal_manager::construction))]
    Construction(#[source] reqwest::Error),

    #[error("HTTP transport error: {0}")]
    #[diagnostic(code(gcal_manager::http))]
    Http(#[from] reqwest::Error),

    #[error("Google Calendar API error: HTTP {status} - {body}")]
    #[diagnostic(code(gcal_manager::api))]
    Api { status: u16, body: String },

    #[error("Invalid input: {0}")]
    #[diagnostic(code(gcal_manager::invalid_input))]
    InvalidInput(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(gcal_manager::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type ManagerResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create credential errors
pub fn credential_error(message: &str) -> Error {
    Error::Credential(message.to_string())
}

/// Helper to create authorization errors
pub fn authorization_error(message: &str) -> Error {
    Error::Authorization(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
