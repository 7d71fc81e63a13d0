//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be built, sent or its body read/inflated
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bad credentials, missing session cookie, or a 401/403 from the API
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The API answered with an unexpected status code
    #[error("{operation} failed: HTTP {status}, response was {body:?}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Building a request body (CSV, multipart form) failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Mandatory settings absent from both the settings file and the flags
    #[error("Configuration error: missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),

    /// A deletion job could not be followed to a terminal status
    #[error("Job polling gave up: {0}")]
    PollExhausted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
