//! Error types for mailapi

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Dial, TLS handshake, or transport failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A command failed server-side, or the session is not authenticated.
    #[error("IMAP error: {0}")]
    Protocol(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single MIME part could not be decoded. Recovered locally by the
    /// decoder; never escapes a fetch.
    #[error("Email parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status an HTTP boundary should answer with for this error.
    ///
    /// None of these are retriable from the caller's point of view.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Connection(_) | Self::Protocol(_) => 502,
            Self::Auth(_) => 401,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Parse(_) => 422,
            Self::Config(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
