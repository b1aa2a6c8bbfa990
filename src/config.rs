//! IMAP connection configuration

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 1143;
const DEFAULT_CA_CERT: &str = "config/tls/cert.pem";

/// How the transport is secured before LOGIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (the server's secure port).
    Implicit,
    /// Plaintext dial, then STARTTLS upgrades the stream in place.
    StartTls,
}

/// Connection parameters for the remote mail store
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Port on which the server expects STARTTLS instead of implicit TLS.
    pub starttls_port: u16,
    /// PEM trust anchor. `None` (or an unreadable file) falls back to
    /// accepting any server certificate.
    pub ca_cert: Option<PathBuf>,
}

impl ImapConfig {
    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `IMAP_HOST` (default: `127.0.0.1`)
    /// - `IMAP_PORT` (default: `1143`)
    /// - `IMAP_STARTTLS_PORT` (default: `1143`)
    /// - `IMAP_CA_CERT` (default: `config/tls/cert.pem`, empty disables)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a
    /// port is not a valid number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_port(&lookup, "IMAP_PORT", DEFAULT_PORT)?;
        let starttls_port = parse_port(&lookup, "IMAP_STARTTLS_PORT", DEFAULT_PORT)?;

        let ca_cert = match lookup("IMAP_CA_CERT") {
            Some(path) if path.is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CA_CERT)),
        };

        Ok(Self {
            host: lookup("IMAP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: lookup("IMAP_USERNAME")
                .ok_or_else(|| Error::Config("IMAP_USERNAME not set".into()))?,
            password: lookup("IMAP_PASSWORD")
                .ok_or_else(|| Error::Config("IMAP_PASSWORD not set".into()))?,
            starttls_port,
            ca_cert,
        })
    }

    /// The transport security policy, selected by the configured port.
    #[must_use]
    pub const fn tls_mode(&self) -> TlsMode {
        if self.port == self.starttls_port {
            TlsMode::StartTls
        } else {
            TlsMode::Implicit
        }
    }

    /// `host:port` for dialing.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port<F>(lookup: &F, key: &str, default: u16) -> Result<u16>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| Error::Config(format!("Invalid {key}: {e}")))
    })
}
