//! Dial, TLS and LOGIN.
//!
//! `connect()` and `select()` run under `MailSession`'s lock. The
//! configured port picks the transport: STARTTLS when it equals the
//! STARTTLS port, implicit TLS otherwise.

use crate::config::{ImapConfig, TlsMode};
use crate::error::{Error, Result};
use async_imap::Session;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// A TLS-wrapped IMAP session.
pub type ImapSession = Session<Compat<TlsStream<TcpStream>>>;

/// Build the TLS connector for a session.
///
/// Verifies against the configured trust anchor when one can be
/// loaded; otherwise accepts any certificate.
fn tls_connector(ca_cert: Option<&Path>) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Connection(format!("TLS setup failed: {e}")))?;

    let config = match ca_cert.and_then(load_trust_anchor) {
        Some(roots) => builder
            .with_root_certificates(roots)
            .with_no_client_auth(),
        None => {
            warn!("No usable trust anchor, TLS certificate verification disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerification))
                .with_no_client_auth()
        }
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Read a PEM bundle into a root store. `None` if the file is missing
/// or holds no usable certificate.
fn load_trust_anchor(path: &Path) -> Option<RootCertStore> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open trust anchor {}: {}", path.display(), e);
            return None;
        }
    };

    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader).filter_map(std::result::Result::ok);
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    debug!(
        "Loaded {} trust anchor(s) from {} ({} ignored)",
        added,
        path.display(),
        ignored
    );

    (added > 0).then_some(roots)
}

/// Open a fresh TLS-wrapped, authenticated IMAP session.
///
/// Connects to `config.host:config.port` via TCP, secures the stream
/// according to [`ImapConfig::tls_mode`], and logs in.
///
/// # Errors
///
/// [`Error::Connection`] for dial, STARTTLS, or handshake failures;
/// [`Error::Auth`] if the server rejects the credentials.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = config.address();
    let mode = config.tls_mode();
    debug!("Connecting to IMAP server at {} ({:?})", addr, mode);

    let mut tcp_stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| Error::Connection(format!("Failed to connect to {addr}: {e}")))?;

    if mode == TlsMode::StartTls {
        let mut client = async_imap::Client::new(tcp_stream.compat());
        client
            .run_command_and_check_ok("STARTTLS", None)
            .await
            .map_err(|e| Error::Connection(format!("STARTTLS failed: {e}")))?;
        tcp_stream = client.into_inner().into_inner();
    }

    let connector = tls_connector(config.ca_cert.as_deref())?;
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Connection(format!("Invalid server name: {e}")))?;

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| Error::Connection(format!("TLS handshake failed: {e}")))?;

    let tls_client = async_imap::Client::new(tls_stream.compat());

    let session = tls_client
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| match e {
            async_imap::error::Error::No(msg) | async_imap::error::Error::Bad(msg) => {
                Error::Auth(format!("Login rejected: {msg}"))
            }
            other => Error::Connection(format!("Login failed: {other}")),
        })?;

    info!("Connected to IMAP server at {}", addr);
    Ok(session)
}

/// SELECT a folder on an existing session and return its message
/// count.
pub async fn select(session: &mut ImapSession, folder: &str) -> Result<u32> {
    let mailbox = session
        .select(folder)
        .await
        .map_err(|e| Error::Protocol(format!("Failed to select {folder}: {e}")))?;
    debug!("Selected {} ({} messages)", folder, mailbox.exists);
    Ok(mailbox.exists)
}

/// Verifier used when no trust anchor is configured: every chain and
/// signature is accepted.
#[derive(Debug)]
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _leaf: &CertificateDer<'_>,
        _chain: &[CertificateDer<'_>],
        _name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
