//! Loopback IMAP server backed by an in-memory `Mailbox`.
//!
//! Each listener speaks one transport. With `start` the greeting goes
//! out in plaintext and the only accepted command is STARTTLS; with
//! `start_implicit_tls` the TLS handshake comes first and the greeting
//! follows inside it. Either way the command loop then parses lines with
//! `imap-codec` and answers from a snapshot of the mailbox.
//!
//! ```text
//!   C: A0001 SELECT INBOX
//!   S: * 25 EXISTS
//!   S: A0001 OK [READ-ONLY] SELECT completed
//!   C: A0002 FETCH 16:25 (ENVELOPE FLAGS RFC822.SIZE)
//!   S: * 16 FETCH (FLAGS (\Seen) RFC822.SIZE 312 ENVELOPE (...))
//! ```

use super::handlers::{
    FetchItems, handle_capability, handle_fetch, handle_list, handle_login, handle_logout,
    handle_noop, handle_select,
};
use super::io::write_line;
use super::mailbox::Mailbox;
use imap_codec::CommandCodec;
use imap_codec::decode::Decoder;
use imap_codec::imap_types::command::CommandBody;
use imap_codec::imap_types::mailbox::Mailbox as ImapMailbox;
use rcgen::generate_simple_self_signed;
use rustls::pki_types::PrivatePkcs8KeyDer;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// How a connection is secured before LOGIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    StartTls,
    Implicit,
}

/// Running fake server. Listens on an ephemeral `127.0.0.1` port with a
/// fresh self-signed certificate; the accept loop stops on drop.
pub struct FakeImapServer {
    port: u16,
    cert_pem: String,
    /// Accept loop, aborted on drop.
    handle: tokio::task::JoinHandle<()>,
}

impl FakeImapServer {
    /// Serve `mailbox` over STARTTLS.
    pub async fn start(mailbox: Mailbox) -> Self {
        Self::spawn(mailbox, Transport::StartTls).await
    }

    /// Start a server that expects TLS from the first byte.
    pub async fn start_implicit_tls(mailbox: Mailbox) -> Self {
        Self::spawn(mailbox, Transport::Implicit).await
    }

    async fn spawn(mailbox: Mailbox, transport: Transport) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        // Parsed as an IP SAN.
        let cert = generate_simple_self_signed(vec!["127.0.0.1".to_string()])
            .expect("generate self-signed cert");

        let cert_pem = cert.cert.pem();
        let cert_der = cert.cert.der().clone();
        let key_der = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

        let tls_config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .expect("TLS protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der.into())
        .expect("build server TLS config");

        let acceptor = TlsAcceptor::from(Arc::new(tls_config));
        let mailbox = Arc::new(Mutex::new(mailbox));

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let acceptor = acceptor.clone();
                let mailbox = mailbox.clone();
                tokio::spawn(async move {
                    match transport {
                        Transport::StartTls => {
                            handle_starttls_connection(stream, acceptor, &mailbox).await;
                        }
                        Transport::Implicit => {
                            handle_implicit_connection(stream, acceptor, &mailbox).await;
                        }
                    }
                });
            }
        });

        Self {
            port,
            cert_pem,
            handle,
        }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The server certificate, PEM-encoded, for use as a trust anchor.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }
}

impl Drop for FakeImapServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const GREETING: &str = "* OK IMAP4rev1 Fake server ready\r\n";

/// Plaintext greeting, STARTTLS, handshake, then the command loop.
async fn handle_starttls_connection(
    stream: tokio::net::TcpStream,
    acceptor: TlsAcceptor,
    mailbox: &Mutex<Mailbox>,
) {
    let mut reader = BufReader::new(stream);
    if write_line(&mut reader, GREETING).await.is_err() {
        return;
    }

    let mut line = String::new();
    if reader.read_line(&mut line).await.is_err() {
        return;
    }
    let Some((tag, command)) = line.trim().split_once(' ') else {
        return;
    };
    if !command.eq_ignore_ascii_case("STARTTLS") {
        let resp = format!("{tag} BAD Expected STARTTLS\r\n");
        let _ = write_line(&mut reader, &resp).await;
        return;
    }

    let resp = format!("{tag} OK Begin TLS negotiation now\r\n");
    if write_line(&mut reader, &resp).await.is_err() {
        return;
    }

    let tcp = reader.into_inner();
    let Ok(tls_stream) = acceptor.accept(tcp).await else {
        return;
    };

    handle_imap_session(tls_stream, mailbox).await;
}

/// Handle an implicit-TLS client connection: handshake first, then the
/// greeting and the command loop inside TLS.
async fn handle_implicit_connection(
    stream: tokio::net::TcpStream,
    acceptor: TlsAcceptor,
    mailbox: &Mutex<Mailbox>,
) {
    let Ok(tls_stream) = acceptor.accept(stream).await else {
        return;
    };

    let mut reader = BufReader::new(tls_stream);
    if write_line(&mut reader, GREETING).await.is_err() {
        return;
    }
    handle_imap_session(reader.into_inner(), mailbox).await;
}

/// Folder name as the mailbox store keys it.
fn mailbox_name(mb: &ImapMailbox<'_>) -> String {
    match mb {
        ImapMailbox::Inbox => "INBOX".to_string(),
        ImapMailbox::Other(other) => {
            let bytes: &[u8] = other.as_ref();
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Command loop. Anything other than CAPABILITY, NOOP, LOGIN and LOGOUT
/// gets `NO` until a LOGIN succeeds.
async fn handle_imap_session<S: AsyncRead + AsyncWrite + Unpin>(
    stream: S,
    mailbox: &Mutex<Mailbox>,
) {
    let mut reader = BufReader::new(stream);
    let mut selected_folder: Option<String> = None;
    let mut authenticated = false;
    let codec = CommandCodec::default();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Ok((_, command)) = codec.decode(line.as_bytes()) else {
            let tag = trimmed.split_whitespace().next().unwrap_or("*");
            let resp = format!("{tag} BAD Parse error\r\n");
            if write_line(&mut reader, &resp).await.is_err() {
                break;
            }
            continue;
        };

        let tag = command.tag.inner();
        let snap = mailbox.lock().unwrap().clone();

        match command.body {
            CommandBody::Capability => {
                handle_capability(tag, &mut reader).await;
            }
            CommandBody::Noop => {
                handle_noop(tag, &mut reader).await;
            }
            CommandBody::Login { ref password, .. } => {
                let given: &[u8] = password.declassify().as_ref();
                authenticated = handle_login(tag, given, &snap, &mut reader).await;
            }
            CommandBody::Logout => {
                handle_logout(tag, &mut reader).await;
                break;
            }
            _ if !authenticated => {
                let resp = format!("{tag} NO Not authenticated\r\n");
                if write_line(&mut reader, &resp).await.is_err() {
                    break;
                }
            }
            CommandBody::List { .. } => {
                handle_list(tag, &snap, &mut reader).await;
            }
            CommandBody::Select { mailbox: mb, .. } => {
                let name = mailbox_name(&mb);
                selected_folder = handle_select(tag, &name, &snap, &mut reader).await;
            }
            CommandBody::Fetch {
                ref sequence_set,
                uid: false,
                ..
            } => {
                handle_fetch(
                    tag,
                    sequence_set,
                    FetchItems::from_command(trimmed),
                    &snap,
                    selected_folder.as_deref(),
                    &mut reader,
                )
                .await;
            }
            _ => {
                let resp = format!("{tag} BAD Unknown command\r\n");
                if write_line(&mut reader, &resp).await.is_err() {
                    break;
                }
            }
        }
    }
}
