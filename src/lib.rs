//! Mailbox retrieval core for an HTTP mail API
//!
//! Proxies a remote IMAP store: lists folders, pages through a folder
//! newest-first, and fetches single messages with their MIME body and
//! attachments decoded. Bodies are sanitized and attachments rendered
//! as inline HTML by the [`response`] layer.
//!
//! Each [`MailSession`] owns one authenticated connection, secured with
//! STARTTLS or implicit TLS depending on the configured port. The
//! connection is strictly read-only: bodies are fetched with
//! `BODY.PEEK[]` so flags are never changed.

mod client;
mod config;
mod connection;
mod decode;
mod error;
mod flag;
mod folder;
mod message;
mod pagination;
mod range;
pub mod render;
pub mod response;
pub mod sanitize;

pub use client::{FolderPage, MailSession, SessionState};
pub use config::{ImapConfig, TlsMode};
pub use decode::{DecodedMime, decode_mime};
pub use error::{Error, Result};
pub use flag::Flag;
pub use folder::{Folder, FolderKind, INBOX};
pub use message::{Attachment, Message};
pub use pagination::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PaginationParams, PaginationResponse, create_response,
};
pub use range::SeqWindow;
