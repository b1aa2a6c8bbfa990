//! Mailbox session and retrieval operations

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::folder::{Folder, INBOX};
use crate::message::Message;
use crate::pagination::PaginationParams;
use crate::range::{SeqWindow, message_from_fetch};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Envelope fields requested for listings.
const LIST_ITEMS: &str = "(ENVELOPE FLAGS RFC822.SIZE)";

/// Listing fields plus the raw message, fetched without setting `\Seen`.
const DETAIL_ITEMS: &str = "(ENVELOPE FLAGS RFC822.SIZE BODY.PEEK[])";

const MESSAGE_QUEUE_DEPTH: usize = 10;
const FOLDER_QUEUE_DEPTH: usize = 50;

/// Lifecycle of a [`MailSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticated,
}

/// One page of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPage {
    /// Messages in ascending sequence order.
    pub messages: Vec<Message>,
    /// Message count of the whole folder.
    pub total: u32,
}

type Connection = Option<ImapSession>;

/// An authenticated connection to the remote mail store.
///
/// Owned by one caller for its whole life. Every operation takes the
/// session lock for its full protocol round trip, so a second caller
/// sharing a reference waits until the first finishes. Callers that
/// need parallel fetches open separate sessions.
pub struct MailSession {
    config: ImapConfig,
    state: SessionState,
    conn: Arc<Mutex<Connection>>,
}

impl MailSession {
    /// A session in the `Disconnected` state.
    #[must_use]
    pub fn new(config: ImapConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a session and connect it.
    ///
    /// # Errors
    ///
    /// See [`MailSession::connect`].
    pub async fn open(config: ImapConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.connect().await?;
        Ok(session)
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Dial, secure, and authenticate. Replaces any live connection.
    ///
    /// On failure the session is left `Disconnected`.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] for dial/TLS failures, [`Error::Auth`] for
    /// rejected credentials.
    pub async fn connect(&mut self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        if let Some(mut old) = conn.take() {
            old.logout().await.ok();
        }

        self.state = SessionState::Connecting;
        match connection::connect(&self.config).await {
            Ok(session) => {
                *conn = Some(session);
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Log out and drop the connection. Succeeds silently when already
    /// disconnected.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if LOGOUT fails; the session is
    /// `Disconnected` either way.
    pub async fn disconnect(&mut self) -> Result<()> {
        let session = self.conn.lock().await.take();
        self.state = SessionState::Disconnected;

        let Some(mut session) = session else {
            return Ok(());
        };
        session.logout().await.map_err(|e| {
            warn!("Logout failed: {}", e);
            Error::Connection(format!("Failed to logout: {e}"))
        })?;
        info!("Disconnected from IMAP server");
        Ok(())
    }

    /// List all folders, in the order the server returns them.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] if not authenticated or LIST fails.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut conn = self.lock().await?;
        let (tx, rx) = mpsc::channel(FOLDER_QUEUE_DEPTH);

        let producer = tokio::spawn(async move {
            let session = authenticated(&mut conn)?;
            let mut names = session
                .list(Some(""), Some("*"))
                .await
                .map_err(|e| Error::Protocol(format!("List folders failed: {e}")))?;

            while let Some(item) = names.next().await {
                let name = item.map_err(|e| Error::Protocol(format!("List folders failed: {e}")))?;
                if tx.send(Folder::from(name.name())).await.is_err() {
                    break;
                }
            }
            Ok::<(), Error>(())
        });

        drain(rx, producer).await
    }

    /// A page of the inbox, newest page first.
    ///
    /// # Errors
    ///
    /// See [`MailSession::fetch_folder`].
    pub async fn fetch_inbox(&self, params: PaginationParams) -> Result<FolderPage> {
        self.fetch_folder(INBOX, params).await
    }

    /// A page of `folder`, newest page first.
    ///
    /// Page `n` covers the sequence window ending `(n - 1) * page_size`
    /// messages below the newest. A page past the oldest message is
    /// empty, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for an empty folder name;
    /// [`Error::Protocol`] if not authenticated, SELECT fails, or
    /// FETCH fails.
    pub async fn fetch_folder(&self, folder: &str, params: PaginationParams) -> Result<FolderPage> {
        if folder.is_empty() {
            return Err(Error::InvalidInput("Folder name is required".into()));
        }

        let mut conn = self.lock().await?;
        let total = connection::select(authenticated(&mut conn)?, folder).await?;

        let Some(window) = SeqWindow::for_page(total, params.page, params.page_size) else {
            debug!("Page {} of {} is past the oldest message", params.page, folder);
            return Ok(FolderPage {
                messages: Vec::new(),
                total,
            });
        };

        debug!("Fetching {} window {}", folder, window.sequence_set());
        let messages = stream_fetch(conn, window.sequence_set(), LIST_ITEMS).await?;
        Ok(FolderPage { messages, total })
    }

    /// Fetch one message by sequence number with its body and
    /// attachments decoded. An empty `folder` means the inbox.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `id` is not a non-negative integer;
    /// [`Error::NotFound`] if no message has that sequence number;
    /// [`Error::Protocol`] if not authenticated, SELECT fails, or
    /// FETCH fails.
    pub async fn fetch_message(&self, id: &str, folder: &str) -> Result<Message> {
        let seq: u32 = id
            .parse()
            .map_err(|e| Error::InvalidInput(format!("Invalid email ID {id:?}: {e}")))?;
        let folder = Folder::or_inbox(folder);

        let mut conn = self.lock().await?;
        let total = connection::select(authenticated(&mut conn)?, folder.name()).await?;
        if seq == 0 || seq > total {
            return Err(not_found(id, &folder));
        }

        stream_fetch(conn, seq.to_string(), DETAIL_ITEMS)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(id, &folder))
    }

    /// Take the session lock for one protocol round trip.
    async fn lock(&self) -> Result<OwnedMutexGuard<Connection>> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        if conn.is_none() {
            return Err(not_connected());
        }
        Ok(conn)
    }
}

/// Run FETCH on a producer task that streams decoded messages through
/// a bounded channel; drain it here, then join the producer.
///
/// The lock guard moves into the producer and is released when it
/// finishes.
async fn stream_fetch(
    mut conn: OwnedMutexGuard<Connection>,
    sequence_set: String,
    items: &'static str,
) -> Result<Vec<Message>> {
    let (tx, rx) = mpsc::channel(MESSAGE_QUEUE_DEPTH);

    let producer = tokio::spawn(async move {
        let session = authenticated(&mut conn)?;
        let mut fetches = session
            .fetch(&sequence_set, items)
            .await
            .map_err(|e| Error::Protocol(format!("Fetch failed: {e}")))?;

        while let Some(item) = fetches.next().await {
            let fetch = item.map_err(|e| Error::Protocol(format!("Fetch error: {e}")))?;
            if tx.send(message_from_fetch(&fetch)).await.is_err() {
                break;
            }
        }
        Ok::<(), Error>(())
    });

    drain(rx, producer).await
}

/// Collect everything the producer sends, then surface its result.
async fn drain<T>(mut rx: mpsc::Receiver<T>, producer: JoinHandle<Result<()>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item);
    }

    producer
        .await
        .map_err(|e| Error::Protocol(format!("Fetch task failed: {e}")))??;
    Ok(out)
}

fn authenticated(conn: &mut Connection) -> Result<&mut ImapSession> {
    conn.as_mut().ok_or_else(not_connected)
}

fn not_connected() -> Error {
    Error::Protocol("Not connected to IMAP server".into())
}

fn not_found(id: &str, folder: &Folder) -> Error {
    Error::NotFound(format!("Message with ID {id} not found in {folder}"))
}
