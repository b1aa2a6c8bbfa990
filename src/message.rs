//! Message data model

use crate::flag::Flag;
use chrono::{DateTime, FixedOffset};

/// A message as retrieved from a folder.
///
/// List fetches fill the envelope fields, flags, and size. `body` and
/// `attachments` are only populated by a single-message fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Sequence number within the folder, as a string.
    pub id: String,
    /// First address of the envelope's From list, empty if absent.
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub flags: Vec<Flag>,
    /// `RFC822.SIZE` in bytes; 0 when the server did not report it.
    pub size: u32,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// A decoded attachment part. The content is owned by the message that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl Message {
    /// Flag labels in server order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.flags.iter().map(ToString::to_string).collect()
    }
}
