//! Mailbox folders
//!
//! A folder is an opaque name as the server reports it. No hierarchy
//! is modeled: delimiter characters are just part of the name. The
//! well-known names are recognised only to label folders for display.

use serde::Serialize;
use std::fmt;

/// The folder used when a caller does not name one.
pub const INBOX: &str = "INBOX";

/// A named mailbox on the remote store.
///
/// # Examples
///
/// ```
/// use mailapi::{Folder, FolderKind};
///
/// let inbox = Folder::or_inbox("");
/// assert_eq!(inbox.name(), "INBOX");
/// assert_eq!(Folder::from("Sent").kind(), FolderKind::Sent);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Folder(String);

/// Display classification of a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    Inbox,
    Sent,
    Drafts,
    Trash,
    Spam,
    Archive,
    /// A user-defined or server-specific folder.
    Custom,
}

impl Folder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `name`, or the inbox when `name` is empty.
    #[must_use]
    pub fn or_inbox(name: &str) -> Self {
        if name.is_empty() {
            Self(INBOX.to_string())
        } else {
            Self(name.to_string())
        }
    }

    /// The folder name as a string slice.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Classify the folder. INBOX matches case-insensitively (RFC 3501);
    /// the other well-known names match exactly.
    #[must_use]
    pub fn kind(&self) -> FolderKind {
        if self.0.eq_ignore_ascii_case(INBOX) {
            return FolderKind::Inbox;
        }
        match self.0.as_str() {
            "Sent" => FolderKind::Sent,
            "Drafts" => FolderKind::Drafts,
            "Trash" => FolderKind::Trash,
            "Spam" | "Junk" => FolderKind::Spam,
            "Archive" => FolderKind::Archive,
            _ => FolderKind::Custom,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self(s)
    }
}
