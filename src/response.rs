//! JSON shapes handed to the HTTP layer
//!
//! This is where decoded messages meet the content pipeline: bodies
//! are cut to a size-dependent budget and sanitized, attachments are
//! rendered inline.

use crate::folder::{Folder, FolderKind};
use crate::message::{Attachment, Message};
use crate::pagination::PaginationResponse;
use crate::render::{attachment_limit, to_inline};
use crate::sanitize::clean;
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Character budget for a message body, from the message's total size.
///
/// Over 1,000,000 bytes: 5,000. Over 500,000: 7,500. Any other known
/// size: 15,000. Unknown (0): 10,000.
///
/// # Examples
///
/// ```
/// use mailapi::response::body_limit;
///
/// assert_eq!(body_limit(2_000_000), 5_000);
/// assert_eq!(body_limit(0), 10_000);
/// ```
#[must_use]
pub const fn body_limit(message_size: u32) -> usize {
    match message_size {
        0 => 10_000,
        1..=500_000 => 15_000,
        500_001..=1_000_000 => 7_500,
        _ => 5_000,
    }
}

/// The first `limit` bytes of `body`.
///
/// The cut ignores character boundaries; a split character decodes to
/// U+FFFD, which [`clean`] later removes.
#[must_use]
pub fn truncate_body(body: &str, limit: usize) -> String {
    let bytes = body.as_bytes();
    let end = bytes.len().min(limit);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// A message as returned by list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailResponse {
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentResponse>,
}

/// A rendered attachment.
///
/// `size` is the render budget that was applied, not the byte length
/// of the attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentResponse {
    pub filename: String,
    pub mime_type: String,
    pub size: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FolderKind,
}

/// List results with their page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationResponse,
}

/// The inbox view: folder list alongside the first page of the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxResponse {
    pub folders: Vec<FolderResponse>,
    pub inbox: Vec<EmailResponse>,
    pub pagination: PaginationResponse,
}

impl EmailResponse {
    /// Envelope-only view for listings.
    #[must_use]
    pub fn summary(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            date: message
                .date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            body: None,
            labels: message.labels(),
            attachments: Vec::new(),
        }
    }

    /// Full view: truncated, sanitized body and rendered attachments.
    #[must_use]
    pub fn detail(message: &Message) -> Self {
        let body = truncate_body(&message.body, body_limit(message.size));
        Self {
            body: Some(clean(&body)),
            attachments: message
                .attachments
                .iter()
                .map(|a| AttachmentResponse::render(a, message.size))
                .collect(),
            ..Self::summary(message)
        }
    }
}

impl AttachmentResponse {
    #[must_use]
    pub fn render(attachment: &Attachment, message_size: u32) -> Self {
        let limit = attachment_limit(message_size, attachment.content.len());
        Self {
            filename: attachment.filename.clone(),
            mime_type: attachment.mime_type.clone(),
            size: limit,
            content: to_inline(attachment, limit),
        }
    }
}

impl From<&Folder> for FolderResponse {
    fn from(folder: &Folder) -> Self {
        Self {
            name: folder.name().to_string(),
            kind: folder.kind(),
        }
    }
}
