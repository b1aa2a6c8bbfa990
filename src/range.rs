//! Sequence windows and envelope records
//!
//! Pages are counted newest-first: the newest message has the highest
//! sequence number, so page 1 ends at the folder's message count and
//! later pages walk down toward 1. Within a window, messages are kept
//! in the ascending order the server returns them.

use crate::decode;
use crate::flag::Flag;
use crate::message::Message;
use async_imap::imap_proto::types::Address;
use async_imap::types::Fetch;
use chrono::{DateTime, FixedOffset};

/// An inclusive `[from, to]` range of 1-based sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqWindow {
    pub from: u32,
    pub to: u32,
}

impl SeqWindow {
    /// The window holding page `page` (1-based) of `page_size` messages
    /// in a folder of `total` messages.
    ///
    /// Returns `None` when the page lies past the oldest message or
    /// `page_size` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use mailapi::SeqWindow;
    ///
    /// let w = SeqWindow::for_page(1000, 1, 20).unwrap();
    /// assert_eq!((w.from, w.to), (981, 1000));
    /// assert!(SeqWindow::for_page(5, 2, 20).is_none());
    /// ```
    #[must_use]
    pub fn for_page(total: u32, page: u32, page_size: u32) -> Option<Self> {
        if page_size == 0 {
            return None;
        }
        let skipped = u64::from(page.max(1) - 1) * u64::from(page_size);
        let to = u64::from(total).checked_sub(skipped).filter(|to| *to >= 1)?;
        let from = to.saturating_sub(u64::from(page_size) - 1).max(1);

        // Both bounds are <= total, which is a u32.
        Some(Self {
            from: u32::try_from(from).ok()?,
            to: u32::try_from(to).ok()?,
        })
    }

    /// IMAP sequence-set syntax, `from:to`.
    #[must_use]
    pub fn sequence_set(&self) -> String {
        format!("{}:{}", self.from, self.to)
    }
}

/// Convert one FETCH response into a [`Message`].
///
/// Envelope fields that are absent come out empty. If the response
/// carries a body literal it is MIME-decoded into the body and
/// attachments.
pub(crate) fn message_from_fetch(fetch: &Fetch) -> Message {
    let mut message = Message {
        id: fetch.message.to_string(),
        flags: fetch.flags().map(|f| Flag::from(&f)).collect(),
        size: fetch.size.unwrap_or(0),
        ..Message::default()
    };

    if let Some(env) = fetch.envelope() {
        message.subject = env
            .subject
            .as_deref()
            .map(decode::decode_header_text)
            .unwrap_or_default();
        message.date = env.date.as_deref().and_then(parse_envelope_date);
        message.from = env
            .from
            .as_ref()
            .and_then(|addrs| addrs.first())
            .map(format_address)
            .unwrap_or_default();
        message.to = env
            .to
            .as_ref()
            .map(|addrs| addrs.iter().map(format_address).collect())
            .unwrap_or_default();
    }

    if let Some(raw) = fetch.body() {
        let decoded = decode::decode_mime(raw);
        message.body = decoded.body;
        message.attachments = decoded.attachments;
    }

    message
}

/// `mailbox@host`, or whichever half is present.
pub(crate) fn format_address(addr: &Address<'_>) -> String {
    let mailbox = addr.mailbox.as_deref().map(lossy).unwrap_or_default();
    let host = addr.host.as_deref().map(lossy).unwrap_or_default();
    match (mailbox.is_empty(), host.is_empty()) {
        (false, false) => format!("{mailbox}@{host}"),
        (false, true) => mailbox,
        (true, _) => host,
    }
}

/// Envelope dates are RFC 2822; anything else is treated as unknown.
pub(crate) fn parse_envelope_date(raw: &[u8]) -> Option<DateTime<FixedOffset>> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    DateTime::parse_from_rfc2822(text).ok()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
