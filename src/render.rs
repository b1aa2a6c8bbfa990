//! Inline rendering of attachments
//!
//! Turns an [`Attachment`] into an HTML fragment a mail client can
//! drop into a page. Only `text/*` content is cut to the length
//! budget; images, PDFs, and downloads are embedded whole as base64
//! data URIs.

use crate::message::Attachment;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Length budget for one attachment.
///
/// Thresholds are checked in order: a message over 1,000,000 bytes
/// gets 500; an attachment over 100,000 bytes gets 750; a message
/// over 500,000 bytes gets 800; otherwise 1,000.
///
/// # Examples
///
/// ```
/// use mailapi::render::attachment_limit;
///
/// assert_eq!(attachment_limit(2_000_000, 10), 500);
/// assert_eq!(attachment_limit(0, 10), 1_000);
/// ```
#[must_use]
pub const fn attachment_limit(message_size: u32, content_len: usize) -> usize {
    if message_size > 1_000_000 {
        500
    } else if content_len > 100_000 {
        750
    } else if message_size > 500_000 {
        800
    } else {
        1_000
    }
}

/// Render `attachment` as an inline HTML fragment.
///
/// `limit` caps the bytes of `text/*` content that are embedded; 0
/// means no cap. Text is cut back to a character boundary, so the
/// embedded text never exceeds `limit` bytes.
#[must_use]
pub fn to_inline(attachment: &Attachment, limit: usize) -> String {
    let mime = attachment.mime_type.as_str();

    if mime.starts_with("image/") {
        format!(
            r#"<img src="data:{mime};base64,{}" alt="{}" style="max-width: 100%; display: block;" />"#,
            STANDARD.encode(&attachment.content),
            escape_attr(&attachment.filename),
        )
    } else if mime.starts_with("text/") {
        format!("<pre>{}</pre>", truncate_text(&attachment.content, limit))
    } else if mime.starts_with("application/pdf") {
        format!(
            r#"<embed src="data:{mime};base64,{}" type="application/pdf" width="100%" height="600px" />"#,
            STANDARD.encode(&attachment.content),
        )
    } else {
        format!(
            r#"<a href="data:{mime};base64,{}" download="{name}">Download {name}</a>"#,
            STANDARD.encode(&attachment.content),
            name = escape_attr(&attachment.filename),
        )
    }
}

/// Escape a value for a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// At most `limit` bytes of `content` as text (all of it when
/// `limit` is 0).
fn truncate_text(content: &[u8], limit: usize) -> String {
    let slice = if limit > 0 && content.len() > limit {
        &content[..limit]
    } else {
        content
    };

    let text = String::from_utf8_lossy(slice);
    if limit == 0 || text.len() <= limit {
        return text.into_owned();
    }

    // Lossy decoding can widen a cut sequence into U+FFFD.
    let end = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= limit)
        .last()
        .unwrap_or(0);
    text[..end].to_string()
}
