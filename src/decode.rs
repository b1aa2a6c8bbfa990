//! MIME decoding of a raw message body
//!
//! Walks the leaf parts of the MIME tree. A part with an
//! `attachment` disposition becomes an [`Attachment`]; the first
//! other leaf becomes the message body. Parts that cannot be decoded
//! are skipped so one bad part never loses the rest of the message.

use crate::error::{Error, Result};
use crate::message::Attachment;
use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Body and attachments recovered from one raw message.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecodedMime {
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Decode RFC 2047 encoded words in an envelope header value. Text
/// with no encoded words comes back unchanged.
#[must_use]
pub fn decode_header_text(raw: &[u8]) -> String {
    let value: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'\r' || b == b'\n' { b' ' } else { b })
        .collect();

    let mut header = Vec::with_capacity(value.len() + 13);
    header.extend_from_slice(b"Subject: ");
    header.extend_from_slice(&value);
    header.extend_from_slice(b"\r\n\r\n");

    MessageParser::default()
        .parse(&header)
        .and_then(|message| message.subject().map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned())
}

/// One classified leaf part.
#[derive(Debug, PartialEq, Eq)]
enum Leaf {
    Inline(String),
    Attachment(Attachment),
}

/// Decode `raw` (a full RFC 5322 message) into body and attachments.
///
/// Never fails: an unparseable message yields an empty body and no
/// attachments, and undecodable parts are dropped with a warning.
#[must_use]
pub fn decode_mime(raw: &[u8]) -> DecodedMime {
    let mut decoded = DecodedMime::default();

    let Some(message) = MessageParser::default().parse(raw) else {
        warn!("Could not parse MIME structure ({} bytes)", raw.len());
        return decoded;
    };

    let mut body_found = false;
    for (index, part) in message.parts.iter().enumerate() {
        match classify(part) {
            Ok(None) => {}
            Ok(Some(Leaf::Inline(text))) => {
                if body_found {
                    debug!("Ignoring extra inline part {}", index);
                } else {
                    decoded.body = text;
                    body_found = true;
                }
            }
            Ok(Some(Leaf::Attachment(attachment))) => decoded.attachments.push(attachment),
            Err(e) => warn!("Skipping MIME part {}: {}", index, e),
        }
    }

    decoded
}

/// Classify a part. `Ok(None)` for multipart containers.
fn classify(part: &MessagePart<'_>) -> Result<Option<Leaf>> {
    if matches!(part.body, PartType::Multipart(_)) {
        return Ok(None);
    }
    if part.is_encoding_problem {
        return Err(Error::Parse(format!(
            "undecodable {} content",
            mime_type(part)
        )));
    }

    let is_attachment = part
        .content_disposition()
        .is_some_and(|cd| cd.is_attachment());

    if is_attachment {
        return Ok(Some(Leaf::Attachment(Attachment {
            filename: part.attachment_name().unwrap_or_default().to_string(),
            mime_type: mime_type(part),
            content: part.contents().to_vec(),
        })));
    }

    let text = match &part.body {
        PartType::Text(text) | PartType::Html(text) => text.to_string(),
        _ => String::from_utf8_lossy(part.contents()).into_owned(),
    };
    Ok(Some(Leaf::Inline(text)))
}

fn mime_type(part: &MessagePart<'_>) -> String {
    part.content_type().map_or_else(
        || DEFAULT_MIME_TYPE.to_string(),
        |ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
            None => ct.ctype().to_ascii_lowercase(),
        },
    )
}
