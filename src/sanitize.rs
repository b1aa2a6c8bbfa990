//! Body text sanitizer
//!
//! [`clean`] strips embedded base64 payloads and anything outside a
//! conservative Latin character set from message text. It is an
//! ordered pipeline of pure steps, each exposed on its own:
//!
//! 1. [`strip_base64_tags`]
//! 2. [`strip_data_uris`]
//! 3. [`strip_control_chars`]
//! 4. [`keep_allowed_chars`]
//! 5. [`collapse_whitespace`]

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref BASE64_TAG: Regex =
        Regex::new(r"(?is)<(?:img|embed|object)\b[^>]*base64[^>]*>").expect("valid regex");
    static ref DATA_URI: Regex =
        Regex::new(r"(?i)data:[a-z0-9.+-]+/[a-z0-9.+-]+;base64,[A-Za-z0-9+/=]*")
            .expect("valid regex");
    static ref CONTROL: Regex =
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F\x{AD}\x{FFFD}]").expect("valid regex");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s{2,}").expect("valid regex");
}

/// Run the whole pipeline.
///
/// The pipeline is repeated until the text stops changing, since one
/// removal can splice fragments into a new match. Every step only
/// removes or shortens text, so this terminates, and `clean` is
/// idempotent.
///
/// # Examples
///
/// ```
/// use mailapi::sanitize::clean;
///
/// let body = "Hi <img src=\"data:image/png;base64,AAAA\"> there\u{0}";
/// assert_eq!(clean(body), "Hi there");
/// ```
#[must_use]
pub fn clean(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let text = strip_base64_tags(text);
    let text = strip_data_uris(&text);
    let text = strip_control_chars(&text);
    let text = keep_allowed_chars(&text);
    collapse_whitespace(&text)
}

/// Remove `img`, `embed`, and `object` tags whose attributes mention
/// `base64`. A tag may span lines.
#[must_use]
pub fn strip_base64_tags(text: &str) -> Cow<'_, str> {
    BASE64_TAG.replace_all(text, "")
}

/// Remove `data:<type>;base64,<payload>` literals.
#[must_use]
pub fn strip_data_uris(text: &str) -> Cow<'_, str> {
    DATA_URI.replace_all(text, "")
}

/// Remove C0/C1 controls (except tab, newline, carriage return), the
/// soft hyphen, and the replacement character.
#[must_use]
pub fn strip_control_chars(text: &str) -> Cow<'_, str> {
    CONTROL.replace_all(text, "")
}

/// Keep printable ASCII, tab, newline, carriage return, Latin-1
/// Supplement (U+00A0..=U+00FF) and Latin Extended-A
/// (U+0100..=U+017F). Everything else is dropped.
#[must_use]
pub fn keep_allowed_chars(text: &str) -> String {
    text.chars().filter(|c| is_allowed(*c)).collect()
}

const fn is_allowed(c: char) -> bool {
    matches!(c, ' '..='~' | '\n' | '\r' | '\t' | '\u{A0}'..='\u{17F}')
}

/// Replace runs of two or more whitespace characters with one space,
/// then trim both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
