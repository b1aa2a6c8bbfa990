//! Message flags
//!
//! Server-maintained labels on a message. System flags have dedicated
//! variants; anything else the server reports is kept verbatim as a
//! `Keyword`. At the response boundary flags become plain label
//! strings.

use std::fmt;

/// A message flag as reported by a FETCH.
///
/// # Examples
///
/// ```
/// use mailapi::Flag;
///
/// assert_eq!(Flag::Seen.label(), "\\Seen");
/// assert_eq!(Flag::Keyword("$Important".into()).to_string(), "$Important");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read (`\Seen`).
    Seen,
    /// Message has been answered (`\Answered`).
    Answered,
    /// Message is flagged for attention (`\Flagged`).
    Flagged,
    /// Message is marked for deletion (`\Deleted`).
    Deleted,
    /// Message is a draft (`\Draft`).
    Draft,
    /// Message arrived since the last session (`\Recent`).
    Recent,
    /// Any other flag or keyword, as sent by the server.
    Keyword(String),
}

impl Flag {
    /// The wire label of this flag.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(kw) => kw,
        }
    }
}

impl From<&async_imap::types::Flag<'_>> for Flag {
    fn from(flag: &async_imap::types::Flag<'_>) -> Self {
        use async_imap::types::Flag as Wire;
        match flag {
            Wire::Seen => Self::Seen,
            Wire::Answered => Self::Answered,
            Wire::Flagged => Self::Flagged,
            Wire::Deleted => Self::Deleted,
            Wire::Draft => Self::Draft,
            Wire::Recent => Self::Recent,
            Wire::MayCreate => Self::Keyword("\\*".to_string()),
            Wire::Custom(kw) => Self::Keyword(kw.to_string()),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
