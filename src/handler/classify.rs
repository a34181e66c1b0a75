//! Caller classification
//!
//! A caller is a script client when its `User-Agent`, lowercased, contains
//! `curl/` or `wget/` anywhere. No tokenizing and no word boundaries:
//! `not-curl/x` counts as curl.

use hyper::header::{HeaderMap, USER_AGENT};

/// Lowercase substrings that identify a command-line HTTP client
pub const SCRIPT_CLIENT_MARKERS: [&str; 2] = ["curl/", "wget/"];

/// How a caller is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// curl or wget: gets the install script
    Script,
    /// Anything else: gets redirected
    Other,
}

impl ClientKind {
    /// Label used in access logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Other => "other",
        }
    }
}

/// Classify a raw `User-Agent` value
pub fn classify_user_agent(user_agent: &str) -> ClientKind {
    let lowered = user_agent.to_ascii_lowercase();
    if SCRIPT_CLIENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        ClientKind::Script
    } else {
        ClientKind::Other
    }
}

/// The `User-Agent` of a request, `None` when the header is absent
///
/// Repeated headers are joined with `", "` in arrival order. Values with
/// non-ASCII bytes are decoded lossily.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    let mut values = headers.get_all(USER_AGENT).iter().peekable();
    values.peek()?;

    let joined = values
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(joined)
}

/// Classify a request by its headers; a missing `User-Agent` reads as empty
///
/// The markers are ASCII, so lossy decoding cannot create or hide a match,
/// and neither can the separator between repeated values.
pub fn classify(headers: &HeaderMap) -> ClientKind {
    user_agent(headers).map_or(ClientKind::Other, |ua| classify_user_agent(&ua))
}
