//! Reason phrases for HTTP status codes.

// Internal imports (std, crate)
use std::borrow::Cow;

// External imports (alphabetized)
use http::StatusCode;

/// Human-readable description for a status code, `"Status <code>"` if unknown.
pub fn reason_phrase(status: u16) -> Cow<'static, str> {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(Cow::Borrowed)
        .unwrap_or_else(|| Cow::Owned(format!("Status {status}")))
}
