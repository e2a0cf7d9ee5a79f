//! Request path canonicalization.
//!
//! # Responsibilities
//! - Decode percent-escaped unreserved characters (`%64` → `d`)
//! - Collapse repeated slashes
//! - Resolve `.` and `..` segments, never climbing above `/`
//!
//! # Design Decisions
//! - Runs before filtering so the filter, the matcher and the upstream all
//!   see one path
//! - Encoded `/` or `\`, raw `\` and malformed escapes are rejected

use axum::http::uri::{PathAndQuery, Uri};
use thiserror::Error;

/// Why a path cannot be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed percent escape")]
    MalformedEscape,

    #[error("encoded path separator")]
    EncodedSeparator,

    #[error("backslash in path")]
    Backslash,

    #[error("cannot rebuild URI: {0}")]
    Rebuild(String),
}

/// Canonical form of an absolute request path.
///
/// Non-absolute paths (`*` for `OPTIONS`) are returned unchanged.
pub fn canonical_path(path: &str) -> Result<String, PathError> {
    if !path.starts_with('/') {
        return Ok(path.to_string());
    }
    let decoded = decode_unreserved(path)?;
    Ok(resolve_segments(&decoded))
}

/// `uri` with its path canonicalized, or `None` if it already is.
pub fn canonical_uri(uri: &Uri) -> Result<Option<Uri>, PathError> {
    let path = canonical_path(uri.path())?;
    if path == uri.path() {
        return Ok(None);
    }

    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query).map_err(|e| PathError::Rebuild(e.to_string()))?,
    );
    Uri::from_parts(parts)
        .map(Some)
        .map_err(|e| PathError::Rebuild(e.to_string()))
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn decode_unreserved(path: &str) -> Result<String, PathError> {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => return Err(PathError::Backslash),
            b'%' => {
                let (hi, lo) = match (bytes.get(i + 1), bytes.get(i + 2)) {
                    (Some(&hi), Some(&lo)) => (hi, lo),
                    _ => return Err(PathError::MalformedEscape),
                };
                let value = hex_value(hi)
                    .zip(hex_value(lo))
                    .map(|(h, l)| (h << 4) | l)
                    .ok_or(PathError::MalformedEscape)?;

                match value {
                    b'/' | b'\\' => return Err(PathError::EncodedSeparator),
                    v if is_unreserved(v) => out.push(v),
                    _ => out.extend_from_slice(&[
                        b'%',
                        hi.to_ascii_uppercase(),
                        lo.to_ascii_uppercase(),
                    ]),
                }
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    // Only ASCII bytes were substituted, so the input's UTF-8 survives.
    String::from_utf8(out).map_err(|_| PathError::MalformedEscape)
}

fn resolve_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let trailing_slash = matches!(path.rsplit('/').next(), Some("" | "." | ".."));

    let mut out = String::with_capacity(path.len());
    out.push('/');
    out.push_str(&segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        out.push('/');
    }
    out
}
