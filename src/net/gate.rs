//! Content type gate.
//!
//! The gate is consulted before any body bytes are read. A response must carry exactly one
//! `Content-Type` header, and when an allow-list is configured that header must fully match at
//! least one of its patterns.
use crate::errors::{HandlerError, TransferError};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use regex::Regex;

/// Allow-list check for the `Content-Type` of a response. Immutable after construction, so a
/// single gate can be shared between workers.
#[derive(Debug, Clone)]
pub struct ContentTypeGate {
    /// Compiled patterns, anchored on both ends. `None` accepts every content type.
    patterns: Option<Vec<Regex>>,
}

impl ContentTypeGate {
    /// Creates a gate from an optional list of regular expressions.
    ///
    /// Patterns are matched against the complete header value, so `image/.*` accepts
    /// `image/png` but `image` does not. Bytes outside visible ASCII are matched as their
    /// ISO-8859-1 characters.
    pub fn new<I, S>(allowed: Option<I>) -> Result<Self, HandlerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = match allowed {
            None => None,
            Some(list) => Some(
                list.into_iter()
                    .map(|p| compile_full_match(p.as_ref()))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        Ok(Self { patterns })
    }

    /// A gate that accepts any single `Content-Type`.
    pub fn allow_all() -> Self {
        Self { patterns: None }
    }

    pub fn has_allow_list(&self) -> bool {
        self.patterns.is_some()
    }

    /// Pure predicate variant of [`check`](Self::check).
    pub fn approve(&self, headers: &HeaderMap) -> bool {
        self.check(0, headers).is_ok()
    }

    /// Checks the headers and returns the matching failure cause on rejection.
    pub fn check(&self, status: u16, headers: &HeaderMap) -> Result<(), TransferError> {
        let mut values = headers.get_all(CONTENT_TYPE).iter();
        let value = match (values.next(), values.next()) {
            (Some(v), None) => v,
            _ => {
                let found = headers.get_all(CONTENT_TYPE).iter().count();
                return Err(TransferError::AmbiguousContentType { status, found });
            }
        };

        let Some(patterns) = &self.patterns else {
            return Ok(());
        };

        let content_type = decode_header_value(value);
        if patterns.iter().any(|re| re.is_match(&content_type)) {
            Ok(())
        } else {
            Err(TransferError::ContentTypeNotAllowed { status, content_type })
        }
    }
}

impl Default for ContentTypeGate {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Header values are bytes. Visible ASCII is taken as is, anything else (obs-text) is decoded as
/// ISO-8859-1 so every byte maps to exactly one char.
fn decode_header_value(value: &HeaderValue) -> String {
    match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => value.as_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

fn compile_full_match(pattern: &str) -> Result<Regex, HandlerError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| HandlerError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
