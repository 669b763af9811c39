//! Streaming HTTP response model.
//!
//! This struct represents an HTTP response as handed over by the network layer **before** its
//! body has been read. It contains the status code, the response headers, and (optionally) a
//! body entity that can be read exactly once.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for header names and keeps
//!   every value of a repeated header.
//! - `body` is `None` when the response carries no entity at all. An entity with zero bytes is
//!   still `Some`.
//! - The body is a blocking [`Read`]; it is meant to be consumed on a worker thread.
//!
use http::HeaderMap;
use std::fmt;
use std::io::Read;

/// Body entity of a response: a one-shot byte stream plus its declared length.
pub struct Body {
    reader: Box<dyn Read + Send>,
    content_length: Option<u64>,
}

impl Body {
    /// Creates a body from any reader. `content_length` is the length as declared by the
    /// transport (`Content-Length`), `None` when unknown.
    pub fn new<R: Read + Send + 'static>(reader: R, content_length: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            content_length,
        }
    }

    /// Creates a body from in-memory bytes. The length is known.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self::new(std::io::Cursor::new(bytes), Some(len))
    }

    /// Declared total length. May be unknown or even wrong, consumers must not rely on it.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("reader", &"Box<dyn Read + Send>")
            .field("content_length", &self.content_length)
            .finish()
    }
}

/// Simple structure for HTTP responses whose body has not been read yet.
#[derive(Debug)]
pub struct Response {
    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Response headers as a case-insensitive multimap.
    pub headers: HeaderMap,

    /// Body entity, if the response has one.
    pub body: Option<Body>,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: Option<Body>) -> Self {
        Self { status, headers, body }
    }

    /// Returns all values of the given header, in the order they were received.
    pub fn header_values(&self, name: impl http::header::AsHeaderName) -> Vec<&http::HeaderValue> {
        self.headers.get_all(name).iter().collect()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
