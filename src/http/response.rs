//! The immutable response value consumed by the transaction bridge.

use std::io;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::{Headers, StatusCode};

/// A response body: absent, fully buffered, or a finite single-pass stream
/// of byte chunks.
///
/// A streamed body is fed through a bounded channel; the producer sends
/// `Ok(chunk)` per chunk and drops the sender to end the stream, or sends an
/// `Err` to abort it. Chunks are yielded strictly in arrival order and the
/// body can be consumed exactly once.
#[derive(Debug)]
pub enum Body {
    /// No body at all. The sink writes head and finalizer only.
    Empty,
    /// A fully materialized body, yielded as a single chunk.
    Full(Bytes),
    /// A lazy sequence of chunks, ended by dropping the sender.
    Stream(mpsc::Receiver<io::Result<Bytes>>),
}

impl Body {
    /// Creates a streamed body and the sender that feeds it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<io::Result<Bytes>>, Body) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Body::Stream(rx))
    }

    /// Yields the next chunk, or `None` once the body is exhausted.
    ///
    /// A [`Body::Full`] yields its bytes as one chunk and is empty afterwards;
    /// a [`Body::Stream`] yields whatever the producer sent, including read
    /// errors, which the caller must propagate.
    pub async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        match self {
            Body::Empty => None,
            Body::Full(_) => match std::mem::replace(self, Body::Empty) {
                Body::Full(bytes) => Some(Ok(bytes)),
                _ => unreachable!(),
            },
            Body::Stream(rx) => rx.recv().await,
        }
    }

    /// Returns the body length when it is known up front (`None` for streams).
    pub fn known_length(&self) -> Option<usize> {
        match self {
            Body::Empty => Some(0),
            Body::Full(bytes) => Some(bytes.len()),
            Body::Stream(_) => None,
        }
    }

    /// Returns `true` when the body is known to be absent.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Full(bytes)
    }
}

/// An immutable HTTP response value.
///
/// Built by an application handler and handed to the bridge, which flattens
/// the header multimap and streams the body to the transaction sink. Repeated
/// header names (`Set-Cookie`) are preserved as separate entries end to end.
///
/// # Examples
///
/// ```
/// use spahost::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Content-Type", "text/html; charset=utf-8")
///     .body("<!doctype html>");
/// assert_eq!(response.status(), StatusCode::Ok);
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Creates a response with the given status, no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Appends a response header. Multiple calls with the same name are
    /// additive, never overwriting.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends a header in-place, for decorating a response received from
    /// elsewhere without consuming it.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.append(name, value);
    }

    /// Sets a fully buffered body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Full(Bytes::from(body.into()));
        self
    }

    /// Sets a fully buffered body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Full(body.into());
        self
    }

    /// Sets a streamed body.
    #[must_use]
    pub fn stream(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the body without consuming it.
    pub fn body_ref(&self) -> &Body {
        &self.body
    }

    /// Decomposes the response for the sink: status, headers, body.
    pub fn into_parts(self) -> (StatusCode, Headers, Body) {
        (self.status, self.headers, self.body)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
