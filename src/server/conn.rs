//! The native streaming layer: one TCP connection's requests exposed as
//! bridge transactions.
//!
//! [`parse_head`] parses an HTTP/1.1 request head incrementally with
//! `httparse`; [`Transaction`] then presents the head plus the unread body
//! bytes (buffered remainder first, then socket reads) as an
//! [`IncomingTransaction`], and [`ConnectionSink`] presents the write half
//! as a [`ResponseSink`]. The sink buffers head and body and flushes once at
//! finalization, which lets it emit an exact `Content-Length` and keep the
//! connection reusable.

use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::bridge::{IncomingTransaction, ResponseSink};
use crate::http::{FieldValue, StatusCode};

/// Maximum number of header lines we accept per request.
const MAX_HEADERS: usize = 64;

/// Per-read ceiling for body chunks.
const BODY_CHUNK_SIZE: usize = 8 * 1024;

/// A parsed request head.
#[derive(Debug)]
pub(crate) struct RequestHead {
    pub method: String,
    pub target: Option<String>,
    pub entries: Vec<(String, FieldValue)>,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    pub version: u8,
}

impl RequestHead {
    fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.values().next())
    }

    /// Declared body length; absent or malformed counts as zero.
    pub fn content_length(&self) -> usize {
        self.first("content-length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 requires an explicit opt-in.
    pub fn keep_alive(&self) -> bool {
        match self.first("connection") {
            Some(value) => value.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }
}

/// Attempts to parse a request head from the front of `buf`.
///
/// Returns `Ok(Some((head, len)))` once the head is complete (`len` bytes
/// including the terminating blank line), `Ok(None)` when more data is
/// needed, and an `InvalidData` error for malformed input.
pub(crate) fn parse_head(buf: &[u8]) -> io::Result<Option<(RequestHead, usize)>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut headers);

    let len = match parsed.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
    };

    let method = parsed
        .method
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "request line has no method"))?
        .to_owned();
    let target = parsed.path.map(str::to_owned);
    let version = parsed.version.unwrap_or(1);

    // Repeated header lines become repeated entries; the multimap keeps them
    // apart downstream. Non-UTF-8 header values are dropped.
    let mut entries = Vec::with_capacity(parsed.headers.len());
    for header in parsed.headers.iter() {
        if let Ok(value) = std::str::from_utf8(header.value) {
            entries.push((header.name.to_owned(), FieldValue::Single(value.to_owned())));
        }
    }

    Ok(Some((
        RequestHead {
            method,
            target,
            entries,
            version,
        },
        len,
    )))
}

/// One request's inbound side: the parsed head plus a body stream fed from
/// the connection buffer and then the socket, bounded by `Content-Length`.
pub(crate) struct Transaction<'a, S> {
    head: RequestHead,
    reader: &'a mut ReadHalf<S>,
    buffer: &'a mut BytesMut,
    remaining: usize,
}

impl<'a, S> Transaction<'a, S> {
    pub fn new(head: RequestHead, reader: &'a mut ReadHalf<S>, buffer: &'a mut BytesMut) -> Self {
        let remaining = head.content_length();
        Self {
            head,
            reader,
            buffer,
            remaining,
        }
    }

    /// Body bytes the transaction has not consumed. Non-zero after dispatch
    /// means the connection cannot be re-synchronized for a next request.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<S> IncomingTransaction for Transaction<'_, S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    fn method(&self) -> &str {
        &self.head.method
    }

    fn target(&self) -> Option<&str> {
        self.head.target.as_deref()
    }

    fn header_entries(&self) -> &[(String, FieldValue)] {
        &self.head.entries
    }

    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<io::Result<Bytes>>> + Send + '_>> {
        Box::pin(async move {
            if self.remaining == 0 {
                return None;
            }

            // Bytes read together with the head come first.
            if !self.buffer.is_empty() {
                let take = self.buffer.len().min(self.remaining);
                self.remaining -= take;
                return Some(Ok(self.buffer.split_to(take).freeze()));
            }

            // The read is capped at the declared length, so a pipelined
            // follow-up request is never consumed as body bytes.
            let mut chunk = BytesMut::with_capacity(BODY_CHUNK_SIZE.min(self.remaining));
            let mut limited = (&mut *self.reader).take(self.remaining as u64);
            match limited.read_buf(&mut chunk).await {
                Ok(0) => Some(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "request body truncated by peer",
                ))),
                Ok(n) => {
                    self.remaining -= n;
                    Some(Ok(chunk.freeze()))
                }
                Err(e) => Some(Err(e)),
            }
        })
    }
}

/// One request's outbound side over the connection's write half.
///
/// Head and body are buffered; `finish` frames the response (reason phrase,
/// `Connection`, exact `Content-Length`), writes it in one piece and
/// flushes. Repeated header names are written as repeated lines.
pub(crate) struct ConnectionSink<'a, S> {
    writer: &'a mut WriteHalf<S>,
    head: BytesMut,
    body: BytesMut,
    keep_alive: bool,
    head_written: bool,
    finished: bool,
    has_content_length: bool,
    has_connection: bool,
}

impl<'a, S> ConnectionSink<'a, S> {
    pub fn new(writer: &'a mut WriteHalf<S>, keep_alive: bool) -> Self {
        Self {
            writer,
            head: BytesMut::new(),
            body: BytesMut::new(),
            keep_alive,
            head_written: false,
            finished: false,
            has_content_length: false,
            has_connection: false,
        }
    }
}

impl<S> ResponseSink for ConnectionSink<'_, S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    fn write_head(&mut self, status: u16, headers: &[(String, FieldValue)]) -> io::Result<()> {
        if self.head_written {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "response head already written",
            ));
        }
        self.head_written = true;

        let reason = StatusCode::from_u16(status).canonical_reason();
        self.head
            .put(format!("HTTP/1.1 {status} {reason}\r\n").as_bytes());

        for (name, value) in headers {
            if name.eq_ignore_ascii_case("content-length") {
                self.has_content_length = true;
            }
            if name.eq_ignore_ascii_case("connection") {
                self.has_connection = true;
            }
            for v in value.values() {
                self.head.put(format!("{name}: {v}\r\n").as_bytes());
            }
        }
        Ok(())
    }

    fn write_chunk(
        &mut self,
        chunk: Bytes,
    ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>> {
        if !self.head_written {
            return Box::pin(async {
                Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "body chunk before response head",
                ))
            });
        }
        self.body.put(chunk);
        Box::pin(async { Ok(()) })
    }

    fn finish(&mut self) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>> {
        Box::pin(async move {
            if !self.head_written || self.finished {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "sink finalized out of order",
                ));
            }
            self.finished = true;

            if !self.has_connection {
                let connection = if self.keep_alive { "keep-alive" } else { "close" };
                self.head.put(format!("Connection: {connection}\r\n").as_bytes());
            }
            if !self.has_content_length {
                self.head
                    .put(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
            }
            self.head.put(&b"\r\n"[..]);

            self.writer.write_all(&self.head).await?;
            if !self.body.is_empty() {
                self.writer.write_all(&self.body).await?;
            }
            self.writer.flush().await
        })
    }
}
