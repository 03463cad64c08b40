//! Immutable response value → streaming response sink.

use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use thiserror::Error;

use crate::http::{FieldValue, Response};

/// The outbound half of a host transaction: a writable sink that accepts a
/// status line and headers, then body chunks, then a single finalization.
///
/// `write_head` takes the flattened header representation — scalar values
/// for names seen once, ordered lists for repeated names — and must be
/// called before any chunk. Implementations that buffer the head until the
/// first flush satisfy the ordering requirement trivially.
pub trait ResponseSink: Send {
    /// Records status and headers. Must precede every chunk write.
    fn write_head(&mut self, status: u16, headers: &[(String, FieldValue)]) -> io::Result<()>;

    /// Writes one body chunk.
    fn write_chunk(&mut self, chunk: Bytes)
    -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>>;

    /// Signals end-of-response. Called exactly once, after all chunks.
    fn finish(&mut self) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>>;
}

/// Failure while streaming a response into a sink.
///
/// Chunks already flushed stay flushed; there is no transactional guarantee
/// on partial streaming.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to write the response head")]
    Head(#[source] io::Error),

    #[error("failed to read from the response body stream")]
    BodyRead(#[source] io::Error),

    #[error("failed to write a response body chunk")]
    Write(#[source] io::Error),

    #[error("failed to finalize the response sink")]
    Finish(#[source] io::Error),
}

/// Streams an immutable [`Response`] into a sink.
///
/// The header multimap is flattened (single-valued names stay scalar,
/// repeated names become ordered lists), the head is written before any
/// body byte, chunks go out in arrival order, and the sink is finalized
/// exactly once — also when there is no body at all.
///
/// # Errors
///
/// Any I/O failure — reading the body stream or writing to the sink — is
/// surfaced immediately as a [`SendError`]; nothing is retried.
pub async fn send<S>(response: Response, sink: &mut S) -> Result<(), SendError>
where
    S: ResponseSink + ?Sized,
{
    let (status, headers, mut body) = response.into_parts();

    sink.write_head(status.as_u16(), &headers.flatten())
        .map_err(SendError::Head)?;

    while let Some(chunk) = body.next_chunk().await {
        let chunk = chunk.map_err(SendError::BodyRead)?;
        sink.write_chunk(chunk).await.map_err(SendError::Write)?;
    }

    sink.finish().await.map_err(SendError::Finish)
}
