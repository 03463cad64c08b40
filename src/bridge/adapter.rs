//! Streaming request → immutable request value.

use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::http::{FieldValue, Headers, Method, Request};

/// Scheme assumed when the host supplied no forwarding header.
pub const DEFAULT_SCHEME: &str = "http";

/// Authority assumed when the transaction carries no `Host` header.
pub const DEFAULT_HOST: &str = "localhost:3000";

/// The inbound half of a host transaction: a streaming request as the
/// hosting runtime's native HTTP layer presents it.
///
/// Header entries may be array-valued ([`FieldValue::Multi`]) when the host
/// collection stores several values under one name; the adapter appends each
/// element individually. The body is a finite chunk stream that can be
/// consumed exactly once — implementations are not required to support a
/// second pass, and the adapter never attempts one.
///
/// Futures are boxed so the trait stays object-safe; hosts with concrete
/// transaction types pay nothing extra at the call sites that matter.
pub trait IncomingTransaction: Send {
    /// The request method, as the host received it.
    fn method(&self) -> &str;

    /// The raw request target (path plus optional query), if any.
    fn target(&self) -> Option<&str>;

    /// Every header entry, in arrival order.
    fn header_entries(&self) -> &[(String, FieldValue)];

    /// The next body chunk, `None` at end of stream.
    fn next_chunk(&mut self)
    -> Pin<Box<dyn Future<Output = Option<io::Result<Bytes>>> + Send + '_>>;
}

/// Failure while adapting a streaming transaction.
#[derive(Debug, Error)]
pub enum AdaptError {
    /// The inbound body stream failed mid-read. The transaction is aborted;
    /// no partial request value is produced.
    #[error("failed to read the request body stream")]
    BodyRead(#[source] io::Error),
}

/// Converts a streaming transaction into an immutable [`Request`].
///
/// The absolute URL is assembled from the `x-forwarded-proto` header
/// (default `http`), the `Host` header (default `localhost:3000`), and the
/// raw target (default `/`). Every header entry is copied into the multimap;
/// array-valued entries are appended element-wise so repetition semantics
/// survive. For methods other than GET/HEAD the entire body stream is
/// buffered into one contiguous byte sequence before returning; for GET and
/// HEAD the stream is never touched.
///
/// # Errors
///
/// [`AdaptError::BodyRead`] if the body stream fails; the error carries the
/// underlying cause and the whole adaptation is abandoned.
pub async fn adapt<T>(incoming: &mut T) -> Result<Request, AdaptError>
where
    T: IncomingTransaction + ?Sized,
{
    let method = Method::from(incoming.method());

    let mut headers = Headers::new();
    for (name, value) in incoming.header_entries() {
        for v in value.values() {
            headers.append(name.as_str(), v);
        }
    }

    let url = {
        let scheme = headers.first("x-forwarded-proto").unwrap_or(DEFAULT_SCHEME);
        let host = headers.first("host").unwrap_or(DEFAULT_HOST);
        let target = incoming.target().filter(|t| !t.is_empty()).unwrap_or("/");
        format!("{scheme}://{host}{target}")
    };

    let body = if method.bodyless() {
        None
    } else {
        let mut buf = BytesMut::new();
        while let Some(chunk) = incoming.next_chunk().await {
            let chunk = chunk.map_err(AdaptError::BodyRead)?;
            buf.extend_from_slice(&chunk);
        }
        Some(buf.freeze())
    };

    Ok(Request::new(method, url, headers, body))
}
