//! Transaction dispatch and the cooperative fallback protocol.
//!
//! A catch-all document handler cannot know whether some other handler in
//! the host's middleware chain (API routes, dev tooling) wants a request it
//! failed to match. The fallback protocol settles this with a sentinel
//! convention on the response value:
//!
//! - status 404 with the [`FALLBACK_MARKER`] header set to the exact string
//!   `"false"` → the response is authoritative and is delivered as-is;
//! - status 404 otherwise → the response is discarded and control is ceded
//!   to the next handler ([`Dispatch::NotHandled`]);
//! - any other status → delivered.
//!
//! The marker comparison is an exact string match, not boolean-style
//! parsing: `"0"`, `"no"` and `"False"` all fall through. This is the
//! contract surface between this core and its host and is preserved
//! bit-for-bit.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::bridge::{AdaptError, IncomingTransaction, ResponseSink, SendError, adapt, send};
use crate::http::{Request, Response};

/// Response header that suppresses 404 fallthrough when set to `"false"`.
/// The name lookup is case-insensitive; the value comparison is exact.
pub const FALLBACK_MARKER: &str = "spa-server";

/// What to do with a handler's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Write the response to the sink.
    Deliver,
    /// Discard it and let the next handler in the host chain try.
    Fallthrough,
}

/// Classifies a response under the fallback protocol.
pub fn disposition(response: &Response) -> Disposition {
    if response.status().as_u16() == 404 {
        match response.headers().first(FALLBACK_MARKER) {
            Some("false") => Disposition::Deliver,
            _ => Disposition::Fallthrough,
        }
    } else {
        Disposition::Deliver
    }
}

/// Marks a 404 as authoritative: stamped responses are delivered instead of
/// falling through to the next handler.
pub fn seal(response: Response) -> Response {
    response.header(FALLBACK_MARKER, "false")
}

/// An application handler over immutable values: takes a
/// [`Request`], returns a [`Response`]. Implemented for any async closure of
/// the right shape, so plain `|request| async { … }` handlers work directly.
pub trait AppHandler: Send + Sync {
    /// Produces the response for one request.
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send + '_>>;
}

impl<T, F> AppHandler for T
where
    T: Fn(Request) -> F + Send + Sync,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send + '_>> {
        Box::pin((self)(request))
    }
}

/// Outcome of one dispatched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A response was written to the sink.
    Served,
    /// The handler ceded the request; nothing was written. The host chain
    /// decides what happens next.
    NotHandled,
}

/// Failure inside the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Adapt(#[from] AdaptError),

    #[error(transparent)]
    Send(#[from] SendError),
}

/// Drives one transaction end to end: adapt the streaming request, invoke
/// the handler, apply the fallback protocol, and either stream the response
/// out or report [`Dispatch::NotHandled`].
///
/// # Errors
///
/// [`DispatchError`] when adaptation or response streaming fails; the
/// transaction is considered failed and nothing is retried.
pub async fn dispatch<H, T, S>(
    app: &H,
    incoming: &mut T,
    sink: &mut S,
) -> Result<Dispatch, DispatchError>
where
    H: AppHandler + ?Sized,
    T: IncomingTransaction + ?Sized,
    S: ResponseSink + ?Sized,
{
    let request = adapt(incoming).await?;
    let response = app.call(request).await;
    match disposition(&response) {
        Disposition::Deliver => {
            send(response, sink).await?;
            Ok(Dispatch::Served)
        }
        Disposition::Fallthrough => Ok(Dispatch::NotHandled),
    }
}
