//! Async TCP host built on Tokio.
//!
//! Accepts connections and drives each HTTP/1.1 request through the
//! transaction pipeline: the native streaming layer ([`conn`]) feeds the
//! bridge, the application handler produces an immutable response, and the
//! fallback protocol decides whether it is written or the request is
//! answered with the host's chain-end 404. Persistent connections
//! (keep-alive) are supported out of the box.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::bridge::send;
use crate::dispatch::{AppHandler, Dispatch, dispatch};
use crate::http::{Response, StatusCode};

pub mod binding;
pub(crate) mod conn;
pub mod spa;

pub use spa::SpaHandler;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Maximum size of a request head we will buffer before rejecting it.
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The spahost TCP server.
///
/// Binds to an address and dispatches every request to an application
/// handler over immutable values — any async closure
/// `Fn(Request) -> Future<Response>` or a [`SpaHandler`].
///
/// # Examples
///
/// ```rust,no_run
/// use spahost::http::{Request, Response, StatusCode};
/// use spahost::server::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     println!("Listening on http://{}", server.local_addr());
///     server
///         .run(|_req: Request| async { Response::new(StatusCode::Ok).body("Hello!") })
///         .await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests to `app`.
    ///
    /// The handler is shared across all spawned Tokio tasks. When it cedes a
    /// request under the fallback protocol and no further handler exists —
    /// this server is the end of the chain — the request is answered with a
    /// plain 404.
    ///
    /// Runs until the process is terminated or the listener itself fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener fails.
    pub async fn run<H>(self, app: H) -> Result<(), ServerError>
    where
        H: AppHandler + 'static,
    {
        let app = Arc::new(app);
        info!(address = %self.local_addr, "spahost listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let app = Arc::clone(&app);

            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, peer_addr, app).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Serves one connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: one request per
/// iteration until the peer closes, opts out of keep-alive, or leaves body
/// bytes the pipeline did not drain (at which point the stream cannot be
/// re-synchronized and is closed).
pub(crate) async fn serve_connection<S, H>(
    stream: S,
    peer_addr: SocketAddr,
    app: Arc<H>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    H: AppHandler + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Read until a complete request head is buffered.
        let (head, head_len) = loop {
            match conn::parse_head(&buf) {
                Ok(Some(parsed)) => break parsed,
                Ok(None) => {}
                Err(e) => {
                    warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                    let mut sink = conn::ConnectionSink::new(&mut writer, false);
                    let response = Response::new(StatusCode::BadRequest).body("Bad Request");
                    let _ = send(response, &mut sink).await;
                    return Ok(());
                }
            }

            if buf.len() > MAX_HEAD_SIZE {
                warn!(peer = %peer_addr, "request head too large — sending 431");
                let mut sink = conn::ConnectionSink::new(&mut writer, false);
                let response = Response::new(StatusCode::RequestHeaderFieldsTooLarge)
                    .body("Request Header Fields Too Large");
                let _ = send(response, &mut sink).await;
                return Ok(());
            }

            if reader.read_buf(&mut buf).await? == 0 {
                if !buf.is_empty() {
                    debug!(peer = %peer_addr, "connection closed mid-request");
                }
                return Ok(());
            }
        };
        buf.advance(head_len);

        let keep_alive = head.keep_alive();
        debug!(
            peer = %peer_addr,
            method = %head.method,
            path = head.target.as_deref().unwrap_or("/"),
            "dispatching transaction"
        );

        let mut tx = conn::Transaction::new(head, &mut reader, &mut buf);
        let mut sink = conn::ConnectionSink::new(&mut writer, keep_alive);

        match dispatch(app.as_ref(), &mut tx, &mut sink).await {
            Ok(Dispatch::Served) => {}
            Ok(Dispatch::NotHandled) => {
                // End of the host chain: nobody else gets a try.
                let response = Response::new(StatusCode::NotFound).body("Not Found");
                send(response, &mut sink).await.map_err(io::Error::other)?;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "transaction failed");
                return Ok(());
            }
        }

        let undrained = tx.remaining();
        if !keep_alive || undrained > 0 {
            if undrained > 0 {
                debug!(peer = %peer_addr, undrained, "request body not drained — closing");
            }
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn peer() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    async fn roundtrip<H>(app: H, raw: &[u8]) -> String
    where
        H: AppHandler + 'static,
    {
        let (mut client, server_side) = tokio::io::duplex(16 * 1024);
        let task = tokio::spawn(serve_connection(server_side, peer(), Arc::new(app)));

        client.write_all(raw).await.unwrap();
        client.shutdown().await.unwrap();

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn serves_a_get_request() {
        let app = |req: Request| async move {
            Response::new(StatusCode::Ok).body(format!("path={}", req.path()))
        };
        let wire = roundtrip(
            app,
            b"GET /hello HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.ends_with("path=/hello"));
    }

    #[tokio::test]
    async fn request_url_is_absolute() {
        let app = |req: Request| async move { Response::new(StatusCode::Ok).body(req.url().to_owned()) };
        let wire = roundtrip(
            app,
            b"GET /a?b=1 HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(wire.ends_with("http://example.com/a?b=1"));
    }

    #[tokio::test]
    async fn post_body_reaches_the_handler_intact() {
        let app = |req: Request| async move {
            let body = req.body().cloned().unwrap_or_default();
            Response::new(StatusCode::Ok).body_bytes(body)
        };
        let wire = roundtrip(
            app,
            b"POST /echo HTTP/1.1\r\nHost: x\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhello world",
        )
        .await;
        assert!(wire.ends_with("\r\n\r\nhello world"));
    }

    #[tokio::test]
    async fn unhandled_request_gets_chain_end_404() {
        let app = |_req: Request| async { Response::new(StatusCode::NotFound) };
        let wire = roundtrip(
            app,
            b"GET /nowhere HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(wire.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(wire.ends_with("Not Found"));
    }

    #[tokio::test]
    async fn repeated_set_cookie_headers_survive_to_the_wire() {
        let app = |_req: Request| async {
            Response::new(StatusCode::Ok)
                .header("Set-Cookie", "a=1")
                .header("Set-Cookie", "b=2")
        };
        let wire = roundtrip(
            app,
            b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(wire.contains("Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n"));
    }

    #[tokio::test]
    async fn keep_alive_serves_pipelined_requests() {
        let app = |req: Request| async move {
            Response::new(StatusCode::Ok).body(format!("got {}", req.path()))
        };
        let wire = roundtrip(
            app,
            b"GET /one HTTP/1.1\r\nHost: x\r\n\r\nGET /two HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(wire.contains("got /one"));
        assert!(wire.contains("got /two"));
    }

    #[tokio::test]
    async fn malformed_request_gets_400() {
        let app = |_req: Request| async { Response::new(StatusCode::Ok) };
        let wire = roundtrip(app, b"\x01\x02garbage\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn bind_reports_address_errors() {
        let err = Server::bind("definitely-not-an-address").await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
