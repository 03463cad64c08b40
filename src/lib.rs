//! # spahost
//!
//! A multi-area single-page-application server core: the HTTP transaction
//! bridge, the area route resolver, the cooperative fallback protocol, and
//! a tokio TCP host to run them.
//!
//! An *area* is one independent SPA entry point bound to a route prefix and
//! a static index document. spahost decides which area answers an inbound
//! path (with history-mode wildcards, asset/document disambiguation, and
//! canonical-base redirection), converts the host's streaming
//! request/response pair into immutable values and back, and lets a
//! catch-all document handler cooperate with a surrounding middleware chain
//! through a sentinel-header convention on 404s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use spahost::area::AreaTable;
//! use spahost::server::{Server, SpaHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Path::new("dist/client");
//!     let areas = BTreeMap::from([
//!         ("/".to_owned(), "index.html".to_owned()),
//!         ("/admin".to_owned(), "admin/index.html".to_owned()),
//!     ]);
//!     let table = AreaTable::build(&areas, "/", true, root)?;
//!     let server = Server::bind("127.0.0.1:3000").await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server.run(SpaHandler::new(Arc::new(table), root)).await?;
//!     Ok(())
//! }
//! ```
//!
//! Plain async closures work as handlers too — anything that takes an
//! immutable [`Request`](http::Request) and returns an immutable
//! [`Response`](http::Response):
//!
//! ```rust,no_run
//! # use spahost::http::{Request, Response, StatusCode};
//! # async fn demo(server: spahost::server::Server) -> Result<(), spahost::server::ServerError> {
//! server
//!     .run(|req: Request| async move {
//!         Response::new(StatusCode::Ok).body(format!("you asked for {}", req.path()))
//!     })
//!     .await
//! # }
//! ```

pub mod area;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use area::{AreaRoute, AreaTable, SharedAreaTable};
pub use config::ServerOptions;
pub use dispatch::{AppHandler, Dispatch, Disposition, FALLBACK_MARKER};
pub use http::{Body, FieldValue, Headers, Method, Request, Response, StatusCode};
pub use server::{Server, ServerError, SpaHandler};
