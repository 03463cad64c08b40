//! The catch-all SPA document application.
//!
//! [`SpaHandler`] is the first-party producer side of the fallback
//! protocol: it serves area entry documents and client assets for GET
//! requests, redirects bare `/` to the canonical base, and answers
//! everything outside its domain with an unsealed 404 so the surrounding
//! host chain can take over.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use crate::area::{AreaRoute, AreaTable, is_asset_path, normalize_path};
use crate::dispatch::{AppHandler, seal};
use crate::http::{Method, Request, Response, StatusCode};

/// Serves the configured areas out of a client root directory.
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::BTreeMap;
/// use std::path::Path;
/// use std::sync::Arc;
/// use spahost::area::AreaTable;
/// use spahost::server::{Server, SpaHandler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let root = Path::new("dist/client");
///     let areas = BTreeMap::from([("/".to_owned(), "index.html".to_owned())]);
///     let table = AreaTable::build(&areas, "/", true, root)?;
///     let spa = SpaHandler::new(Arc::new(table), root);
///     Server::bind("0.0.0.0:3000").await?.run(spa).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpaHandler {
    table: Arc<AreaTable>,
    root: PathBuf,
}

impl SpaHandler {
    /// Creates a handler serving `table`'s areas from the `root` directory.
    pub fn new(table: Arc<AreaTable>, root: impl Into<PathBuf>) -> Self {
        Self {
            table,
            root: root.into(),
        }
    }

    /// Produces the response for one request.
    ///
    /// GET only — the original glue binds documents to GET, so anything else
    /// falls through. In order: the canonical-base redirect for bare `/`,
    /// area document resolution, static asset lookup for asset-like paths,
    /// and finally an unsealed 404.
    pub async fn respond(&self, request: &Request) -> Response {
        if request.method() != &Method::Get {
            return Response::new(StatusCode::NotFound);
        }

        let path = normalize_path(request.path());

        if path == "/" {
            if let Some(main) = self.table.root_redirect() {
                debug!(to = main, "redirecting bare root to canonical base");
                return Response::new(StatusCode::Found).header("Location", main);
            }
        }

        if let Some(route) = self.table.resolve(path) {
            return self.document(route).await;
        }

        if is_asset_path(path) {
            if let Some(response) = self.asset(path).await {
                return response;
            }
        }

        Response::new(StatusCode::NotFound)
    }

    /// Serves an area's entry document.
    ///
    /// The document existed when the table was built; if it has vanished
    /// since, the 404 is sealed — this path is authoritatively ours and must
    /// not be shadowed by whatever handler comes next in the chain.
    async fn document(&self, route: &AreaRoute) -> Response {
        match fs::read(self.root.join(&route.document)).await {
            Ok(bytes) => Response::new(StatusCode::Ok)
                .header("Content-Type", "text/html; charset=utf-8")
                .body_bytes(bytes),
            Err(e) => {
                warn!(document = %route.document, error = %e, "area document unreadable");
                seal(Response::new(StatusCode::NotFound))
            }
        }
    }

    /// Serves a static file under the client root, or `None` to fall
    /// through. Parent-directory segments never escape the root.
    async fn asset(&self, path: &str) -> Option<Response> {
        let relative = path.trim_start_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        let bytes = fs::read(self.root.join(relative)).await.ok()?;
        Some(
            Response::new(StatusCode::Ok)
                .header("Content-Type", mime_for(relative))
                .body_bytes(bytes),
        )
    }
}

impl AppHandler for SpaHandler {
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Response> + Send + '_>> {
        Box::pin(async move { self.respond(&request).await })
    }
}

/// Content type by file extension; unknown extensions are served as opaque
/// bytes.
fn mime_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
