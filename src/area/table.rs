//! Route table construction, precedence ordering and path matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use super::route::{AreaRoute, is_asset_path, normalize_path, parent_dir};

/// Configuration failure while building an area table. All variants are
/// fatal: a malformed configuration aborts startup before any request is
/// served, it is never skipped over.
#[derive(Debug, Error)]
pub enum AreaConfigError {
    #[error("area pattern `{pattern}` must start with `/`")]
    InvalidPattern { pattern: String },

    #[error("area path `{path}` is configured more than once")]
    DuplicateRoute { path: String },

    #[error("area document `{document}` does not exist under {}", root.display())]
    MissingDocument { document: String, root: PathBuf },

    #[error("no area matches the configured base path `{base}`")]
    NoMainArea { base: String },
}

/// The immutable area route table.
///
/// Built once from configuration, sorted into matching precedence (segment
/// count descending, then path length descending, so `/blog/post` is tried
/// before `/blog`), and shared read-only across all concurrent requests.
///
/// # Examples
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use std::path::Path;
/// use spahost::area::AreaTable;
///
/// let areas = BTreeMap::from([
///     ("/".to_owned(), "index.html".to_owned()),
///     ("/admin".to_owned(), "admin/index.html".to_owned()),
/// ]);
/// let table = AreaTable::build(&areas, "/", true, Path::new("dist/client"))?;
/// assert!(table.resolve("/admin/users").is_some());
/// # Ok::<(), spahost::area::AreaConfigError>(())
/// ```
#[derive(Debug)]
pub struct AreaTable {
    routes: Vec<AreaRoute>,
    main: usize,
}

impl AreaTable {
    /// Builds a table from the configured `pattern → document` map.
    ///
    /// Patterns may carry a `/*` suffix to declare an explicit wildcard;
    /// `history_mode` makes every route a wildcard regardless. Paths are
    /// normalized before uniqueness is checked, every document must exist
    /// under `root` at build time, and the route whose normalized path
    /// equals the normalized `base` becomes the main route. An empty map
    /// synthesizes the single default area `base → index.html`.
    ///
    /// # Errors
    ///
    /// [`AreaConfigError`] on a relative pattern, a duplicate normalized
    /// path, a document missing on disk, or a base path with no matching
    /// area.
    pub fn build(
        areas: &BTreeMap<String, String>,
        base: &str,
        history_mode: bool,
        root: &Path,
    ) -> Result<Self, AreaConfigError> {
        let base = normalize_path(base).to_owned();

        let default_area;
        let configured: Vec<(&str, &str)> = if areas.is_empty() {
            default_area = (base.clone(), "index.html".to_owned());
            vec![(default_area.0.as_str(), default_area.1.as_str())]
        } else {
            areas
                .iter()
                .map(|(p, d)| (p.as_str(), d.as_str()))
                .collect()
        };

        let mut routes: Vec<AreaRoute> = Vec::with_capacity(configured.len());
        for (pattern, document) in configured {
            let (raw, explicit_wildcard) = match pattern.strip_suffix("/*") {
                Some("") => ("/", true),
                Some(prefix) => (prefix, true),
                None => (pattern, false),
            };
            if !raw.starts_with('/') {
                return Err(AreaConfigError::InvalidPattern {
                    pattern: pattern.to_owned(),
                });
            }

            let path = normalize_path(raw).to_owned();
            if routes.iter().any(|r| r.path == path) {
                return Err(AreaConfigError::DuplicateRoute { path });
            }

            if !root.join(document).is_file() {
                return Err(AreaConfigError::MissingDocument {
                    document: document.to_owned(),
                    root: root.to_owned(),
                });
            }

            routes.push(AreaRoute {
                is_main: path == base,
                dir: parent_dir(document),
                wildcard: explicit_wildcard || history_mode,
                document: document.to_owned(),
                path,
            });
        }

        // Deeper and longer prefixes match first.
        routes.sort_by(|a, b| {
            (b.segment_count(), b.path.len()).cmp(&(a.segment_count(), a.path.len()))
        });

        let main = routes
            .iter()
            .position(|r| r.is_main)
            .ok_or(AreaConfigError::NoMainArea { base })?;

        Ok(Self { routes, main })
    }

    /// Resolves a request path to an area route, or `None` when no area is
    /// responsible for it (asset-like paths and genuinely unmatched paths).
    ///
    /// The path is normalized, asset-like paths are excluded outright, and
    /// the table is walked in precedence order: a route wins on an exact
    /// match, or — for non-root wildcard routes — on a prefix match.
    /// Resolution is a pure function of the table and the path.
    pub fn resolve(&self, request_path: &str) -> Option<&AreaRoute> {
        let path = normalize_path(request_path);
        if is_asset_path(path) {
            return None;
        }
        self.routes.iter().find(|route| {
            path == route.path
                || (route.path != "/" && route.wildcard && path.starts_with(&route.path))
        })
    }

    /// The main route (the one aligned with the configured base path).
    pub fn main(&self) -> &AreaRoute {
        &self.routes[self.main]
    }

    /// Where bare `/` must redirect to keep a single canonical entry point:
    /// `Some(main path)` when the main route is not rooted at `/`, `None`
    /// otherwise.
    pub fn root_redirect(&self) -> Option<&str> {
        let main = self.main();
        (main.path != "/").then_some(main.path.as_str())
    }

    /// All routes in matching precedence order.
    pub fn routes(&self) -> &[AreaRoute] {
        &self.routes
    }
}

/// A shared handle to the current area table.
///
/// Readers take a cheap [`Arc`] snapshot; a configuration reload builds a
/// fresh table and swaps the reference wholesale, so no reader ever sees a
/// partially updated table. The table itself is never mutated in place.
#[derive(Debug)]
pub struct SharedAreaTable {
    current: ArcSwap<AreaTable>,
}

impl SharedAreaTable {
    /// Wraps an initial table.
    pub fn new(table: AreaTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Returns a snapshot of the current table.
    pub fn load(&self) -> Arc<AreaTable> {
        self.current.load_full()
    }

    /// Atomically replaces the table.
    pub fn replace(&self, table: AreaTable) {
        self.current.store(Arc::new(table));
    }
}

impl From<AreaTable> for SharedAreaTable {
    fn from(table: AreaTable) -> Self {
        Self::new(table)
    }
}
