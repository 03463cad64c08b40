//! Route values and path classification.

/// One configured area: a normalized route prefix bound to a static entry
/// document. Constructed by [`AreaTable::build`](super::AreaTable::build)
/// and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRoute {
    /// Normalized route prefix (trailing slash stripped except for `/`).
    pub path: String,
    /// The entry document, relative to the client root as configured.
    pub document: String,
    /// Whether this area corresponds to the configured base path. Exactly
    /// one route in a table is main.
    pub is_main: bool,
    /// Parent directory of the document: empty for a root-level document,
    /// otherwise `/`-prefixed (`"admin/index.html"` → `"/admin"`).
    pub dir: String,
    /// Whether prefix matching extends to all sub-paths (history-mode
    /// client routing), either declared per-route or enabled globally.
    pub wildcard: bool,
}

impl AreaRoute {
    /// Number of non-empty path segments; used for precedence ordering.
    pub(crate) fn segment_count(&self) -> usize {
        segment_count(&self.path)
    }
}

pub(crate) fn segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Derives the `dir` field from a configured document path.
pub(crate) fn parent_dir(document: &str) -> String {
    match document.rsplit_once('/') {
        Some((parent, _)) => format!("/{parent}"),
        None => String::new(),
    }
}

/// Normalizes a request path for matching: the query string (everything
/// from the first `?`) is dropped, and a single trailing slash is stripped
/// unless the path is exactly `/`. Normalizing an already-normalized path
/// returns it unchanged.
///
/// # Examples
///
/// ```
/// use spahost::area::normalize_path;
///
/// assert_eq!(normalize_path("/about/?tab=1"), "/about");
/// assert_eq!(normalize_path("/about"), "/about");
/// assert_eq!(normalize_path("/"), "/");
/// ```
pub fn normalize_path(path: &str) -> &str {
    let path = match path.find('?') {
        Some(query) => &path[..query],
        None => path,
    };
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Returns `true` for paths that name an asset rather than a navigable
/// document: any segment carrying the `@` marker (dev-server virtual
/// modules) or a file extension in the final segment. Asset-like paths are
/// never resolved to an area document; they fall through to static file
/// serving.
///
/// # Examples
///
/// ```
/// use spahost::area::is_asset_path;
///
/// assert!(is_asset_path("/assets/logo.png"));
/// assert!(is_asset_path("/@vite/client"));
/// assert!(!is_asset_path("/about"));
/// ```
pub fn is_asset_path(path: &str) -> bool {
    let mut last = None;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('@') {
            return true;
        }
        last = Some(segment);
    }
    last.is_some_and(|s| s.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query() {
        assert_eq!(normalize_path("/shop?item=3"), "/shop");
        assert_eq!(normalize_path("/?x=1"), "/");
    }

    #[test]
    fn normalize_strips_single_trailing_slash() {
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("/a/b/"), "/a/b");
    }

    #[test]
    fn normalize_keeps_root() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn normalize_is_idempotent() {
        for p in ["/", "/about", "/a/b", "/x"] {
            assert_eq!(normalize_path(normalize_path(p)), normalize_path(p));
        }
    }

    #[test]
    fn asset_detection_by_extension() {
        assert!(is_asset_path("/main.js"));
        assert!(is_asset_path("/assets/app.v2.css"));
        assert!(!is_asset_path("/about"));
        assert!(!is_asset_path("/"));
    }

    #[test]
    fn asset_detection_by_marker_segment() {
        assert!(is_asset_path("/@vite/client"));
        assert!(is_asset_path("/app/@fs/tmp/mod"));
        assert!(!is_asset_path("/email@handle")); // `@` not at segment start
    }

    #[test]
    fn extension_only_counts_in_last_segment() {
        assert!(!is_asset_path("/v2.0/settings"));
        assert!(is_asset_path("/v2.0/app.wasm"));
    }

    #[test]
    fn parent_dir_derivation() {
        assert_eq!(parent_dir("index.html"), "");
        assert_eq!(parent_dir("admin/index.html"), "/admin");
        assert_eq!(parent_dir("a/b/entry.html"), "/a/b");
    }

    #[test]
    fn segment_counting() {
        assert_eq!(segment_count("/"), 0);
        assert_eq!(segment_count("/a"), 1);
        assert_eq!(segment_count("/a/b/c"), 3);
    }
}
