//! Server options: the configuration surface consumed once at startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::area::{AreaConfigError, AreaTable};
use crate::server::binding::{self, ServerBinding};

/// Default listen port when none is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Listen port configuration: one port for everything, or separate dev and
/// prod ports.
///
/// ```
/// use spahost::config::ServerOptions;
///
/// let opts = ServerOptions::from_json(r#"{ "port": { "dev": 5173, "prod": 8080 } }"#).unwrap();
/// assert_eq!(opts.port.dev(), 5173);
/// assert_eq!(opts.port.prod(), 8080);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortConfig {
    /// The same port everywhere.
    Fixed(u16),
    /// Separate ports per environment; missing entries fall back to the
    /// default.
    Split {
        dev: Option<u16>,
        prod: Option<u16>,
    },
}

impl PortConfig {
    /// Port for the development server.
    pub fn dev(&self) -> u16 {
        match self {
            PortConfig::Fixed(port) => *port,
            PortConfig::Split { dev, .. } => dev.unwrap_or(DEFAULT_PORT),
        }
    }

    /// Port for the production bootstrap.
    pub fn prod(&self) -> u16 {
        match self {
            PortConfig::Fixed(port) => *port,
            PortConfig::Split { prod, .. } => prod.unwrap_or(DEFAULT_PORT),
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig::Fixed(DEFAULT_PORT)
    }
}

/// Client-side routing style. `Browser` (HTML5 history) is the default and
/// turns every area route into a wildcard; `Hash` and `None` leave wildcard
/// matching to per-route `/*` declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterType {
    Hash,
    #[default]
    Browser,
    None,
}

/// Options for the SPA server.
///
/// Deserializes from JSON with camelCase keys; every field has a default so
/// partial configurations work. Build-pipeline concerns (bundler entry
/// points, output layout) are not part of this surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerOptions {
    /// Listen port(s).
    pub port: PortConfig,
    /// Which server binding drives transactions and renders launch scripts.
    pub server_type: String,
    /// `route pattern → entry document` map; a `/*` suffix on a pattern
    /// declares an explicit wildcard. Empty means one default area.
    pub area: BTreeMap<String, String>,
    /// Base URL path the application is served under.
    pub base: String,
    /// Directory containing the built client files.
    pub client_dir: String,
    /// Client-side routing style.
    pub router_type: RouterType,
    /// Whether generated launch scripts start listening on their own.
    pub start_server: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: PortConfig::default(),
            server_type: "standalone".to_owned(),
            area: BTreeMap::new(),
            base: "/".to_owned(),
            client_dir: "client".to_owned(),
            router_type: RouterType::default(),
            start_server: true,
        }
    }
}

/// The configured `serverType` names no registered binding.
#[derive(Debug, Error)]
#[error("unknown server type `{name}`")]
pub struct UnknownServerType {
    pub name: String,
}

impl ServerOptions {
    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether history-mode routing is globally enabled.
    pub fn history_mode(&self) -> bool {
        self.router_type == RouterType::Browser
    }

    /// Builds the immutable area table for these options, with documents
    /// validated against `root`.
    pub fn build_table(&self, root: &Path) -> Result<AreaTable, AreaConfigError> {
        AreaTable::build(&self.area, &self.base, self.history_mode(), root)
    }

    /// Looks the configured server type up in the binding registry.
    pub fn resolve_binding(&self) -> Result<&'static dyn ServerBinding, UnknownServerType> {
        binding::builtin(&self.server_type).ok_or_else(|| UnknownServerType {
            name: self.server_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ServerOptions::default();
        assert_eq!(opts.port.dev(), 3000);
        assert_eq!(opts.server_type, "standalone");
        assert_eq!(opts.base, "/");
        assert_eq!(opts.client_dir, "client");
        assert!(opts.history_mode());
        assert!(opts.start_server);
    }

    #[test]
    fn empty_json_is_all_defaults() {
        let opts = ServerOptions::from_json("{}").unwrap();
        assert_eq!(opts.port, PortConfig::Fixed(3000));
        assert!(opts.area.is_empty());
    }

    #[test]
    fn fixed_port_from_number() {
        let opts = ServerOptions::from_json(r#"{ "port": 8080 }"#).unwrap();
        assert_eq!(opts.port.dev(), 8080);
        assert_eq!(opts.port.prod(), 8080);
    }

    #[test]
    fn split_port_fills_missing_side_with_default() {
        let opts = ServerOptions::from_json(r#"{ "port": { "prod": 8080 } }"#).unwrap();
        assert_eq!(opts.port.dev(), 3000);
        assert_eq!(opts.port.prod(), 8080);
    }

    #[test]
    fn camel_case_keys() {
        let opts = ServerOptions::from_json(
            r#"{
                "serverType": "passthrough",
                "clientDir": "dist/client",
                "routerType": "hash",
                "startServer": false,
                "area": { "/": "index.html", "/admin": "admin/index.html" },
                "base": "/admin"
            }"#,
        )
        .unwrap();
        assert_eq!(opts.server_type, "passthrough");
        assert_eq!(opts.client_dir, "dist/client");
        assert_eq!(opts.router_type, RouterType::Hash);
        assert!(!opts.history_mode());
        assert!(!opts.start_server);
        assert_eq!(opts.area.len(), 2);
        assert_eq!(opts.base, "/admin");
    }

    #[test]
    fn resolve_binding_by_name() {
        let opts = ServerOptions::default();
        assert_eq!(opts.resolve_binding().unwrap().name(), "standalone");

        let unknown = ServerOptions {
            server_type: "zeppelin".to_owned(),
            ..Default::default()
        };
        assert_eq!(unknown.resolve_binding().unwrap_err().name, "zeppelin");
    }

    #[test]
    fn build_table_uses_router_type_for_wildcards() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "x").unwrap();

        let opts = ServerOptions::from_json(r#"{ "area": { "/": "index.html" } }"#).unwrap();
        let table = opts.build_table(dir.path()).unwrap();
        assert!(table.routes()[0].wildcard);

        let hash = ServerOptions::from_json(
            r#"{ "area": { "/": "index.html" }, "routerType": "hash" }"#,
        )
        .unwrap();
        let table = hash.build_table(dir.path()).unwrap();
        assert!(!table.routes()[0].wildcard);
    }
}
