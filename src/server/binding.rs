//! Server bindings: named dispatch strategies plus deployment glue text.
//!
//! A binding bundles the two operations a host integration needs: drive
//! one transaction through an application handler, and render the launch
//! script that boots a built application. Builtins live in a static
//! registry and are selected by name; a custom implementation substitutes
//! directly wherever a `&dyn ServerBinding` is accepted.

use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

use crate::area::AreaRoute;
use crate::bridge::{IncomingTransaction, ResponseSink, adapt, send};
use crate::dispatch::{AppHandler, Dispatch, DispatchError, dispatch};

/// Inputs for launch-script rendering: the area table as plain data plus
/// the deployment knobs the template needs.
#[derive(Debug)]
pub struct ScriptOptions<'a> {
    pub port: u16,
    pub client_dir: &'a str,
    pub areas: &'a [AreaRoute],
    pub start_server: bool,
}

/// A named host integration.
pub trait ServerBinding: Send + Sync + std::fmt::Debug {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Renders the bootstrap source for a built application.
    fn launch_script(&self, script: &ScriptOptions<'_>) -> String;

    /// Drives one transaction through `app`.
    fn handle<'a>(
        &'a self,
        app: &'a dyn AppHandler,
        incoming: &'a mut dyn IncomingTransaction,
        sink: &'a mut dyn ResponseSink,
    ) -> Pin<Box<dyn Future<Output = Result<Dispatch, DispatchError>> + Send + 'a>>;
}

/// The bridged pipeline with the fallback protocol: unsealed 404s cede the
/// request to the host chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standalone;

impl ServerBinding for Standalone {
    fn name(&self) -> &'static str {
        "standalone"
    }

    fn launch_script(&self, script: &ScriptOptions<'_>) -> String {
        let mut out = String::new();
        let base = main_path(script.areas);

        push_header(&mut out, "standalone", script.start_server);
        let _ = writeln!(out, "    let root = Path::new({:?});", script.client_dir);
        let _ = writeln!(out, "    let mut areas = BTreeMap::new();");
        for route in script.areas {
            let _ = writeln!(
                out,
                "    areas.insert({:?}.to_owned(), {:?}.to_owned());",
                route_pattern(route),
                route.document,
            );
        }
        let _ = writeln!(
            out,
            "    let table = AreaTable::build(&areas, {base:?}, false, root)?;"
        );
        let _ = writeln!(out, "    let app = SpaHandler::new(Arc::new(table), root);");
        push_footer(&mut out, script);
        out
    }

    fn handle<'a>(
        &'a self,
        app: &'a dyn AppHandler,
        incoming: &'a mut dyn IncomingTransaction,
        sink: &'a mut dyn ResponseSink,
    ) -> Pin<Box<dyn Future<Output = Result<Dispatch, DispatchError>> + Send + 'a>> {
        Box::pin(dispatch(app, incoming, sink))
    }
}

/// The direct pipeline: every handler response is delivered as-is, with no
/// fallback interception.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ServerBinding for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn launch_script(&self, script: &ScriptOptions<'_>) -> String {
        let mut out = String::new();
        let base = main_path(script.areas);
        let document = script
            .areas
            .iter()
            .find(|r| r.is_main)
            .map(|r| r.document.as_str())
            .unwrap_or("index.html");

        push_header(&mut out, "passthrough", script.start_server);
        let _ = writeln!(out, "    let root = Path::new({:?});", script.client_dir);
        let _ = writeln!(out, "    let mut areas = BTreeMap::new();");
        let _ = writeln!(
            out,
            "    areas.insert({base:?}.to_owned(), {document:?}.to_owned());"
        );
        let _ = writeln!(
            out,
            "    let table = AreaTable::build(&areas, {base:?}, true, root)?;"
        );
        let _ = writeln!(out, "    let app = SpaHandler::new(Arc::new(table), root);");
        push_footer(&mut out, script);
        out
    }

    fn handle<'a>(
        &'a self,
        app: &'a dyn AppHandler,
        incoming: &'a mut dyn IncomingTransaction,
        sink: &'a mut dyn ResponseSink,
    ) -> Pin<Box<dyn Future<Output = Result<Dispatch, DispatchError>> + Send + 'a>> {
        Box::pin(async move {
            let request = adapt(incoming).await?;
            let response = app.call(request).await;
            send(response, sink).await?;
            Ok(Dispatch::Served)
        })
    }
}

static REGISTRY: [&'static dyn ServerBinding; 2] = [&Standalone, &Passthrough];

/// Looks a builtin binding up by name.
pub fn builtin(name: &str) -> Option<&'static dyn ServerBinding> {
    REGISTRY.into_iter().find(|b| b.name() == name)
}

/// Names of all builtin bindings, in registry order.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|b| b.name())
}

/// Reconstructs the configuration pattern for a route: wildcards get their
/// `/*` suffix back so the rendered table builds identically.
fn route_pattern(route: &AreaRoute) -> String {
    if route.wildcard {
        if route.path == "/" {
            "/*".to_owned()
        } else {
            format!("{}/*", route.path)
        }
    } else {
        route.path.clone()
    }
}

fn main_path(areas: &[AreaRoute]) -> &str {
    areas
        .iter()
        .find(|r| r.is_main)
        .map(|r| r.path.as_str())
        .unwrap_or("/")
}

fn push_header(out: &mut String, flavor: &str, start_server: bool) {
    let _ = writeln!(out, "//! Generated by spahost — {flavor} server bootstrap.");
    let _ = writeln!(out);
    let _ = writeln!(out, "use std::collections::BTreeMap;");
    let _ = writeln!(out, "use std::path::Path;");
    let _ = writeln!(out, "use std::sync::Arc;");
    let _ = writeln!(out);
    let _ = writeln!(out, "use spahost::area::AreaTable;");
    if start_server {
        let _ = writeln!(out, "use spahost::server::{{Server, SpaHandler}};");
        let _ = writeln!(out);
        let _ = writeln!(out, "#[tokio::main]");
        let _ = writeln!(
            out,
            "async fn main() -> Result<(), Box<dyn std::error::Error>> {{"
        );
    } else {
        let _ = writeln!(out, "use spahost::server::SpaHandler;");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "pub fn app() -> Result<SpaHandler, Box<dyn std::error::Error>> {{"
        );
    }
}

fn push_footer(out: &mut String, script: &ScriptOptions<'_>) {
    if script.start_server {
        let _ = writeln!(
            out,
            "    let server = Server::bind(\"0.0.0.0:{}\").await?;",
            script.port
        );
        let _ = writeln!(
            out,
            "    println!(\"Running on port {}\");",
            script.port
        );
        let _ = writeln!(out, "    server.run(app).await?;");
        let _ = writeln!(out, "    Ok(())");
    } else {
        let _ = writeln!(out, "    Ok(app)");
    }
    let _ = writeln!(out, "}}");
}

#[cfg(test)]
mod tests {
    use std::io;

    use bytes::Bytes;

    use super::*;
    use crate::http::{FieldValue, Request, Response, StatusCode};

    fn routes() -> Vec<AreaRoute> {
        vec![
            AreaRoute {
                path: "/admin".to_owned(),
                document: "admin/index.html".to_owned(),
                is_main: false,
                dir: "/admin".to_owned(),
                wildcard: true,
            },
            AreaRoute {
                path: "/".to_owned(),
                document: "index.html".to_owned(),
                is_main: true,
                dir: String::new(),
                wildcard: false,
            },
        ]
    }

    fn options(areas: &[AreaRoute], start_server: bool) -> ScriptOptions<'_> {
        ScriptOptions {
            port: 8080,
            client_dir: "client",
            areas,
            start_server,
        }
    }

    struct StubTransaction;

    impl IncomingTransaction for StubTransaction {
        fn method(&self) -> &str {
            "GET"
        }

        fn target(&self) -> Option<&str> {
            Some("/missing")
        }

        fn header_entries(&self) -> &[(String, FieldValue)] {
            &[]
        }

        fn next_chunk(
            &mut self,
        ) -> Pin<Box<dyn Future<Output = Option<io::Result<Bytes>>> + Send + '_>> {
            Box::pin(async { None })
        }
    }

    #[derive(Default)]
    struct CountingSink {
        heads: Vec<u16>,
    }

    impl ResponseSink for CountingSink {
        fn write_head(&mut self, status: u16, _: &[(String, FieldValue)]) -> io::Result<()> {
            self.heads.push(status);
            Ok(())
        }

        fn write_chunk(
            &mut self,
            _chunk: Bytes,
        ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }

        fn finish(&mut self) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    // ── registry ─────────────────────────────────────────────────────────────

    #[test]
    fn builtins_resolve_by_name() {
        assert_eq!(builtin("standalone").unwrap().name(), "standalone");
        assert_eq!(builtin("passthrough").unwrap().name(), "passthrough");
        assert!(builtin("express").is_none());
    }

    #[test]
    fn builtin_names_in_registry_order() {
        let names: Vec<_> = builtin_names().collect();
        assert_eq!(names, vec!["standalone", "passthrough"]);
    }

    // ── scripts ──────────────────────────────────────────────────────────────

    #[test]
    fn standalone_script_renders_every_area() {
        let areas = routes();
        let script = Standalone.launch_script(&options(&areas, true));
        assert!(script.contains(r#"areas.insert("/admin/*".to_owned(), "admin/index.html".to_owned());"#));
        assert!(script.contains(r#"areas.insert("/".to_owned(), "index.html".to_owned());"#));
        assert!(script.contains(r#"AreaTable::build(&areas, "/", false, root)"#));
        assert!(script.contains(r#"Server::bind("0.0.0.0:8080")"#));
        assert!(script.contains(r#"Path::new("client")"#));
        assert!(script.contains("server.run(app)"));
    }

    #[test]
    fn script_without_start_server_exposes_the_handler() {
        let areas = routes();
        let script = Standalone.launch_script(&options(&areas, false));
        assert!(script.contains("pub fn app()"));
        assert!(!script.contains("Server::bind"));
        assert!(!script.contains("#[tokio::main]"));
    }

    #[test]
    fn passthrough_script_mounts_only_the_main_area() {
        let areas = routes();
        let script = Passthrough.launch_script(&options(&areas, true));
        assert!(script.contains(r#"areas.insert("/".to_owned(), "index.html".to_owned());"#));
        assert!(!script.contains("/admin"));
        assert!(script.contains(r#"AreaTable::build(&areas, "/", true, root)"#));
    }

    #[test]
    fn wildcard_root_pattern_round_trips() {
        let route = AreaRoute {
            path: "/".to_owned(),
            document: "index.html".to_owned(),
            is_main: true,
            dir: String::new(),
            wildcard: true,
        };
        assert_eq!(route_pattern(&route), "/*");
    }

    // ── handle ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn standalone_cedes_unsealed_404s() {
        let app = |_req: Request| async { Response::new(StatusCode::NotFound) };
        let mut sink = CountingSink::default();
        let outcome = Standalone
            .handle(&app, &mut StubTransaction, &mut sink)
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::NotHandled);
        assert!(sink.heads.is_empty());
    }

    #[tokio::test]
    async fn passthrough_delivers_unsealed_404s() {
        let app = |_req: Request| async { Response::new(StatusCode::NotFound) };
        let mut sink = CountingSink::default();
        let outcome = Passthrough
            .handle(&app, &mut StubTransaction, &mut sink)
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::Served);
        assert_eq!(sink.heads, vec![404]);
    }
}
