//! Multi-area route resolution.
//!
//! An *area* is one independent single-page-application entry point: a route
//! prefix bound to a static index document. This module builds the immutable
//! route table from configuration — normalizing patterns, validating
//! documents on disk, precomputing precedence — and resolves inbound paths
//! against it. Asset-like paths (a `@` segment or a file extension) are
//! never resolved to a document here; they belong to static file serving.
//!
//! The table is read-only shared state. Rebuilding it (configuration reload)
//! replaces the whole table through [`SharedAreaTable`] so no reader ever
//! observes a half-updated set of routes.

pub mod route;
pub mod table;

pub use route::{AreaRoute, is_asset_path, normalize_path};
pub use table::{AreaConfigError, AreaTable, SharedAreaTable};
