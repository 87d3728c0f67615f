//! Local web viewer for exported knowledge graphs
//!
//! Serves a pre-built visualization page and the exported
//! `graph_data.json` over HTTP on localhost:
//! - CORS open to any origin (`GET`, `OPTIONS`)
//! - Caching disabled so re-exports show up on reload
//! - First free port at or after the configured one

pub mod routes;
pub mod server;

pub use server::{ServeConfig, ServeError, start_server};
