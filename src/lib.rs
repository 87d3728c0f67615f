//! # kg-viewer - Knowledge Graph Viewer
//!
//! Converts a GraphML knowledge graph into the JSON document used by a
//! vis.js browser viewer, and serves that viewer locally.
//!
//! ## Usage
//!
//! ```bash
//! # Convert rag_storage/graph_chunk_entity_relation.graphml to graph_data.json
//! kg-viewer export
//!
//! # Pick the input and output explicitly
//! kg-viewer export --graphml kg/graph.graphml --output web/graph_data.json
//!
//! # Serve the viewer page and open a browser tab
//! kg-viewer serve --root web
//! ```
//!
//! ## Output Document
//!
//! ```text
//! { "nodes": [ {id, label, title, group, entity_type, description, source_id, file_path} ],
//!   "edges": [ {from, to, value, title, weight, description, keywords} ],
//!   "stats": {total_nodes, total_edges, entity_types} }
//! ```
//!
//! - `title` is the first `<SEP>` segment of the description, cut to
//!   100 characters for nodes and 150 for edges
//! - `value` mirrors `weight` and drives edge thickness

pub mod config;
pub mod export;
pub mod graphml;
pub mod model;
pub mod report;
pub mod web;

pub use config::{
    ConfigError, ExportConfig, ServeConfigFile, ViewerConfig, find_config_file, load_config,
    load_config_file,
};
pub use export::{
    ExportError, ExportOptions, Stats, VisEdge, VisNode, VisualizationDocument, coerce_weight,
    edge_title, export_graph, node_title, preview, to_json_string, write_document,
};
pub use graphml::{LoadError, load_graphml, parse_graphml};
pub use model::{AttrValue, Edge, EdgeAttributes, Graph, GraphView, Node, NodeAttributes};
pub use report::write_export_summary;
