//! Graph data structures for web visualization
//!
//! Converts an attributed [`Graph`](crate::model::Graph) into the flat
//! JSON document consumed by the vis.js viewer: one record per node, one
//! record per edge, and summary statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{AttrValue, GraphView};

/// Separator between facts in a segmented description
pub const DEFAULT_SEPARATOR: &str = "<SEP>";
/// Maximum characters in a node tooltip before truncation
pub const DEFAULT_NODE_TITLE_LIMIT: usize = 100;
/// Maximum characters in an edge tooltip before truncation
pub const DEFAULT_EDGE_TITLE_LIMIT: usize = 150;
/// Category assigned to nodes without an `entity_type`
pub const UNKNOWN_ENTITY_TYPE: &str = "unknown";

const ELLIPSIS: &str = "...";

/// Errors that can occur while exporting
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Edge #{index} ({source_node} -> {target_node}) has non-numeric weight '{value}'")]
    InvalidWeight {
        index: usize,
        source_node: String,
        target_node: String,
        value: String,
    },

    #[error("Failed to write document: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to serialize document: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Tunables for the transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub node_title_limit: usize,
    pub edge_title_limit: usize,
    pub separator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            node_title_limit: DEFAULT_NODE_TITLE_LIMIT,
            edge_title_limit: DEFAULT_EDGE_TITLE_LIMIT,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Complete document for visualization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationDocument {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
    pub stats: Stats,
}

/// A node in the viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    /// Tooltip: first description segment, truncated
    pub title: String,
    /// Color group, same as `entity_type`
    pub group: String,
    pub entity_type: String,
    pub description: String,
    pub source_id: String,
    pub file_path: String,
}

/// An edge in the viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    /// Edge thickness, mirrors `weight`
    pub value: f64,
    pub title: String,
    pub weight: f64,
    pub description: String,
    pub keywords: String,
}

/// Summary statistics for the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub entity_types: BTreeMap<String, usize>,
}

impl Stats {
    /// Entity types sorted by count (descending), then name
    pub fn entity_type_distribution(&self) -> Vec<(&str, usize)> {
        let mut dist: Vec<(&str, usize)> = self
            .entity_types
            .iter()
            .map(|(name, &count)| (name.as_str(), count))
            .collect();
        dist.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        dist
    }
}

/// First `separator`-delimited segment of `description`, cut to `limit` characters
pub fn preview(description: &str, separator: &str, limit: usize) -> String {
    let segment = description.split(separator).next().unwrap_or_default();
    truncate(segment, limit)
}

fn truncate(segment: &str, limit: usize) -> String {
    match segment.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &segment[..cut], ELLIPSIS),
        None => segment.to_string(),
    }
}

/// Tooltip for a node; an empty description falls back to the node id
pub fn node_title(id: &str, description: &str, options: &ExportOptions) -> String {
    if description.is_empty() {
        truncate(id, options.node_title_limit)
    } else {
        preview(description, &options.separator, options.node_title_limit)
    }
}

/// Tooltip for an edge
pub fn edge_title(description: &str, options: &ExportOptions) -> String {
    preview(description, &options.separator, options.edge_title_limit)
}

/// Coerce an edge weight to a finite float; `None` means the value is not numeric
pub fn coerce_weight(value: Option<&AttrValue>) -> Option<f64> {
    let weight = match value {
        None => 1.0,
        Some(AttrValue::Float(v)) => *v,
        Some(AttrValue::Int(i)) => *i as f64,
        Some(AttrValue::Bool(b)) => f64::from(u8::from(*b)),
        Some(AttrValue::String(s)) => s.trim().parse::<f64>().ok()?,
    };
    weight.is_finite().then_some(weight)
}

fn text(value: Option<&AttrValue>) -> String {
    value.map(AttrValue::to_text).unwrap_or_default()
}

/// Convert a graph into the visualization document.
///
/// The first edge with a malformed weight aborts the whole export.
pub fn export_graph<G: GraphView>(
    graph: &G,
    options: &ExportOptions,
) -> Result<VisualizationDocument, ExportError> {
    let mut entity_types: BTreeMap<String, usize> = BTreeMap::new();

    let nodes: Vec<VisNode> = graph
        .nodes()
        .map(|node| {
            let entity_type = node
                .attrs
                .entity_type
                .as_ref()
                .map(AttrValue::to_text)
                .unwrap_or_else(|| UNKNOWN_ENTITY_TYPE.to_string());
            *entity_types.entry(entity_type.clone()).or_insert(0) += 1;

            let description = text(node.attrs.description.as_ref());
            VisNode {
                id: node.id.clone(),
                label: node.id.clone(),
                title: node_title(&node.id, &description, options),
                group: entity_type.clone(),
                entity_type,
                description,
                source_id: text(node.attrs.source_id.as_ref()),
                file_path: text(node.attrs.file_path.as_ref()),
            }
        })
        .collect();

    let edges: Vec<VisEdge> = graph
        .edges()
        .enumerate()
        .map(|(index, edge)| -> Result<VisEdge, ExportError> {
            let weight = coerce_weight(edge.attrs.weight.as_ref()).ok_or_else(|| {
                ExportError::InvalidWeight {
                    index,
                    source_node: edge.source.clone(),
                    target_node: edge.target.clone(),
                    value: text(edge.attrs.weight.as_ref()),
                }
            })?;
            let description = text(edge.attrs.description.as_ref());
            Ok(VisEdge {
                from: edge.source.clone(),
                to: edge.target.clone(),
                value: weight,
                title: edge_title(&description, options),
                weight,
                description,
                keywords: text(edge.attrs.keywords.as_ref()),
            })
        })
        .collect::<Result<_, _>>()?;

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        entity_types = entity_types.len(),
        "built visualization document"
    );

    Ok(VisualizationDocument {
        stats: Stats {
            total_nodes: nodes.len(),
            total_edges: edges.len(),
            entity_types,
        },
        nodes,
        edges,
    })
}

/// Serialize the document as indented JSON with non-ASCII kept literal
pub fn to_json_string(doc: &VisualizationDocument) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Write the document to `path`, replacing any existing file
pub fn write_document(doc: &VisualizationDocument, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
