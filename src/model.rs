//! Attributed graph model
//!
//! Typed view of a GraphML knowledge graph. The attributes the exporter
//! understands (`entity_type`, `description`, `weight`, ...) are named
//! fields; everything else lands in an `extra` map keyed by attribute name.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A single attribute value, typed by its GraphML `attr.type`
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    /// Textual form used when a value lands in a string output field
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(s) => f.write_str(s),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(v) => write!(f, "{:?}", v),
            AttrValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

/// Known node attributes plus passthrough for the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttributes {
    /// Category label; `None` is exported as `"unknown"`
    pub entity_type: Option<AttrValue>,
    /// `<SEP>`-segmented description
    pub description: Option<AttrValue>,
    pub source_id: Option<AttrValue>,
    pub file_path: Option<AttrValue>,
    /// Attributes with no dedicated field, by attribute name
    pub extra: BTreeMap<String, AttrValue>,
}

impl NodeAttributes {
    /// Set an attribute by its GraphML name, routing known names to fields
    pub fn set(&mut self, name: &str, value: AttrValue) {
        match name {
            "entity_type" => self.entity_type = Some(value),
            "description" => self.description = Some(value),
            "source_id" => self.source_id = Some(value),
            "file_path" => self.file_path = Some(value),
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Look up an attribute by its GraphML name
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        match name {
            "entity_type" => self.entity_type.as_ref(),
            "description" => self.description.as_ref(),
            "source_id" => self.source_id.as_ref(),
            "file_path" => self.file_path.as_ref(),
            _ => self.extra.get(name),
        }
    }
}

/// Known edge attributes plus passthrough for the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAttributes {
    /// Raw weight; coerced to a float at export time (default 1.0)
    pub weight: Option<AttrValue>,
    pub description: Option<AttrValue>,
    pub keywords: Option<AttrValue>,
    pub extra: BTreeMap<String, AttrValue>,
}

impl EdgeAttributes {
    pub fn set(&mut self, name: &str, value: AttrValue) {
        match name {
            "weight" => self.weight = Some(value),
            "description" => self.description = Some(value),
            "keywords" => self.keywords = Some(value),
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        match name {
            "weight" => self.weight.as_ref(),
            "description" => self.description.as_ref(),
            "keywords" => self.keywords.as_ref(),
            _ => self.extra.get(name),
        }
    }
}

/// A node, identified by its unique key
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub attrs: NodeAttributes,
}

/// An edge between two node keys; parallel edges are allowed
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub attrs: EdgeAttributes,
}

/// Read-only access to a graph's nodes and edges with their attributes
pub trait GraphView {
    fn nodes(&self) -> impl Iterator<Item = &Node>;
    fn edges(&self) -> impl Iterator<Item = &Edge>;

    fn node_count(&self) -> usize {
        self.nodes().count()
    }

    fn edge_count(&self) -> usize {
        self.edges().count()
    }
}

/// In-memory attributed graph with nodes in insertion order
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub directed: bool,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
}

impl Graph {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    /// Add a node, or merge `attrs` into the existing node with the same id.
    /// Returns the node's position.
    pub fn add_node(&mut self, id: impl Into<String>, attrs: NodeAttributes) -> usize {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            let existing = &mut self.nodes[idx].attrs;
            let NodeAttributes {
                entity_type,
                description,
                source_id,
                file_path,
                extra,
            } = attrs;
            if entity_type.is_some() {
                existing.entity_type = entity_type;
            }
            if description.is_some() {
                existing.description = description;
            }
            if source_id.is_some() {
                existing.source_id = source_id;
            }
            if file_path.is_some() {
                existing.file_path = file_path;
            }
            existing.extra.extend(extra);
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            id: id.clone(),
            attrs,
        });
        self.node_index.insert(id, idx);
        idx
    }

    /// Add an edge; endpoints that are not yet nodes are added without attributes
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        attrs: EdgeAttributes,
    ) {
        let source = source.into();
        let target = target.into();
        for endpoint in [&source, &target] {
            if !self.node_index.contains_key(endpoint) {
                self.add_node(endpoint.clone(), NodeAttributes::default());
            }
        }
        self.edges.push(Edge {
            source,
            target,
            attrs,
        });
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }
}

impl GraphView for Graph {
    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_attributes_route_to_fields() {
        let mut attrs = NodeAttributes::default();
        attrs.set("entity_type", "person".into());
        attrs.set("rank", AttrValue::Int(3));

        assert_eq!(attrs.entity_type, Some(AttrValue::from("person")));
        assert_eq!(attrs.get("rank"), Some(&AttrValue::Int(3)));
        assert!(attrs.description.is_none());
    }

    #[test]
    fn test_duplicate_node_merges_attributes() {
        let mut graph = Graph::new(false);
        let mut first = NodeAttributes::default();
        first.set("entity_type", "person".into());
        first.set("description", "old".into());
        graph.add_node("X", first);

        let mut second = NodeAttributes::default();
        second.set("description", "new".into());
        let idx = graph.add_node("X", second);

        assert_eq!(idx, 0);
        assert_eq!(graph.node_count(), 1);
        let node = graph.node("X").unwrap();
        assert_eq!(node.attrs.entity_type, Some(AttrValue::from("person")));
        assert_eq!(node.attrs.description, Some(AttrValue::from("new")));
    }

    #[test]
    fn test_edge_adds_missing_endpoints() {
        let mut graph = Graph::new(true);
        graph.add_node("A", NodeAttributes::default());
        graph.add_edge("A", "B", EdgeAttributes::default());
        graph.add_edge("A", "B", EdgeAttributes::default());

        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_attr_value_text() {
        assert_eq!(AttrValue::Float(2.0).to_text(), "2.0");
        assert_eq!(AttrValue::Int(7).to_text(), "7");
        assert_eq!(AttrValue::Bool(true).to_text(), "true");
        assert_eq!(AttrValue::from("x").to_text(), "x");
    }
}
