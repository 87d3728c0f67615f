//! GraphML loader
//!
//! Reads the subset of GraphML produced by knowledge-graph builders:
//! `<key>` declarations (with optional `<default>`), a single `<graph>`,
//! and its `<node>` / `<edge>` elements carrying `<data>` values.
//!
//! ```xml
//! <graphml xmlns="http://graphml.graphdrawing.org/xmlns">
//!   <key id="d0" for="node" attr.name="entity_type" attr.type="string"/>
//!   <key id="d1" for="edge" attr.name="weight" attr.type="double"/>
//!   <graph edgedefault="undirected">
//!     <node id="X"><data key="d0">person</data></node>
//!     <edge source="X" target="Y"><data key="d1">2.0</data></edge>
//!   </graph>
//! </graphml>
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node as XmlNode};
use thiserror::Error;
use tracing::debug;

use crate::model::{AttrValue, EdgeAttributes, Graph, GraphView, NodeAttributes};

/// Errors that can occur when loading a GraphML file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read graph file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Not a GraphML document (root element is <{0}>)")]
    NotGraphml(String),

    #[error("GraphML document contains no <graph> element")]
    MissingGraph,

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<data> references undeclared key '{0}'")]
    UnknownKey(String),

    #[error("Key '{key}' has unsupported attr.type '{attr_type}'")]
    UnsupportedType { key: String, attr_type: String },

    #[error("Value '{value}' for key '{key}' is not a valid {attr_type}")]
    InvalidValue {
        key: String,
        attr_type: &'static str,
        value: String,
    },
}

/// Declared type of a GraphML attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Int,
    Float,
    Bool,
}

impl AttrType {
    fn parse(key: &str, raw: &str) -> Result<Self, LoadError> {
        match raw {
            "string" => Ok(AttrType::String),
            "int" | "long" => Ok(AttrType::Int),
            "float" | "double" => Ok(AttrType::Float),
            "boolean" => Ok(AttrType::Bool),
            other => Err(LoadError::UnsupportedType {
                key: key.to_string(),
                attr_type: other.to_string(),
            }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::Int => "int",
            AttrType::Float => "double",
            AttrType::Bool => "boolean",
        }
    }

    /// Decode element text according to this type
    pub fn decode(self, key: &str, text: &str) -> Result<AttrValue, LoadError> {
        let invalid = || LoadError::InvalidValue {
            key: key.to_string(),
            attr_type: self.name(),
            value: text.to_string(),
        };

        match self {
            AttrType::String => Ok(AttrValue::String(text.to_string())),
            AttrType::Int => text
                .trim()
                .parse::<i64>()
                .map(AttrValue::Int)
                .map_err(|_| invalid()),
            AttrType::Float => text
                .trim()
                .parse::<f64>()
                .map(AttrValue::Float)
                .map_err(|_| invalid()),
            AttrType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(AttrValue::Bool(true)),
                "false" | "0" => Ok(AttrValue::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

/// Which elements a key declaration applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDomain {
    Node,
    Edge,
    All,
    Other,
}

impl KeyDomain {
    fn covers_nodes(self) -> bool {
        matches!(self, KeyDomain::Node | KeyDomain::All)
    }

    fn covers_edges(self) -> bool {
        matches!(self, KeyDomain::Edge | KeyDomain::All)
    }
}

/// A `<key>` declaration
#[derive(Debug, Clone)]
struct KeySpec {
    name: String,
    attr_type: AttrType,
    domain: KeyDomain,
    default: Option<AttrValue>,
}

/// Load a GraphML file from disk
pub fn load_graphml(path: &Path) -> Result<Graph, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = parse_graphml(&text)?;
    debug!(path = %path.display(), "loaded GraphML file");
    Ok(graph)
}

/// Parse GraphML text into a [`Graph`]
pub fn parse_graphml(text: &str) -> Result<Graph, LoadError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "graphml" {
        return Err(LoadError::NotGraphml(root.tag_name().name().to_string()));
    }

    let keys = parse_keys(root)?;

    let graph_el = elements(root)
        .find(|n| n.tag_name().name() == "graph")
        .ok_or(LoadError::MissingGraph)?;

    let directed = graph_el.attribute("edgedefault") == Some("directed");
    let mut graph = Graph::new(directed);

    let node_defaults: Vec<(&str, &AttrValue)> = keys
        .values()
        .filter(|k| k.domain.covers_nodes())
        .filter_map(|k| k.default.as_ref().map(|d| (k.name.as_str(), d)))
        .collect();
    let edge_defaults: Vec<(&str, &AttrValue)> = keys
        .values()
        .filter(|k| k.domain.covers_edges())
        .filter_map(|k| k.default.as_ref().map(|d| (k.name.as_str(), d)))
        .collect();

    let mut declared: HashSet<&str> = HashSet::new();

    for el in elements(graph_el) {
        match el.tag_name().name() {
            "node" => {
                let id = el.attribute("id").ok_or(LoadError::MissingAttribute {
                    element: "node",
                    attribute: "id",
                })?;
                let mut attrs = NodeAttributes::default();
                // Defaults only fill a node's first declaration
                if declared.insert(id) {
                    for (name, value) in &node_defaults {
                        attrs.set(name, (*value).clone());
                    }
                }
                for (name, value) in read_data(el, &keys)? {
                    attrs.set(name, value);
                }
                graph.add_node(id, attrs);
            }
            "edge" => {
                let source = el.attribute("source").ok_or(LoadError::MissingAttribute {
                    element: "edge",
                    attribute: "source",
                })?;
                let target = el.attribute("target").ok_or(LoadError::MissingAttribute {
                    element: "edge",
                    attribute: "target",
                })?;
                let mut attrs = EdgeAttributes::default();
                for (name, value) in &edge_defaults {
                    attrs.set(name, (*value).clone());
                }
                for (name, value) in read_data(el, &keys)? {
                    attrs.set(name, value);
                }
                // Endpoints seen before their <node> element still get key defaults
                for endpoint in [source, target] {
                    if graph.node(endpoint).is_none() {
                        let mut implicit = NodeAttributes::default();
                        for (name, value) in &node_defaults {
                            implicit.set(name, (*value).clone());
                        }
                        graph.add_node(endpoint, implicit);
                    }
                }
                graph.add_edge(source, target, attrs);
            }
            _ => {}
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        directed,
        "parsed GraphML"
    );

    Ok(graph)
}

fn elements<'a, 'input>(
    parent: XmlNode<'a, 'input>,
) -> impl Iterator<Item = XmlNode<'a, 'input>> {
    parent.children().filter(|n| n.is_element())
}

/// Concatenated text content of an element
fn text_of(el: XmlNode<'_, '_>) -> String {
    el.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn parse_keys(root: XmlNode<'_, '_>) -> Result<HashMap<String, KeySpec>, LoadError> {
    let mut keys = HashMap::new();

    for el in elements(root).filter(|n| n.tag_name().name() == "key") {
        let id = el.attribute("id").ok_or(LoadError::MissingAttribute {
            element: "key",
            attribute: "id",
        })?;
        let name = el.attribute("attr.name").unwrap_or(id).to_string();
        let attr_type = AttrType::parse(id, el.attribute("attr.type").unwrap_or("string"))?;
        let domain = match el.attribute("for").unwrap_or("all") {
            "node" => KeyDomain::Node,
            "edge" => KeyDomain::Edge,
            "all" => KeyDomain::All,
            _ => KeyDomain::Other,
        };
        let default = elements(el)
            .find(|n| n.tag_name().name() == "default")
            .map(|d| attr_type.decode(id, &text_of(d)))
            .transpose()?;

        keys.insert(
            id.to_string(),
            KeySpec {
                name,
                attr_type,
                domain,
                default,
            },
        );
    }

    Ok(keys)
}

fn read_data<'k>(
    el: XmlNode<'_, '_>,
    keys: &'k HashMap<String, KeySpec>,
) -> Result<Vec<(&'k str, AttrValue)>, LoadError> {
    elements(el)
        .filter(|n| n.tag_name().name() == "data")
        .map(|data| -> Result<(&'k str, AttrValue), LoadError> {
            let key_id = data.attribute("key").ok_or(LoadError::MissingAttribute {
                element: "data",
                attribute: "key",
            })?;
            let spec = keys
                .get(key_id)
                .ok_or_else(|| LoadError::UnknownKey(key_id.to_string()))?;
            let value = spec.attr_type.decode(key_id, &text_of(data))?;
            Ok((spec.name.as_str(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="entity_type" attr.type="string"/>
  <key id="d1" for="node" attr.name="description" attr.type="string"/>
  <key id="d2" for="node" attr.name="rank" attr.type="int">
    <default>0</default>
  </key>
  <key id="d3" for="edge" attr.name="weight" attr.type="double"/>
  <key id="d4" for="edge" attr.name="keywords" attr.type="string"/>
  <graph edgedefault="undirected">
    <node id="X">
      <data key="d0">person</data>
      <data key="d1">A tall man&lt;SEP&gt;lives in Paris</data>
    </node>
    <node id="Y">
      <data key="d2">5</data>
    </node>
    <edge source="X" target="Y">
      <data key="d3">2.0</data>
      <data key="d4">lives,city</data>
    </edge>
    <edge source="Y" target="Z"/>
  </graph>
</graphml>"#;

    #[test]
    fn test_parse_sample() {
        let graph = parse_graphml(SAMPLE).unwrap();
        assert!(!graph.directed);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let x = graph.node("X").unwrap();
        assert_eq!(x.attrs.entity_type, Some(AttrValue::from("person")));
        assert_eq!(
            x.attrs.description,
            Some(AttrValue::from("A tall man<SEP>lives in Paris"))
        );
        assert_eq!(x.attrs.get("rank"), Some(&AttrValue::Int(0)));

        let y = graph.node("Y").unwrap();
        assert_eq!(y.attrs.get("rank"), Some(&AttrValue::Int(5)));
        assert!(y.attrs.entity_type.is_none());
    }

    #[test]
    fn test_edges_keep_document_order_and_types() {
        let graph = parse_graphml(SAMPLE).unwrap();
        let edges: Vec<_> = graph.edges().collect();

        assert_eq!(edges[0].source, "X");
        assert_eq!(edges[0].target, "Y");
        assert_eq!(edges[0].attrs.weight, Some(AttrValue::Float(2.0)));
        assert_eq!(edges[0].attrs.keywords, Some(AttrValue::from("lives,city")));
        assert!(edges[1].attrs.weight.is_none());
    }

    #[test]
    fn test_implicit_endpoint_node() {
        let graph = parse_graphml(SAMPLE).unwrap();
        let z = graph.node("Z").unwrap();
        assert!(z.attrs.entity_type.is_none());
        assert!(z.attrs.description.is_none());
    }

    #[test]
    fn test_directed_edgedefault() {
        let text = r#"<graphml><graph edgedefault="directed"><node id="a"/></graph></graphml>"#;
        let graph = parse_graphml(text).unwrap();
        assert!(graph.directed);
    }

    #[test]
    fn test_rejects_non_graphml_root() {
        let err = parse_graphml("<svg></svg>").unwrap_err();
        assert!(matches!(err, LoadError::NotGraphml(ref name) if name == "svg"));
    }

    #[test]
    fn test_rejects_missing_graph() {
        let err = parse_graphml("<graphml></graphml>").unwrap_err();
        assert!(matches!(err, LoadError::MissingGraph));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        let err = parse_graphml("<graphml><graph>").unwrap_err();
        assert!(matches!(err, LoadError::XmlError(_)));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let text = r#"<graphml><graph><node id="a"><data key="nope">x</data></node></graph></graphml>"#;
        let err = parse_graphml(text).unwrap_err();
        assert!(matches!(err, LoadError::UnknownKey(ref k) if k == "nope"));
    }

    #[test]
    fn test_rejects_invalid_typed_value() {
        let text = r#"<graphml>
  <key id="w" for="edge" attr.name="weight" attr.type="double"/>
  <graph><edge source="a" target="b"><data key="w">heavy</data></edge></graph>
</graphml>"#;
        let err = parse_graphml(text).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { ref value, .. } if value == "heavy"));
    }

    #[test]
    fn test_rejects_node_without_id() {
        let err = parse_graphml("<graphml><graph><node/></graph></graphml>").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingAttribute {
                element: "node",
                attribute: "id"
            }
        ));
    }

    #[test]
    fn test_defaults_apply_to_nodes_referenced_before_declaration() {
        let text = r#"<graphml>
  <key id="t" for="node" attr.name="entity_type" attr.type="string">
    <default>entity</default>
  </key>
  <graph>
    <node id="a"/>
    <edge source="a" target="b"/>
    <edge source="b" target="c"/>
    <node id="b"><data key="t">person</data></node>
  </graph>
</graphml>"#;
        let graph = parse_graphml(text).unwrap();

        let a = graph.node("a").unwrap();
        let b = graph.node("b").unwrap();
        let c = graph.node("c").unwrap();
        assert_eq!(a.attrs.entity_type, Some(AttrValue::from("entity")));
        assert_eq!(b.attrs.entity_type, Some(AttrValue::from("person")));
        assert_eq!(c.attrs.entity_type, Some(AttrValue::from("entity")));
    }

    #[test]
    fn test_late_declaration_without_data_keeps_default() {
        let text = r#"<graphml>
  <key id="t" for="node" attr.name="entity_type" attr.type="string">
    <default>entity</default>
  </key>
  <graph>
    <edge source="a" target="b"/>
    <node id="b"/>
  </graph>
</graphml>"#;
        let graph = parse_graphml(text).unwrap();

        assert_eq!(
            graph.node("a").unwrap().attrs.entity_type,
            graph.node("b").unwrap().attrs.entity_type
        );
        assert_eq!(
            graph.node("b").unwrap().attrs.entity_type,
            Some(AttrValue::from("entity"))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_graphml(Path::new("/definitely/not/here.graphml")).unwrap_err();
        assert!(matches!(err, LoadError::IoError { .. }));
    }

    #[test]
    fn test_bool_decoding() {
        assert_eq!(
            AttrType::Bool.decode("k", "True").unwrap(),
            AttrValue::Bool(true)
        );
        assert_eq!(
            AttrType::Bool.decode("k", "0").unwrap(),
            AttrValue::Bool(false)
        );
        assert!(AttrType::Bool.decode("k", "maybe").is_err());
    }
}
