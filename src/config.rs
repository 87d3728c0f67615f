//! Configuration file support for kg-viewer
//!
//! This module handles parsing `kg-viewer.toml` configuration files that
//! supply default paths and settings for both subcommands. Command-line
//! flags override anything set here.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # kg-viewer.toml
//!
//! [export]
//! # GraphML file produced by the knowledge-graph builder
//! graphml = "rag_storage/graph_chunk_entity_relation.graphml"
//!
//! # Where to write the visualization document
//! output = "graph_data.json"
//!
//! # Tooltip lengths before truncation
//! node_title_limit = 100
//! edge_title_limit = 150
//!
//! # Token joining description segments
//! separator = "<SEP>"
//!
//! [serve]
//! # Directory served over HTTP
//! root = "."
//! page = "graph_viewer_simple.html"
//! data = "graph_data.json"
//!
//! # First port to try, and how many consecutive ports to scan
//! port = 8000
//! port_attempts = 10
//! open_browser = true
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::{
    DEFAULT_EDGE_TITLE_LIMIT, DEFAULT_NODE_TITLE_LIMIT, DEFAULT_SEPARATOR, ExportOptions,
};

/// File names searched for, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["kg-viewer.toml", ".kg-viewer.toml"];

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

/// Export configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// GraphML input file
    #[serde(default = "default_graphml")]
    pub graphml: PathBuf,

    /// JSON output file
    #[serde(default = "default_data_file")]
    pub output: PathBuf,

    #[serde(default = "default_node_title_limit")]
    pub node_title_limit: usize,

    #[serde(default = "default_edge_title_limit")]
    pub edge_title_limit: usize,

    /// Description segment separator
    #[serde(default = "default_separator")]
    pub separator: String,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfigFile {
    /// Directory whose files are served
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Viewer page, relative to `root`
    #[serde(default = "default_page")]
    pub page: String,

    /// Visualization document, relative to `root`
    #[serde(default = "default_data")]
    pub data: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of consecutive ports to try
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,

    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_graphml() -> PathBuf {
    PathBuf::from("rag_storage/graph_chunk_entity_relation.graphml")
}

fn default_data_file() -> PathBuf {
    PathBuf::from(default_data())
}

fn default_node_title_limit() -> usize {
    DEFAULT_NODE_TITLE_LIMIT
}

fn default_edge_title_limit() -> usize {
    DEFAULT_EDGE_TITLE_LIMIT
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_page() -> String {
    "graph_viewer_simple.html".to_string()
}

fn default_data() -> String {
    "graph_data.json".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_port_attempts() -> u16 {
    10
}

fn default_open_browser() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            graphml: default_graphml(),
            output: default_data_file(),
            node_title_limit: default_node_title_limit(),
            edge_title_limit: default_edge_title_limit(),
            separator: default_separator(),
        }
    }
}

impl ExportConfig {
    /// Transform options described by this section
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            node_title_limit: self.node_title_limit,
            edge_title_limit: self.edge_title_limit,
            separator: self.separator.clone(),
        }
    }
}

impl Default for ServeConfigFile {
    fn default() -> Self {
        Self {
            root: default_root(),
            page: default_page(),
            data: default_data(),
            port: default_port(),
            port_attempts: default_port_attempts(),
            open_browser: default_open_browser(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub serve: ServeConfigFile,
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the exporter or server cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.node_title_limit == 0 || self.export.edge_title_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "title limits must be greater than zero".to_string(),
            ));
        }
        if self.export.separator.is_empty() {
            return Err(ConfigError::InvalidValue(
                "separator must not be empty".to_string(),
            ));
        }
        if self.serve.port_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "port_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from an explicit file
pub fn load_config_file(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    ViewerConfig::from_toml(&content)
}

/// Load configuration for a directory
///
/// Searches for `kg-viewer.toml` in the given directory and parent directories.
pub fn load_config(start_path: &Path) -> Result<ViewerConfig, ConfigError> {
    match find_config_file(start_path) {
        Some(path) => load_config_file(&path),
        None => Ok(ViewerConfig::default()),
    }
}

/// Find the config file by searching up the directory tree
///
/// Relative start paths are resolved first so the search can climb past them.
pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let start_path = fs::canonicalize(start_path)
        .or_else(|_| std::path::absolute(start_path))
        .ok()?;

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}
