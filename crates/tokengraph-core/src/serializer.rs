//! Graph artifact rendering.
//!
//! The document shape consumed by the front end:
//!
//! ```json
//! {
//!   "nodes": [{"id": "...", "name": "...", "price": 1.0, "liquidity": 2.0, "avgLogReturn": 0.01}],
//!   "links": [{"source": "...", "target": "...", "averageCorrelation": 0.4, "measurements": 999}]
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::info;

use crate::graph::{Graph, GraphEdge, GraphNode};
use crate::{CoreError, Unit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: Unit,
    pub name: String,
    pub price: f64,
    pub liquidity: f64,
    pub avg_log_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDocument {
    pub source: Unit,
    pub target: Unit,
    pub average_correlation: f64,
    pub measurements: usize,
}

/// Serialized form of a [`Graph`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    pub links: Vec<LinkDocument>,
}

impl From<&GraphNode> for NodeDocument {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            price: node.price,
            liquidity: node.liquidity,
            avg_log_return: node.avg_log_return,
        }
    }
}

impl From<&GraphEdge> for LinkDocument {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            average_correlation: edge.correlation,
            measurements: edge.measurements,
        }
    }
}

impl From<&Graph> for GraphDocument {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes.iter().map(NodeDocument::from).collect(),
            links: graph.edges.iter().map(LinkDocument::from).collect(),
        }
    }
}

impl From<GraphDocument> for Graph {
    fn from(document: GraphDocument) -> Self {
        Self {
            nodes: document
                .nodes
                .into_iter()
                .map(|node| GraphNode {
                    id: node.id,
                    name: node.name,
                    price: node.price,
                    liquidity: node.liquidity,
                    avg_log_return: node.avg_log_return,
                })
                .collect(),
            edges: document
                .links
                .into_iter()
                .map(|link| GraphEdge {
                    source: link.source,
                    target: link.target,
                    correlation: link.average_correlation,
                    measurements: link.measurements,
                })
                .collect(),
        }
    }
}

pub fn to_json_value(graph: &Graph) -> Result<Value, CoreError> {
    Ok(serde_json::to_value(GraphDocument::from(graph))?)
}

pub fn to_pretty_string(graph: &Graph) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from(graph))?)
}

pub fn from_json_str(raw: &str) -> Result<Graph, CoreError> {
    let document: GraphDocument = serde_json::from_str(raw)?;
    Ok(document.into())
}

/// Writes the pretty JSON artifact to `path`, replacing any previous file.
///
/// The document goes to a temporary file in the destination directory first
/// and is then renamed over `path`, so readers see either the old artifact or
/// the complete new one.
pub fn write_artifact(path: &Path, graph: &Graph) -> Result<(), CoreError> {
    let rendered = to_pretty_string(graph)?;

    let directory = artifact_directory(path);
    let mut staged = NamedTempFile::new_in(&directory)?;
    staged.write_all(rendered.as_bytes())?;
    staged.write_all(b"\n")?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;

    info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        links = graph.edges.len(),
        bytes = rendered.len() + 1,
        "graph artifact written"
    );
    Ok(())
}

fn artifact_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
