//! Correlation graph model and builder.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing::debug;

use crate::correlation::correlate;
use crate::{CoreError, ReturnSeries, Token, Unit, ValidationError};

/// One token in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: Unit,
    pub name: String,
    pub price: f64,
    pub liquidity: f64,
    pub avg_log_return: f64,
}

/// Correlation between two distinct units.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source: Unit,
    pub target: Unit,
    pub correlation: f64,
    pub measurements: usize,
}

/// Nodes sorted by id; edges sorted by `(source, target)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes
            .binary_search_by(|node| node.id.as_str().cmp(id))
            .ok()
            .map(|index| &self.nodes[index])
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|edge| edge.source.as_str() == source && edge.target.as_str() == target)
    }
}

/// Whether each unordered pair yields one link or a link in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EdgeMode {
    /// One edge per pair with `source < target`.
    #[default]
    Undirected,
    /// Two edges per pair carrying the same value.
    Directed,
}

impl EdgeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undirected => "undirected",
            Self::Directed => "directed",
        }
    }

    /// Edge count for a graph with `nodes` nodes.
    pub const fn edge_count(self, nodes: usize) -> usize {
        let pairs = nodes * nodes.saturating_sub(1) / 2;
        match self {
            Self::Undirected => pairs,
            Self::Directed => pairs * 2,
        }
    }
}

impl Display for EdgeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "undirected" => Ok(Self::Undirected),
            "directed" => Ok(Self::Directed),
            other => Err(ValidationError::InvalidEdgeMode {
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeEntry {
    token: Token,
    avg_log_return: f64,
    returns: ReturnSeries,
}

/// Collects tokens with their return series and builds the all-pairs graph.
#[derive(Debug, Clone, Default)]
pub struct CorrelationGraphBuilder {
    edge_mode: EdgeMode,
    entries: BTreeMap<Unit, NodeEntry>,
}

impl CorrelationGraphBuilder {
    pub fn new(edge_mode: EdgeMode) -> Self {
        Self {
            edge_mode,
            entries: BTreeMap::new(),
        }
    }

    /// Registers a token. A later call for the same unit replaces the entry.
    ///
    /// # Errors
    ///
    /// [`CoreError::NumericDegenerate`] when `returns` is empty: such a token
    /// has no defined mean return and is left out of the graph.
    pub fn add(&mut self, token: Token, returns: ReturnSeries) -> Result<(), CoreError> {
        let avg_log_return = returns.require_mean(token.unit.as_str())?;
        self.entries.insert(
            token.unit.clone(),
            NodeEntry {
                token,
                avg_log_return,
                returns,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Graph {
        let entries: Vec<NodeEntry> = self.entries.into_values().collect();

        let nodes = entries
            .iter()
            .map(|entry| GraphNode {
                id: entry.token.unit.clone(),
                name: entry.token.ticker.clone(),
                price: entry.token.price,
                liquidity: entry.token.liquidity,
                avg_log_return: entry.avg_log_return,
            })
            .collect();

        let mut edges = Vec::with_capacity(self.edge_mode.edge_count(entries.len()));
        let mut degenerate_pairs = 0usize;
        for (i, left) in entries.iter().enumerate() {
            for right in &entries[i + 1..] {
                let result = correlate(left.returns.points(), right.returns.points());
                if result.degenerate {
                    degenerate_pairs += 1;
                }

                edges.push(GraphEdge {
                    source: left.token.unit.clone(),
                    target: right.token.unit.clone(),
                    correlation: result.value,
                    measurements: result.measurements,
                });
                if self.edge_mode == EdgeMode::Directed {
                    edges.push(GraphEdge {
                        source: right.token.unit.clone(),
                        target: left.token.unit.clone(),
                        correlation: result.value,
                        measurements: result.measurements,
                    });
                }
            }
        }

        if self.edge_mode == EdgeMode::Directed {
            edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        }

        debug!(
            nodes = entries.len(),
            edges = edges.len(),
            degenerate_pairs,
            edge_mode = %self.edge_mode,
            "correlation graph built"
        );

        Graph { nodes, edges }
    }
}
