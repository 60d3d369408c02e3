//! The directed influence graph assembled from seed nodes and resolved routes.
//!
//! Read-only once `build_graph` returns. Derived scores (power index, ...) are
//! kept in separate maps keyed by node id, never written back into nodes.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use tracing::info;

use signalgeo_common::{NodeType, SeedRegistry, Signal, SignalSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
    /// Last signal whose route starts here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAttrs {
    pub signal_id: String,
    pub velocity: f64,
    pub entropy: f64,
    pub is_recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InfluenceGraph {
    inner: DiGraph<GraphNode, EdgeAttrs>,
    index: HashMap<String, NodeIndex>,
}

impl InfluenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with this id exists. Either way, return its
    /// stable index. An existing node keeps its original type and metadata.
    pub fn ensure_node(
        &mut self,
        id: &str,
        node_type: NodeType,
        metadata: &BTreeMap<String, String>,
    ) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(GraphNode {
            id: id.to_string(),
            node_type,
            metadata: metadata.clone(),
            signal: None,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge, replacing the attributes of an existing edge between the
    /// same ordered pair.
    fn upsert_edge(&mut self, from: NodeIndex, to: NodeIndex, attrs: EdgeAttrs) {
        self.inner.update_edge(from, to, attrs);
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.inner[idx])
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeAttrs> {
        let a = *self.index.get(from)?;
        let b = *self.index.get(to)?;
        self.inner.find_edge(a, b).map(|e| &self.inner[e])
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, direction: Direction) -> usize {
        self.index
            .get(id)
            .map(|&idx| self.inner.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner.node_indices().map(move |idx| &self.inner[idx])
    }

    /// Edges as `(source id, target id, attributes)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeAttrs)> {
        self.inner.edge_references().map(move |e| {
            (
                self.inner[e.source()].id.as_str(),
                self.inner[e.target()].id.as_str(),
                e.weight(),
            )
        })
    }

    /// Dense adjacency lists, `out[i]` holding the successors of the i-th
    /// node in insertion order. Used by the centrality computations.
    pub(crate) fn successor_lists(&self) -> Vec<Vec<usize>> {
        self.inner
            .node_indices()
            .map(|idx| {
                self.inner
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| n.index())
                    .collect()
            })
            .collect()
    }

    pub(crate) fn predecessor_lists(&self) -> Vec<Vec<usize>> {
        self.inner
            .node_indices()
            .map(|idx| {
                self.inner
                    .neighbors_directed(idx, Direction::Incoming)
                    .map(|n| n.index())
                    .collect()
            })
            .collect()
    }
}

/// Assemble the influence graph from the seed registry and every signal's
/// resolved route. Route endpoints that are not seeds become `router` nodes.
/// Later signals overwrite edge attributes and origin summaries of earlier
/// ones.
pub fn build_graph(registry: &SeedRegistry, signals: &[Signal]) -> InfluenceGraph {
    let mut graph = InfluenceGraph::new();
    let no_metadata = BTreeMap::new();

    for node in registry.nodes() {
        graph.ensure_node(&node.id, node.node_type, &node.metadata);
    }
    let seeded = graph.node_count();

    for signal in signals {
        for (hop, pair) in signal.route.windows(2).enumerate() {
            let from = graph.ensure_node(&pair[0], NodeType::Router, &no_metadata);
            let to = graph.ensure_node(&pair[1], NodeType::Router, &no_metadata);

            if hop == 0 {
                graph.inner[from].signal = Some(SignalSummary::from(signal));
            }

            graph.upsert_edge(
                from,
                to,
                EdgeAttrs {
                    signal_id: signal.id.clone(),
                    velocity: signal.velocity,
                    entropy: signal.entropy,
                    is_recursive: signal.is_recursive,
                },
            );
        }
    }

    info!(
        nodes = graph.node_count(),
        auto_created = graph.node_count() - seeded,
        edges = graph.edge_count(),
        "Influence graph built"
    );
    graph
}
