//! Records handed to downstream consumers, and co-occurrence memory
//! persistence.
//!
//! Everything is pretty JSON. The co-occurrence memory is the only file read
//! back by a later run; a missing or corrupt memory degrades to an empty map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use signalgeo_common::{round4, CoOccurrenceMap, NodeType, Result, Signal, TimelineRow};

use crate::graph::{EdgeAttrs, GraphNode, InfluenceGraph};
use crate::pipeline::PipelineOutput;

// --- Co-occurrence memory ---

pub fn save_co_occurrence(path: &Path, map: &CoOccurrenceMap) -> Result<()> {
    write_json(path, map)?;
    info!(path = %path.display(), nodes = map.len(), "Co-occurrence memory saved");
    Ok(())
}

pub fn load_co_occurrence(path: &Path) -> Result<CoOccurrenceMap> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a persisted memory, or an empty one if it is missing or unreadable.
pub fn load_co_occurrence_or_empty(path: &Path) -> CoOccurrenceMap {
    if !path.exists() {
        info!(path = %path.display(), "No co-occurrence memory yet, starting empty");
        return CoOccurrenceMap::new();
    }
    match load_co_occurrence(path) {
        Ok(map) => {
            info!(path = %path.display(), nodes = map.len(), "Co-occurrence memory loaded");
            map
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable co-occurrence memory, starting empty");
            CoOccurrenceMap::new()
        }
    }
}

// --- Graph ---

/// Node-link form of the influence graph.
#[derive(Debug, Serialize)]
pub struct NodeLinkGraph<'a> {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<&'a GraphNode>,
    pub links: Vec<LinkRecord<'a>>,
}

#[derive(Debug, Serialize)]
pub struct LinkRecord<'a> {
    pub source: &'a str,
    pub target: &'a str,
    #[serde(flatten)]
    pub attrs: &'a EdgeAttrs,
}

pub fn node_link(graph: &InfluenceGraph) -> NodeLinkGraph<'_> {
    NodeLinkGraph {
        directed: true,
        multigraph: false,
        nodes: graph.nodes().collect(),
        links: graph
            .edges()
            .map(|(source, target, attrs)| LinkRecord {
                source,
                target,
                attrs,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub power_score: f64,
}

pub fn node_table(graph: &InfluenceGraph, power_scores: &BTreeMap<String, f64>) -> Vec<NodeRecord> {
    graph
        .nodes()
        .map(|node| NodeRecord {
            id: node.id.clone(),
            node_type: node.node_type,
            power_score: power_scores.get(&node.id).copied().unwrap_or(0.0),
        })
        .collect()
}

// --- Signals ---

/// One row of the per-signal metric table, with every derived field resolved
/// to its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub source: String,
    pub entropy: f64,
    pub velocity: f64,
    pub impact: f64,
    pub route: Vec<String>,
    pub route_length: usize,
    pub drift_score: f64,
    pub nsi_score: f64,
    pub recursive_depth: u32,
    pub is_recursive: bool,
    pub is_contradiction: bool,
    pub power_index: f64,
    pub seed_node: String,
}

impl From<&Signal> for SignalRecord {
    fn from(s: &Signal) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            topic: s.topic.clone().unwrap_or_else(|| "unknown".to_string()),
            source: s.source.clone(),
            entropy: round4(s.entropy),
            velocity: round4(s.velocity),
            impact: round4(s.impact),
            route: s.route.clone(),
            route_length: s.route.len(),
            drift_score: round4(s.drift()),
            nsi_score: round4(s.nsi()),
            recursive_depth: s.recursive_depth,
            is_recursive: s.is_recursive,
            is_contradiction: s.is_contradiction,
            power_index: round4(s.power()),
            seed_node: s.seed_node.clone().unwrap_or_default(),
        }
    }
}

pub fn signal_table(signals: &[Signal]) -> Vec<SignalRecord> {
    signals.iter().map(SignalRecord::from).collect()
}

// --- Bundle ---

/// Files written by `export_all`.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub signals: PathBuf,
    pub nodes: PathBuf,
    pub graph: PathBuf,
    pub timeline: PathBuf,
    pub co_occurrence: PathBuf,
    pub topics: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            signals: dir.join("signals.json"),
            nodes: dir.join("nodes.json"),
            graph: dir.join("graph.json"),
            timeline: dir.join("timeline.json"),
            co_occurrence: dir.join("co_occurrence_map.json"),
            topics: dir.join("topics.json"),
        }
    }
}

/// Write every downstream record of a run into `dir`.
pub fn export_all(dir: &Path, output: &PipelineOutput) -> Result<ExportPaths> {
    let paths = ExportPaths::in_dir(dir);

    write_json(&paths.signals, &signal_table(&output.signals))?;
    write_json(&paths.nodes, &node_table(&output.graph, &output.power_scores))?;
    write_json(&paths.graph, &node_link(&output.graph))?;
    write_json::<Vec<TimelineRow>>(&paths.timeline, &output.timeline)?;
    write_json(&paths.topics, &output.topics)?;
    save_co_occurrence(&paths.co_occurrence, &output.co_occurrence)?;

    info!(dir = %dir.display(), run_id = %output.run_id, "Run exported");
    Ok(paths)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
