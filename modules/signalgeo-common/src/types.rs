use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalGeoError};

// --- Rounding ---

/// Round to 4 decimal places. Every published score goes through this.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// --- Nodes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Influencer,
    Institution,
    Platform,
    Router,
    Machine,
}

impl NodeType {
    /// Influencers and institutions are the only nodes looked for in signal text.
    pub fn is_mentionable(&self) -> bool {
        matches!(self, NodeType::Influencer | NodeType::Institution)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Influencer => write!(f, "influencer"),
            NodeType::Institution => write!(f, "institution"),
            NodeType::Platform => write!(f, "platform"),
            NodeType::Router => write!(f, "router"),
            NodeType::Machine => write!(f, "machine"),
        }
    }
}

/// A named actor a signal can pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

// --- Signals ---

/// A timestamped content item travelling through the node network.
///
/// Derived fields start out unset and are written once by the stage that owns
/// them. Read them through the accessor methods, which resolve the documented
/// default (`0.0` for scores) in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Signal {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub title: String,
    /// Originating platform or topic. Not guaranteed to be a graph node id.
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub entropy: f64,
    pub velocity: f64,
    #[serde(default)]
    pub impact: f64,
    #[serde(default)]
    pub route: Vec<String>,
    /// Topic hint from the collector (subreddit, news query, ...).
    #[serde(default, alias = "subreddit", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_node: Option<String>,

    // Derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsi_score: Option<f64>,
    #[serde(default)]
    pub is_recursive: bool,
    #[serde(default)]
    pub recursive_depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_index: Option<f64>,
    #[serde(default)]
    pub is_contradiction: bool,
}

impl Signal {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        entropy: f64,
        velocity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            title: title.into(),
            source: source.into(),
            timestamp,
            entropy,
            velocity,
            impact: 0.0,
            route: Vec::new(),
            topic: None,
            seed_node: None,
            drift_score: None,
            nsi_score: None,
            is_recursive: false,
            recursive_depth: 0,
            power_index: None,
            is_contradiction: false,
        }
    }

    pub fn with_route<I, S>(mut self, route: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route = route.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Lowercased `"{title} {content}"`, the text every mention heuristic scans.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.content).to_lowercase()
    }

    pub fn drift(&self) -> f64 {
        self.drift_score.unwrap_or(0.0)
    }

    pub fn nsi(&self) -> f64 {
        self.nsi_score.unwrap_or(0.0)
    }

    pub fn power(&self) -> f64 {
        self.power_index.unwrap_or(0.0)
    }

    /// Topic hint, falling back to the source identifier.
    pub fn topic_or_source(&self) -> &str {
        self.topic.as_deref().unwrap_or(&self.source)
    }

    /// Reject records whose measured scores fall outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(SignalGeoError::Validation("signal id is empty".into()));
        }
        for (name, value) in [("entropy", self.entropy), ("velocity", self.velocity)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SignalGeoError::Validation(format!(
                    "signal {}: {name} {value} outside [0, 1]",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Summary attached to the graph node where a signal's route starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub id: String,
    pub entropy: f64,
    pub title: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl From<&Signal> for SignalSummary {
    fn from(signal: &Signal) -> Self {
        Self {
            id: signal.id.clone(),
            entropy: signal.entropy,
            title: signal.title.clone(),
            source: signal.source.clone(),
            topic: signal.topic.clone(),
        }
    }
}

// --- Learned maps ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoOccurrenceEntry {
    pub count: u32,
    pub weight: f64,
}

/// node id → node id → association. Symmetric in `count`.
pub type CoOccurrenceMap = BTreeMap<String, BTreeMap<String, CoOccurrenceEntry>>;

/// (origin platform, target platform) → observed direct transitions.
pub type TransitionMap = BTreeMap<(String, String), u32>;

/// Nodes observed one hop between two platform nodes.
pub type BridgeNodes = BTreeSet<String>;

// --- Timeline ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub signal_id: String,
    pub node: String,
    pub arrival_time: DateTime<Utc>,
}
