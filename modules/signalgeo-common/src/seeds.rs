//! Seed node registry: the fixed set of actors a run starts from.
//!
//! Built once (defaults or a JSON node list) and passed by reference to every
//! stage that needs to know node types. Never mutated after construction; the
//! graph builder adds its auto-created router nodes to the graph, not here.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Result, SignalGeoError};
use crate::types::{Node, NodeType};

#[derive(Debug, Clone)]
pub struct SeedRegistry {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl SeedRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(SignalGeoError::Validation(format!(
                    "duplicate seed node id: {}",
                    node.id
                )));
            }
        }
        Ok(Self { nodes, index })
    }

    /// Load a JSON array of nodes.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let nodes: Vec<Node> = serde_json::from_str(&content)?;
        Self::from_nodes(nodes)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn platform_ids(&self) -> BTreeSet<String> {
        self.ids_where(|t| t == NodeType::Platform)
    }

    /// Influencer and institution ids, in registry order.
    pub fn mentionable_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.node_type.is_mentionable())
            .map(|n| n.id.as_str())
            .collect()
    }

    fn ids_where(&self, pred: impl Fn(NodeType) -> bool) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter(|n| pred(n.node_type))
            .map(|n| n.id.clone())
            .collect()
    }
}

impl Default for SeedRegistry {
    fn default() -> Self {
        use NodeType::*;

        let influencer = |id: &str, region: &str, platform: &str| {
            Node::new(id, Influencer)
                .with_meta("region", region)
                .with_meta("platform", platform)
        };
        let institution = |id: &str, region: &str, category: &str| {
            Node::new(id, Institution)
                .with_meta("region", region)
                .with_meta("category", category)
        };
        let platform = |id: &str| {
            Node::new(id, Platform)
                .with_meta("region", "global")
                .with_meta("category", "social")
        };
        let machine = |id: &str, vendor: &str| {
            Node::new(id, Machine)
                .with_meta("region", "global")
                .with_meta("vendor", vendor)
        };

        let nodes = vec![
            influencer("elon_musk", "global", "Twitter"),
            influencer("xi", "china", "Weibo"),
            influencer("putin", "russia", "RT"),
            influencer("zelensky", "ukraine", "Twitter"),
            influencer("trump", "us", "TruthSocial"),
            influencer("modi", "india", "Twitter"),
            institution("nyt", "us", "media"),
            institution("bbc", "uk", "media"),
            institution("al_jazeera", "qatar", "media"),
            institution("global_times", "china", "media"),
            institution("washington_post", "us", "media"),
            institution("toi", "india", "media"),
            institution("rand_corp", "us", "think_tank"),
            institution("brookings", "us", "think_tank"),
            institution("orfonline", "india", "think_tank"),
            institution("csis", "us", "think_tank"),
            institution("carnegie", "us", "think_tank"),
            Node::new("user_1", Router),
            Node::new("user_2", Router),
            Node::new("user_3", Router),
            Node::new("user_4", Router),
            Node::new("reddit_thread", Router),
            platform("reddit"),
            platform("twitter"),
            platform("youtube"),
            platform("facebook"),
            platform("whatsapp"),
            platform("tiktok"),
            machine("chatgpt", "openai"),
            machine("fb_newsfeed", "meta"),
            machine("youtube_recommendation", "google"),
            machine("twitter_trending", "x-corp"),
            machine("news_aggregator_ai", "unknown"),
        ];

        // Literal list above has unique ids.
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        Self { nodes, index }
    }
}
