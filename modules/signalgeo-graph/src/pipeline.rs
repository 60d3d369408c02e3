//! Pipeline: runs every analysis stage over one batch of collected signals.
//!
//! Stage order is fixed, each stage reading what the previous one wrote:
//! 1. **Learn**: co-occurrence memory from signal text, merged over any persisted memory
//! 2. **Transitions**: platform→platform counts and bridge nodes from observed routes
//! 3. **Resolve**: infer short routes, then reinforce known transitions with a bridge
//! 4. **Build**: influence graph from seeds plus resolved routes
//! 5. **Score**: recursion, contradictions, power index, drift, NSI, timeline
//!
//! Nothing here is fatal once the pipeline is constructed: unresolved routes
//! flow through as zero-drift signals and power lookups fall back to the
//! configured default.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

use signalgeo_common::{
    CoOccurrenceMap, KeywordMatcher, MatchMode, PipelineConfig, SeedRegistry, Signal, TimelineRow,
};

use crate::bridges::detect_cross_platform_bridges;
use crate::co_occurrence::{mention_matcher, merge_memory, track_co_occurrence};
use crate::contradiction::detect_contradictions;
use crate::graph::{build_graph, InfluenceGraph};
use crate::metrics::{
    calculate_truth_drift, compute_narrative_stability_index, topic_aggregates, TopicAggregate,
};
use crate::power_index::{compute_power_index, rank_power};
use crate::recursion::detect_recursion;
use crate::resolver::{reinforce_cross_platform_bridges, ResolveOutcome, RouteResolver};
use crate::timeline::simulate_propagation;

/// Counts from one pipeline run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineStats {
    pub signals: u32,
    pub co_occurrence_nodes: u32,
    pub transitions: u32,
    pub bridge_nodes: u32,
    pub routes_observed: u32,
    pub routes_resolved: u32,
    pub routes_unresolved: u32,
    pub bridges_reinforced: u32,
    pub incomplete_routes: u32,
    pub graph_nodes: u32,
    pub graph_edges: u32,
    pub recursive_signals: u32,
    pub recursive_nodes: u32,
    pub contradictions: u32,
    pub power_misses: u32,
    pub timeline_rows: u32,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Signal Run Complete ===")?;
        writeln!(f, "Signals:            {}", self.signals)?;
        writeln!(f, "Co-mention nodes:   {}", self.co_occurrence_nodes)?;
        writeln!(f, "Transitions:        {}", self.transitions)?;
        writeln!(f, "Bridge nodes:       {}", self.bridge_nodes)?;
        writeln!(f, "\nRoutes:")?;
        writeln!(f, "  Observed:   {}", self.routes_observed)?;
        writeln!(f, "  Resolved:   {}", self.routes_resolved)?;
        writeln!(f, "  Unresolved: {}", self.routes_unresolved)?;
        writeln!(f, "  Reinforced: {}", self.bridges_reinforced)?;
        writeln!(f, "  Incomplete: {}", self.incomplete_routes)?;
        writeln!(f, "\nGraph:")?;
        writeln!(f, "  Nodes: {}", self.graph_nodes)?;
        writeln!(f, "  Edges: {}", self.graph_edges)?;
        let total = self.signals.max(1);
        writeln!(
            f,
            "\nRecursive signals:  {} ({:.0}%)",
            self.recursive_signals,
            self.recursive_signals as f64 / total as f64 * 100.0
        )?;
        writeln!(f, "Recursive nodes:    {}", self.recursive_nodes)?;
        writeln!(f, "Contradictions:     {}", self.contradictions)?;
        if self.power_misses > 0 {
            writeln!(f, "Power misses:       {}", self.power_misses)?;
        }
        writeln!(f, "Timeline rows:      {}", self.timeline_rows)?;
        Ok(())
    }
}

/// Everything a run produces. Signals carry their derived fields; node
/// scores live in `power_scores`, never on the graph.
#[derive(Debug)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub signals: Vec<Signal>,
    pub graph: InfluenceGraph,
    pub power_scores: BTreeMap<String, f64>,
    pub recursive_nodes: BTreeSet<String>,
    pub contradictions: Vec<(String, String)>,
    pub timeline: Vec<TimelineRow>,
    /// Memory to persist for the next run.
    pub co_occurrence: CoOccurrenceMap,
    pub topics: BTreeMap<String, TopicAggregate>,
    pub stats: PipelineStats,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    registry: &'a SeedRegistry,
    mentions: KeywordMatcher,
    recursion: KeywordMatcher,
    contradiction: KeywordMatcher,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig, registry: &'a SeedRegistry) -> Result<Self> {
        let mentions = mention_matcher(registry, config.match_mode)
            .context("Failed to build mention vocabulary")?;
        let recursion = config
            .recursion_matcher()
            .context("Failed to build recursion vocabulary")?;
        let contradiction = config
            .contradiction_matcher()
            .context("Failed to build contradiction vocabulary")?;

        if config.match_mode == MatchMode::WordBoundary {
            warn!("Word-boundary matching enabled; scores will differ from substring runs");
        }

        Ok(Self {
            config,
            registry,
            mentions,
            recursion,
            contradiction,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `signals`. `co_memory` is the memory persisted by
    /// earlier runs and may be empty.
    pub fn run(&self, mut signals: Vec<Signal>, co_memory: CoOccurrenceMap) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let mut stats = PipelineStats {
            signals: signals.len() as u32,
            ..Default::default()
        };
        info!(%run_id, signals = signals.len(), seeds = self.registry.len(), "Pipeline starting");

        // 1. Learn
        let learned = track_co_occurrence(&signals, &self.mentions);
        let co_occurrence = merge_memory(co_memory, &learned);
        stats.co_occurrence_nodes = co_occurrence.len() as u32;

        // 2. Transitions
        let (transitions, bridges) = detect_cross_platform_bridges(&signals, self.registry);
        stats.transitions = transitions.len() as u32;
        stats.bridge_nodes = bridges.len() as u32;

        // 3. Resolve
        let resolver = RouteResolver::new(
            &co_occurrence,
            self.config.decay,
            &self.config.placeholder_route,
        )
        .with_cross_platform(&transitions, &bridges);

        for signal in signals.iter_mut() {
            match resolver.resolve(signal) {
                ResolveOutcome::AlreadyRouted => stats.routes_observed += 1,
                ResolveOutcome::Resolved => stats.routes_resolved += 1,
                ResolveOutcome::Unresolved => stats.routes_unresolved += 1,
            }
            if self.config.reinforce_bridges
                && reinforce_cross_platform_bridges(signal, &transitions, &bridges).is_some()
            {
                stats.bridges_reinforced += 1;
            }
            if signal.route.len() < 2 {
                stats.incomplete_routes += 1;
                warn!(
                    signal_id = signal.id.as_str(),
                    source = signal.source.as_str(),
                    hops = signal.route.len(),
                    "Route incomplete after resolution"
                );
            }
        }
        info!(
            observed = stats.routes_observed,
            resolved = stats.routes_resolved,
            unresolved = stats.routes_unresolved,
            reinforced = stats.bridges_reinforced,
            "Routes resolved"
        );

        // 4. Build
        let graph = build_graph(self.registry, &signals);
        stats.graph_nodes = graph.node_count() as u32;
        stats.graph_edges = graph.edge_count() as u32;

        // 5. Score
        let recursive_nodes = detect_recursion(&mut signals, &self.recursion);
        stats.recursive_signals = signals.iter().filter(|s| s.is_recursive).count() as u32;
        stats.recursive_nodes = recursive_nodes.len() as u32;

        let contradictions = detect_contradictions(&mut signals, &self.contradiction);
        stats.contradictions = contradictions.len() as u32;

        let power_scores = compute_power_index(&graph, &self.config.power_weights);
        for (rank, (node, score)) in rank_power(&power_scores).iter().take(5).enumerate() {
            info!(rank = rank + 1, node = node.as_str(), score, "Power ranking");
        }

        calculate_truth_drift(&mut signals);
        stats.power_misses = compute_narrative_stability_index(
            &graph,
            &mut signals,
            &power_scores,
            self.config.power_default,
            self.config.nsi_scale,
        );

        let timeline = simulate_propagation(
            &signals,
            self.config.hop_seconds,
            self.config.min_delay_factor,
        );
        stats.timeline_rows = timeline.len() as u32;

        let topics = topic_aggregates(&signals);

        info!(%run_id, "Pipeline complete");
        Ok(PipelineOutput {
            run_id,
            signals,
            graph,
            power_scores,
            recursive_nodes,
            contradictions,
            timeline,
            co_occurrence,
            topics,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_display_includes_route_breakdown() {
        let stats = PipelineStats {
            signals: 4,
            routes_resolved: 3,
            recursive_signals: 2,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("=== Signal Run Complete ==="));
        assert!(text.contains("Resolved:   3"));
        assert!(text.contains("(50%)"));
        assert!(!text.contains("Power misses"));
    }

    #[test]
    fn empty_batch_still_produces_seed_graph() {
        let registry = SeedRegistry::default();
        let pipeline = Pipeline::new(PipelineConfig::default(), &registry).unwrap();
        let output = pipeline.run(Vec::new(), CoOccurrenceMap::new()).unwrap();
        assert_eq!(output.graph.node_count(), registry.len());
        assert_eq!(output.power_scores.len(), registry.len());
        assert!(output.power_scores.values().all(|&s| s == 0.0));
        assert!(output.timeline.is_empty());
    }
}
