pub mod bridges;
pub mod co_occurrence;
pub mod contradiction;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod pipeline;
pub mod power_index;
pub mod recursion;
pub mod resolver;
pub mod timeline;

pub use bridges::{detect_cross_platform_bridges, top_transition_from};
pub use co_occurrence::{decay_weighted_lookup, mention_matcher, merge_memory, track_co_occurrence};
pub use contradiction::detect_contradictions;
pub use export::{
    export_all, load_co_occurrence, load_co_occurrence_or_empty, save_co_occurrence, ExportPaths,
    NodeRecord, SignalRecord,
};
pub use graph::{build_graph, EdgeAttrs, GraphNode, InfluenceGraph};
pub use metrics::{
    calculate_truth_drift, compute_narrative_stability_index, topic_aggregates, TopicAggregate,
};
pub use pipeline::{Pipeline, PipelineOutput, PipelineStats};
pub use power_index::{compute_power_index, rank_power};
pub use recursion::{assign_recursive_depth, detect_recursion};
pub use resolver::{reinforce_cross_platform_bridges, ResolveOutcome, RouteResolver};
pub use timeline::simulate_propagation;
