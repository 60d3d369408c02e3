//! Per-signal scores: truth drift and the narrative stability index (NSI).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use signalgeo_common::{round4, Signal};

use crate::graph::InfluenceGraph;

/// `drift = entropy · (route_len − 1) · velocity`, zero for routes of at most
/// one hop. Must run on final, resolved routes.
pub fn calculate_truth_drift(signals: &mut [Signal]) {
    for signal in signals.iter_mut() {
        let hops = signal.route.len().saturating_sub(1) as f64;
        let drift = round4(signal.entropy * hops * signal.velocity);
        signal.drift_score = Some(drift);
    }

    let max = signals.iter().map(Signal::drift).fold(0.0_f64, f64::max);
    info!(signals = signals.len(), max_drift = max, "Truth drift computed");
}

/// `nsi = (1 − entropy) · 1/(1 + drift) · power(source) · scale`.
///
/// The power term is looked up by `signal.source`, which is usually a topic
/// or platform label rather than a node id. Misses fall back to
/// `power_default` and are logged. Returns the number of misses.
pub fn compute_narrative_stability_index(
    graph: &InfluenceGraph,
    signals: &mut [Signal],
    power_scores: &BTreeMap<String, f64>,
    power_default: f64,
    scale: f64,
) -> u32 {
    let mut misses = 0u32;

    for signal in signals.iter_mut() {
        let entropy_term = 1.0 - signal.entropy;
        let drift_term = 1.0 / (1.0 + signal.drift());
        let power_term = match power_scores.get(&signal.source) {
            Some(&score) => {
                signal.power_index = Some(score);
                score
            }
            None => {
                misses += 1;
                warn!(
                    signal_id = signal.id.as_str(),
                    source = signal.source.as_str(),
                    in_graph = graph.contains(&signal.source),
                    fallback = power_default,
                    "No power index for signal source, using default"
                );
                power_default
            }
        };
        signal.nsi_score = Some(round4(entropy_term * drift_term * power_term * scale));
    }

    info!(signals = signals.len(), misses, "Narrative stability index computed");
    misses
}

/// Averages per topic (the collector's topic hint, or the source).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicAggregate {
    pub signals: u32,
    pub avg_entropy: f64,
    pub avg_nsi: f64,
}

pub fn topic_aggregates(signals: &[Signal]) -> BTreeMap<String, TopicAggregate> {
    let mut sums: BTreeMap<String, (u32, f64, f64)> = BTreeMap::new();
    for signal in signals {
        let entry = sums.entry(signal.topic_or_source().to_string()).or_default();
        entry.0 += 1;
        entry.1 += signal.entropy;
        entry.2 += signal.nsi();
    }

    sums.into_iter()
        .map(|(topic, (n, entropy, nsi))| {
            let count = n as f64;
            (
                topic,
                TopicAggregate {
                    signals: n,
                    avg_entropy: round4(entropy / count),
                    avg_nsi: round4(nsi / count),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn signal(id: &str, source: &str, entropy: f64, velocity: f64, route: &[&str]) -> Signal {
        Signal::new(
            id,
            "",
            "",
            source,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            entropy,
            velocity,
        )
        .with_route(route.iter().copied())
    }

    #[test]
    fn three_hop_route_drift() {
        let mut signals = vec![signal("s1", "reddit", 0.4, 0.5, &["reddit", "user_1", "twitter"])];
        calculate_truth_drift(&mut signals);
        assert_eq!(signals[0].drift_score, Some(0.4));
    }

    #[test]
    fn short_routes_have_zero_drift() {
        let mut signals = vec![
            signal("s1", "x", 0.9, 0.9, &[]),
            signal("s2", "x", 0.9, 0.9, &["news_aggregator_ai"]),
        ];
        calculate_truth_drift(&mut signals);
        assert_eq!(signals[0].drift(), 0.0);
        assert_eq!(signals[1].drift(), 0.0);
    }

    #[test]
    fn nsi_uses_power_of_source_node() {
        let mut signals = vec![signal("s1", "reddit", 0.5, 0.5, &["reddit", "user_1"])];
        calculate_truth_drift(&mut signals); // drift = 0.25
        let scores = BTreeMap::from([("reddit".to_string(), 2.0)]);
        let misses =
            compute_narrative_stability_index(&InfluenceGraph::new(), &mut signals, &scores, 1.0, 10.0);
        assert_eq!(misses, 0);
        // 0.5 · (1/1.25) · 2.0 · 10 = 8.0
        assert_eq!(signals[0].nsi_score, Some(8.0));
        assert_eq!(signals[0].power_index, Some(2.0));
    }

    #[test]
    fn nsi_falls_back_to_default_on_source_miss() {
        let mut signals = vec![signal("s1", "worldnews", 0.2, 0.5, &[])];
        calculate_truth_drift(&mut signals);
        let scores = BTreeMap::new();

        compute_narrative_stability_index(&InfluenceGraph::new(), &mut signals, &scores, 1.0, 10.0);
        assert_eq!(signals[0].nsi_score, Some(8.0));
        assert_eq!(signals[0].power_index, None);

        compute_narrative_stability_index(&InfluenceGraph::new(), &mut signals, &scores, 0.0, 10.0);
        assert_eq!(signals[0].nsi_score, Some(0.0));
    }

    #[test]
    fn topic_aggregates_average_per_topic() {
        let mut a = signal("a", "worldnews", 0.2, 0.5, &[]);
        a.nsi_score = Some(4.0);
        let mut b = signal("b", "worldnews", 0.4, 0.5, &[]);
        b.nsi_score = Some(2.0);
        let c = signal("c", "newsapi", 0.1, 0.5, &[]).with_topic("ukraine");

        let aggregates = topic_aggregates(&[a, b, c]);
        assert_eq!(aggregates["worldnews"].signals, 2);
        assert_eq!(aggregates["worldnews"].avg_entropy, 0.3);
        assert_eq!(aggregates["worldnews"].avg_nsi, 3.0);
        assert_eq!(aggregates["ukraine"].avg_nsi, 0.0);
        assert!(!aggregates.contains_key("newsapi"));
    }
}
