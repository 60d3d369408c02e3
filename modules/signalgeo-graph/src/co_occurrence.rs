//! Co-occurrence memory: which mentionable nodes tend to be named together.
//!
//! Learned from signal text, normalized per node so each node's strongest
//! association has weight 1.0, and persisted between runs to seed route
//! inference for signals that arrive without a usable route.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use signalgeo_common::{
    round4, CoOccurrenceEntry, CoOccurrenceMap, KeywordMatcher, MatchMode, Result, SeedRegistry,
    Signal,
};

/// Matcher over the registry's influencer and institution ids.
pub fn mention_matcher(registry: &SeedRegistry, mode: MatchMode) -> Result<KeywordMatcher> {
    KeywordMatcher::new(registry.mentionable_ids(), mode)
}

/// Count pairwise co-mentions across all signals and normalize them.
///
/// Nodes never co-mentioned with another node are absent from the map.
pub fn track_co_occurrence(signals: &[Signal], mentions: &KeywordMatcher) -> CoOccurrenceMap {
    let mut raw: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

    for signal in signals {
        let present = mentions.present(&signal.text());
        if present.len() > 1 {
            debug!(signal_id = signal.id.as_str(), mentions = ?present, "Co-mentions found");
        }

        for i in 0..present.len() {
            for j in (i + 1)..present.len() {
                let (a, b) = (present[i], present[j]);
                *raw.entry(a.to_string()).or_default().entry(b.to_string()).or_default() += 1;
                *raw.entry(b.to_string()).or_default().entry(a.to_string()).or_default() += 1;
            }
        }
    }

    let map = normalize(raw);
    info!(signals = signals.len(), nodes = map.len(), "Co-occurrence memory built");
    map
}

fn normalize(raw: BTreeMap<String, BTreeMap<String, u32>>) -> CoOccurrenceMap {
    raw.into_iter()
        .map(|(node, neighbors)| {
            let max_count = neighbors.values().copied().max().unwrap_or(1).max(1);
            let entries = neighbors
                .into_iter()
                .map(|(neighbor, count)| {
                    let weight = round4(count as f64 / max_count as f64);
                    (neighbor, CoOccurrenceEntry { count, weight })
                })
                .collect();
            (node, entries)
        })
        .collect()
}

/// Rank nodes associated with any node id that appears as a whole token in
/// `text`. Each neighbor accumulates `weight * decay` per matching token;
/// ties keep the order in which neighbors were first reached.
///
/// Tokens are whitespace-split words, so only a token that is literally a
/// node id (`elon_musk`, not `Elon Musk`) triggers a lookup.
pub fn decay_weighted_lookup(text: &str, map: &CoOccurrenceMap, decay: f64) -> Vec<String> {
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for token in text.to_lowercase().split_whitespace() {
        let Some(neighbors) = map.get(token) else {
            continue;
        };
        for (target, entry) in neighbors {
            let idx = *slot.entry(target.clone()).or_insert_with(|| {
                order.push((target.clone(), 0.0));
                order.len() - 1
            });
            order[idx].1 += entry.weight * decay;
        }
    }

    // Stable sort keeps first-encountered order among equal scores.
    order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    order.into_iter().map(|(node, _)| node).collect()
}

/// Combine a persisted memory with a freshly learned one.
///
/// Nodes learned in this run replace their persisted rows wholesale. Every
/// other row drops its links to those nodes and is renormalized, so the merged
/// map stays symmetric. Rows left without neighbors are removed.
pub fn merge_memory(persisted: CoOccurrenceMap, fresh: &CoOccurrenceMap) -> CoOccurrenceMap {
    let kept: BTreeMap<String, BTreeMap<String, u32>> = persisted
        .into_iter()
        .filter(|(node, _)| !fresh.contains_key(node))
        .filter_map(|(node, neighbors)| {
            let before = neighbors.len();
            let remaining: BTreeMap<String, u32> = neighbors
                .into_iter()
                .filter(|(neighbor, _)| !fresh.contains_key(neighbor))
                .map(|(neighbor, entry)| (neighbor, entry.count))
                .collect();
            if remaining.is_empty() {
                return None;
            }
            if remaining.len() < before {
                debug!(
                    node = node.as_str(),
                    dropped = before - remaining.len(),
                    "Stale co-mentions dropped"
                );
            }
            Some((node, remaining))
        })
        .collect();

    let mut merged = normalize(kept);
    for (node, neighbors) in fresh {
        merged.insert(node.clone(), neighbors.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use signalgeo_common::{Node, NodeType};

    fn registry() -> SeedRegistry {
        SeedRegistry::from_nodes(vec![
            Node::new("a", NodeType::Influencer),
            Node::new("b", NodeType::Institution),
            Node::new("c", NodeType::Influencer),
            Node::new("d", NodeType::Institution),
            Node::new("reddit", NodeType::Platform),
        ])
        .unwrap()
    }

    fn signal(id: &str, content: &str) -> Signal {
        Signal::new(
            id,
            "",
            content,
            "test",
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            0.5,
            0.5,
        )
    }

    fn matcher() -> KeywordMatcher {
        mention_matcher(&registry(), MatchMode::WordBoundary).unwrap()
    }

    #[test]
    fn two_co_mentions_give_count_two_weight_one() {
        let signals = vec![signal("1", "a met b"), signal("2", "b and a again")];
        let map = track_co_occurrence(&signals, &matcher());
        assert_eq!(map["a"]["b"], CoOccurrenceEntry { count: 2, weight: 1.0 });
        assert_eq!(map["b"]["a"], CoOccurrenceEntry { count: 2, weight: 1.0 });
    }

    #[test]
    fn weights_are_relative_to_strongest_neighbor() {
        let signals = vec![
            signal("1", "a b"),
            signal("2", "a b"),
            signal("3", "a c"),
        ];
        let map = track_co_occurrence(&signals, &matcher());
        assert_eq!(map["a"]["b"].weight, 1.0);
        assert_eq!(map["a"]["c"].weight, 0.5);
        assert_eq!(map["c"]["a"].weight, 1.0);
    }

    #[test]
    fn platforms_are_not_mentionable() {
        let signals = vec![signal("1", "a on reddit")];
        let map = track_co_occurrence(&signals, &matcher());
        assert!(map.is_empty());
    }

    #[test]
    fn single_mentions_leave_node_absent() {
        let signals = vec![signal("1", "only a here")];
        assert!(track_co_occurrence(&signals, &matcher()).is_empty());
    }

    #[test]
    fn lookup_ranks_by_accumulated_weight() {
        let signals = vec![
            signal("1", "a b"),
            signal("2", "a b"),
            signal("3", "a c"),
        ];
        let map = track_co_occurrence(&signals, &matcher());
        let ranked = decay_weighted_lookup("news about a", &map, 0.85);
        assert_eq!(ranked, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn lookup_ignores_tokens_that_are_not_node_ids() {
        let signals = vec![signal("1", "a b")];
        let map = track_co_occurrence(&signals, &matcher());
        assert!(decay_weighted_lookup("nothing relevant", &map, 0.85).is_empty());
        assert!(decay_weighted_lookup("", &map, 0.85).is_empty());
    }

    #[test]
    fn lookup_ties_keep_first_encountered_order() {
        let signals = vec![signal("1", "a b"), signal("2", "a c")];
        let map = track_co_occurrence(&signals, &matcher());
        // Both neighbors of `a` weigh 1.0; `b` is reached first.
        assert_eq!(decay_weighted_lookup("a", &map, 0.85), vec!["b", "c"]);
    }

    #[test]
    fn merge_prefers_fresh_rows() {
        let old = track_co_occurrence(&[signal("1", "a c")], &matcher());
        let fresh = track_co_occurrence(&[signal("2", "a b")], &matcher());
        let merged = merge_memory(old, &fresh);
        assert!(merged["a"].contains_key("b"));
        assert!(!merged["a"].contains_key("c"));
        // `c` lost its only link when `a` was relearned.
        assert!(!merged.contains_key("c"));
    }

    #[test]
    fn merge_renormalizes_rows_that_lose_a_neighbor() {
        // c: a ×2, b ×1 persisted; a is relearned with d only
        let old = track_co_occurrence(
            &[signal("1", "a c"), signal("2", "a c"), signal("3", "b c")],
            &matcher(),
        );
        let fresh = track_co_occurrence(&[signal("4", "a d")], &matcher());
        let merged = merge_memory(old, &fresh);

        assert!(!merged["c"].contains_key("a"));
        assert_eq!(merged["c"]["b"], CoOccurrenceEntry { count: 1, weight: 1.0 });
        assert_eq!(merged["a"].keys().collect::<Vec<_>>(), vec!["d"]);
        for (x, neighbors) in &merged {
            for (y, entry) in neighbors {
                assert_eq!(merged[y][x].count, entry.count, "{x} <-> {y}");
            }
        }
    }

    #[test]
    fn substring_mode_counts_ids_inside_longer_words() {
        let registry = SeedRegistry::from_nodes(vec![
            Node::new("xi", NodeType::Influencer),
            Node::new("nyt", NodeType::Institution),
        ])
        .unwrap();
        let substring = mention_matcher(&registry, MatchMode::Substring).unwrap();
        let signals = vec![signal("1", "taxi strike covered by nyt")];

        let map = track_co_occurrence(&signals, &substring);
        assert_eq!(map["xi"]["nyt"], CoOccurrenceEntry { count: 1, weight: 1.0 });

        let whole_words = mention_matcher(&registry, MatchMode::WordBoundary).unwrap();
        assert!(track_co_occurrence(&signals, &whole_words).is_empty());
    }
}
