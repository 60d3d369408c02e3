//! Route resolution: fill in routes that arrived empty or single-hop, and
//! reinforce known cross-platform transitions with an observed bridge node.

use tracing::debug;

use signalgeo_common::{BridgeNodes, CoOccurrenceMap, Signal, TransitionMap};

use crate::bridges::top_transition_from;
use crate::co_occurrence::decay_weighted_lookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Route already had more than one hop; nothing was touched.
    AlreadyRouted,
    /// Route was short and has been rewritten.
    Resolved,
    /// Route was short and no inference applied; it is unchanged.
    Unresolved,
}

/// Infers missing routes from co-occurrence memory and, when configured,
/// from cross-platform transition statistics.
pub struct RouteResolver<'a> {
    co_map: &'a CoOccurrenceMap,
    decay: f64,
    placeholder: &'a [String],
    cross_platform: Option<(&'a TransitionMap, &'a BridgeNodes)>,
}

impl<'a> RouteResolver<'a> {
    pub fn new(co_map: &'a CoOccurrenceMap, decay: f64, placeholder: &'a [String]) -> Self {
        Self {
            co_map,
            decay,
            placeholder,
            cross_platform: None,
        }
    }

    pub fn with_cross_platform(
        mut self,
        transitions: &'a TransitionMap,
        bridges: &'a BridgeNodes,
    ) -> Self {
        self.cross_platform = Some((transitions, bridges));
        self
    }

    /// Resolve a route of length ≤ 1 in place. Routes with more than one hop
    /// are left alone, so calling this again on a resolved signal is a no-op.
    ///
    /// 1. Co-occurrence: the top node ranked by `decay_weighted_lookup` over
    ///    the signal text replaces the route, behind the placeholder hops.
    /// 2. Cross-platform hop: the most frequent transition out of the
    ///    signal's source platform appends an unused bridge node and then the
    ///    target platform.
    pub fn resolve(&self, signal: &mut Signal) -> ResolveOutcome {
        if signal.route.len() > 1 {
            return ResolveOutcome::AlreadyRouted;
        }
        let before = signal.route.clone();

        let inferred = decay_weighted_lookup(&signal.text(), self.co_map, self.decay);
        if let Some(top) = inferred.first() {
            let mut route = self.placeholder.to_vec();
            route.push(top.clone());
            signal.route = route;
        }

        if let Some((transitions, bridges)) = self.cross_platform {
            let origin = signal.source.to_lowercase();
            if let Some(target) = top_transition_from(transitions, &origin) {
                let bridge = bridges
                    .iter()
                    .find(|b| b.as_str() != target && !signal.route.contains(*b))
                    .cloned();
                if let Some(bridge) = bridge {
                    signal.route.push(bridge);
                }
                if signal.route.last().map(String::as_str) != Some(target) {
                    signal.route.push(target.to_string());
                }
            }
        }

        if signal.route == before {
            ResolveOutcome::Unresolved
        } else {
            debug!(
                signal_id = signal.id.as_str(),
                route = ?signal.route,
                "Route resolved"
            );
            ResolveOutcome::Resolved
        }
    }
}

/// Insert at most one bridge node after the first adjacent pair that is a
/// known transition. The pair is skipped when the hop right after it is
/// already a bridge. The inserted node is the first bridge (in id order) not
/// yet on the route. Returns the inserted node.
pub fn reinforce_cross_platform_bridges(
    signal: &mut Signal,
    transitions: &TransitionMap,
    bridges: &BridgeNodes,
) -> Option<String> {
    let route = &mut signal.route;

    for i in 0..route.len().saturating_sub(1) {
        let pair = (route[i].clone(), route[i + 1].clone());
        if !transitions.contains_key(&pair) {
            continue;
        }
        if route.get(i + 2).is_some_and(|next| bridges.contains(next)) {
            continue;
        }

        let bridge = bridges.iter().find(|b| !route.contains(*b))?.clone();
        route.insert(i + 2, bridge.clone());
        debug!(
            signal_id = signal.id.as_str(),
            bridge = bridge.as_str(),
            after = ?pair,
            "Bridge reinforced"
        );
        return Some(bridge);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use signalgeo_common::CoOccurrenceEntry;

    fn signal(source: &str, content: &str, route: &[&str]) -> Signal {
        Signal::new(
            "s1",
            "",
            content,
            source,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            0.5,
            0.5,
        )
        .with_route(route.iter().copied())
    }

    fn co_map() -> CoOccurrenceMap {
        let mut map = CoOccurrenceMap::new();
        map.entry("trump".into()).or_default().insert(
            "elon_musk".into(),
            CoOccurrenceEntry { count: 3, weight: 1.0 },
        );
        map.entry("trump".into()).or_default().insert(
            "nyt".into(),
            CoOccurrenceEntry { count: 1, weight: 0.3333 },
        );
        map
    }

    fn placeholder() -> Vec<String> {
        vec!["reddit_thread".into(), "user_1".into()]
    }

    fn transitions(entries: &[(&str, &str, u32)]) -> TransitionMap {
        entries
            .iter()
            .map(|(a, b, n)| ((a.to_string(), b.to_string()), *n))
            .collect()
    }

    fn bridges(ids: &[&str]) -> BridgeNodes {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_route_is_inferred_from_co_occurrence() {
        let map = co_map();
        let ph = placeholder();
        let mut s = signal("worldnews", "statement by trump today", &[]);
        let outcome = RouteResolver::new(&map, 0.85, &ph).resolve(&mut s);
        assert_eq!(outcome, ResolveOutcome::Resolved);
        assert_eq!(s.route, vec!["reddit_thread", "user_1", "elon_musk"]);
    }

    #[test]
    fn single_hop_route_is_replaced_when_inference_succeeds() {
        let map = co_map();
        let ph = placeholder();
        let mut s = signal("newsapi", "trump again", &["news_aggregator_ai"]);
        RouteResolver::new(&map, 0.85, &ph).resolve(&mut s);
        assert_eq!(s.route, vec!["reddit_thread", "user_1", "elon_musk"]);
    }

    #[test]
    fn unresolvable_route_is_left_as_received() {
        let map = co_map();
        let ph = placeholder();
        let mut s = signal("newsapi", "nothing to see", &["news_aggregator_ai"]);
        let outcome = RouteResolver::new(&map, 0.85, &ph).resolve(&mut s);
        assert_eq!(outcome, ResolveOutcome::Unresolved);
        assert_eq!(s.route, vec!["news_aggregator_ai"]);
    }

    #[test]
    fn resolution_is_idempotent_once_routed() {
        let map = co_map();
        let ph = placeholder();
        let t = transitions(&[("worldnews", "twitter", 2)]);
        let b = bridges(&["user_2"]);
        let resolver = RouteResolver::new(&map, 0.85, &ph).with_cross_platform(&t, &b);

        let mut s = signal("worldnews", "trump", &[]);
        resolver.resolve(&mut s);
        let first = s.route.clone();
        assert_eq!(resolver.resolve(&mut s), ResolveOutcome::AlreadyRouted);
        assert_eq!(s.route, first);
    }

    #[test]
    fn cross_platform_hop_appends_bridge_then_target() {
        let map = CoOccurrenceMap::new();
        let ph = placeholder();
        let t = transitions(&[("reddit", "twitter", 3), ("reddit", "youtube", 1)]);
        let b = bridges(&["user_1", "user_2"]);
        let mut s = signal("Reddit", "no mentions", &["reddit"]);
        RouteResolver::new(&map, 0.85, &ph)
            .with_cross_platform(&t, &b)
            .resolve(&mut s);
        assert_eq!(s.route, vec!["reddit", "user_1", "twitter"]);
    }

    #[test]
    fn cross_platform_hop_skips_bridges_already_on_route() {
        let map = co_map();
        let ph = placeholder();
        let t = transitions(&[("reddit", "twitter", 3)]);
        let b = bridges(&["user_1", "user_2"]);
        let mut s = signal("reddit", "trump", &[]);
        RouteResolver::new(&map, 0.85, &ph)
            .with_cross_platform(&t, &b)
            .resolve(&mut s);
        assert_eq!(
            s.route,
            vec!["reddit_thread", "user_1", "elon_musk", "user_2", "twitter"]
        );
    }

    #[test]
    fn unknown_source_platform_leaves_route_unchanged() {
        let map = CoOccurrenceMap::new();
        let ph = placeholder();
        let t = transitions(&[("reddit", "twitter", 3)]);
        let b = bridges(&["user_1"]);
        let mut s = signal("youtube", "no mentions", &[]);
        let outcome = RouteResolver::new(&map, 0.85, &ph)
            .with_cross_platform(&t, &b)
            .resolve(&mut s);
        assert_eq!(outcome, ResolveOutcome::Unresolved);
        assert!(s.route.is_empty());
    }

    #[test]
    fn reinforce_inserts_one_bridge_after_first_known_pair() {
        let t = transitions(&[("reddit", "twitter", 3), ("twitter", "youtube", 1)]);
        let b = bridges(&["user_1", "user_2"]);
        let mut s = signal("reddit", "", &["reddit", "twitter", "youtube"]);
        let inserted = reinforce_cross_platform_bridges(&mut s, &t, &b);
        assert_eq!(inserted.as_deref(), Some("user_1"));
        assert_eq!(s.route, vec!["reddit", "twitter", "user_1", "youtube"]);
    }

    #[test]
    fn reinforce_skips_pair_already_followed_by_bridge() {
        let t = transitions(&[("reddit", "twitter", 3), ("user_1", "youtube", 1)]);
        let b = bridges(&["user_1", "user_2"]);
        let mut s = signal("reddit", "", &["reddit", "twitter", "user_1", "youtube"]);
        let inserted = reinforce_cross_platform_bridges(&mut s, &t, &b);
        assert_eq!(inserted.as_deref(), Some("user_2"));
        assert_eq!(s.route, vec!["reddit", "twitter", "user_1", "youtube", "user_2"]);
    }

    #[test]
    fn reinforce_does_nothing_without_unused_bridge() {
        let t = transitions(&[("reddit", "twitter", 3)]);
        let b = bridges(&["user_1"]);
        let mut s = signal("reddit", "", &["user_1", "reddit", "twitter"]);
        assert_eq!(reinforce_cross_platform_bridges(&mut s, &t, &b), None);
        assert_eq!(s.route, vec!["user_1", "reddit", "twitter"]);
    }

    #[test]
    fn repeated_reinforcement_grows_route_by_at_most_one() {
        let t = transitions(&[("reddit", "twitter", 3)]);
        let b = bridges(&["user_1", "user_2", "user_3"]);
        let mut s = signal("reddit", "", &["reddit", "twitter"]);
        for _ in 0..5 {
            let before = s.route.len();
            let inserted = reinforce_cross_platform_bridges(&mut s, &t, &b);
            assert!(s.route.len() <= before + 1);
            if let Some(node) = inserted {
                assert!(b.contains(&node));
            }
        }
        // Once the pair is followed by a bridge it is never reinforced again.
        assert_eq!(s.route, vec!["reddit", "twitter", "user_1"]);
    }
}
