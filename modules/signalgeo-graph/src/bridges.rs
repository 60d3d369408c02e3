//! Cross-platform transition statistics learned from existing routes.

use tracing::info;

use signalgeo_common::{BridgeNodes, SeedRegistry, Signal, TransitionMap};

/// Learn platform→platform transition counts and the nodes seen bridging two
/// platforms.
///
/// Transitions come from each route's platform-only subsequence (consecutive
/// distinct pairs). Bridges come from the full route: whenever positions `i`
/// and `i + 2` are both platforms, the node at `i + 1` is a bridge whatever its
/// type.
pub fn detect_cross_platform_bridges(
    signals: &[Signal],
    registry: &SeedRegistry,
) -> (TransitionMap, BridgeNodes) {
    let platforms = registry.platform_ids();
    let mut transitions = TransitionMap::new();
    let mut bridges = BridgeNodes::new();

    for signal in signals {
        let platform_hops: Vec<&String> = signal
            .route
            .iter()
            .filter(|id| platforms.contains(*id))
            .collect();

        for pair in platform_hops.windows(2) {
            if pair[0] != pair[1] {
                *transitions
                    .entry((pair[0].clone(), pair[1].clone()))
                    .or_insert(0) += 1;
            }
        }

        for window in signal.route.windows(3) {
            if platforms.contains(&window[0]) && platforms.contains(&window[2]) {
                bridges.insert(window[1].clone());
            }
        }
    }

    info!(
        transitions = transitions.len(),
        bridges = bridges.len(),
        "Cross-platform bridges detected"
    );
    (transitions, bridges)
}

/// Most frequent target reachable from `origin`. Ties go to the
/// lexicographically smallest target.
pub fn top_transition_from<'a>(transitions: &'a TransitionMap, origin: &str) -> Option<&'a str> {
    transitions
        .iter()
        .filter(|((from, _), _)| from == origin)
        .fold(None::<(&'a str, u32)>, |best, ((_, to), &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((to.as_str(), count)),
        })
        .map(|(to, _)| to)
}
