//! Recursion detection: signals whose content references platforms or
//! meta-reactions ("trending", "viral", ...), and the nodes their routes touch.

use std::collections::BTreeSet;

use tracing::info;

use signalgeo_common::{KeywordMatcher, Signal};

/// Set `recursive_depth` to the number of keyword occurrences in the content
/// and `is_recursive` to `depth > 0`.
pub fn assign_recursive_depth(signal: &mut Signal, keywords: &KeywordMatcher) {
    let depth = keywords.count(&signal.content);
    signal.recursive_depth = depth;
    signal.is_recursive = depth > 0;
}

/// Score every signal and return the union of the routes of recursive ones.
pub fn detect_recursion(signals: &mut [Signal], keywords: &KeywordMatcher) -> BTreeSet<String> {
    let mut nodes = BTreeSet::new();
    let mut recursive = 0u32;

    for signal in signals.iter_mut() {
        assign_recursive_depth(signal, keywords);
        if signal.is_recursive {
            recursive += 1;
            nodes.extend(signal.route.iter().cloned());
            info!(
                signal_id = signal.id.as_str(),
                depth = signal.recursive_depth,
                "Recursive signal"
            );
        }
    }

    info!(
        recursive,
        total = signals.len(),
        nodes = nodes.len(),
        "Recursion detection complete"
    );
    nodes
}
