//! Contradiction analysis across topics.
//!
//! Heuristic: two signals from different topics contradict each other when
//! exactly one of them uses refutation language ("fake", "debunked", ...).

use tracing::info;

use signalgeo_common::{KeywordMatcher, Signal};

/// Flag every cross-topic pair where exactly one content carries a
/// contradiction keyword. Both signals of a pair get `is_contradiction`.
/// Returns the pairs as `(earlier id, later id)` in input order.
pub fn detect_contradictions(
    signals: &mut [Signal],
    keywords: &KeywordMatcher,
) -> Vec<(String, String)> {
    let refuting: Vec<bool> = signals.iter().map(|s| keywords.any(&s.content)).collect();
    let mut pairs = Vec::new();

    for i in 0..signals.len() {
        for j in (i + 1)..signals.len() {
            if signals[i].topic_or_source() == signals[j].topic_or_source() {
                continue;
            }
            if refuting[i] != refuting[j] {
                pairs.push((signals[i].id.clone(), signals[j].id.clone()));
            }
        }
    }

    for (a, b) in &pairs {
        for signal in signals.iter_mut() {
            if &signal.id == a || &signal.id == b {
                signal.is_contradiction = true;
            }
        }
    }

    info!(pairs = pairs.len(), "Contradiction analysis complete");
    pairs
}
