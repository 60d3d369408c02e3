use chrono::Duration;
use tracing::info;

use signalgeo_common::{Signal, TimelineRow};

/// Simulated arrival of each signal at each node of its route.
///
/// `delay_factor = max(min_delay_factor, (1 − velocity + entropy) / 2)` and the
/// node at position `i` is reached `i · hop_seconds · delay_factor` seconds
/// after the signal's timestamp, truncated to whole seconds. Rows follow route
/// order per signal and are not sorted by time.
pub fn simulate_propagation(
    signals: &[Signal],
    hop_seconds: f64,
    min_delay_factor: f64,
) -> Vec<TimelineRow> {
    let mut timeline = Vec::new();

    for signal in signals {
        let delay_factor = ((1.0 - signal.velocity + signal.entropy) / 2.0).max(min_delay_factor);
        for (i, node) in signal.route.iter().enumerate() {
            let delay = (i as f64 * hop_seconds * delay_factor).trunc() as i64;
            timeline.push(TimelineRow {
                signal_id: signal.id.clone(),
                node: node.clone(),
                arrival_time: signal.timestamp + Duration::seconds(delay),
            });
        }
    }

    info!(rows = timeline.len(), "Propagation timeline simulated");
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn signal(id: &str, entropy: f64, velocity: f64, route: &[&str]) -> Signal {
        Signal::new(
            id,
            "",
            "",
            "reddit",
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            entropy,
            velocity,
        )
        .with_route(route.iter().copied())
    }

    #[test]
    fn one_row_per_route_position() {
        let rows = simulate_propagation(
            &[
                signal("s1", 0.5, 0.5, &["a", "b", "c"]),
                signal("s2", 0.5, 0.5, &[]),
                signal("s3", 0.5, 0.5, &["d"]),
            ],
            30.0,
            0.1,
        );
        let ids: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.signal_id.as_str(), r.node.as_str()))
            .collect();
        assert_eq!(ids, vec![("s1", "a"), ("s1", "b"), ("s1", "c"), ("s3", "d")]);
    }

    #[test]
    fn arrival_spacing_follows_delay_factor() {
        // delay factor (1 − 0.5 + 0.5) / 2 = 0.5 → 15s per hop
        let rows = simulate_propagation(&[signal("s1", 0.5, 0.5, &["a", "b", "c"])], 30.0, 0.1);
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(rows[0].arrival_time, start);
        assert_eq!(rows[1].arrival_time, start + Duration::seconds(15));
        assert_eq!(rows[2].arrival_time, start + Duration::seconds(30));
    }

    #[test]
    fn fast_calm_signals_are_floored() {
        // (1 − 1.0 + 0.0) / 2 = 0 → floored at 0.1 → 3s per hop
        let rows = simulate_propagation(&[signal("s1", 0.0, 1.0, &["a", "b"])], 30.0, 0.1);
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(rows[1].arrival_time, start + Duration::seconds(3));
    }
}
