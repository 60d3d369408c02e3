// Signal acquisition boundary.
//
// A SignalSource yields a batch of signal records from somewhere outside the
// engine (a collector dump, an API, a fixture). collect_signals gathers every
// source concurrently; one failing source never fails the run.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use signalgeo_common::Signal;

#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Signal>>;
}

/// A JSON array of signal records on disk.
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
        }
    }
}

#[async_trait]
impl SignalSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let signals: Vec<Signal> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse signals in {}", self.path.display()))?;
        Ok(signals)
    }
}

/// Stats from one collection pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectStats {
    pub sources_ok: u32,
    pub sources_failed: u32,
    pub signals_fetched: u32,
    pub signals_invalid: u32,
    pub signals_duplicate: u32,
    pub short_routes: u32,
}

/// Fetch every source concurrently and merge the results in source order.
///
/// A failed source contributes nothing. Records failing validation and
/// repeated ids (first one wins) are dropped with a warning.
pub async fn collect_signals(sources: &[Box<dyn SignalSource>]) -> (Vec<Signal>, CollectStats) {
    let results = join_all(sources.iter().map(|source| source.fetch())).await;

    let mut stats = CollectStats::default();
    let mut seen = HashSet::new();
    let mut signals = Vec::new();

    for (source, result) in sources.iter().zip(results) {
        let batch = match result {
            Ok(batch) => {
                stats.sources_ok += 1;
                info!(source = source.name(), signals = batch.len(), "Source fetched");
                batch
            }
            Err(e) => {
                stats.sources_failed += 1;
                warn!(source = source.name(), error = ?e, "Source failed, skipping");
                continue;
            }
        };

        for signal in batch {
            stats.signals_fetched += 1;
            if let Err(e) = signal.validate() {
                stats.signals_invalid += 1;
                warn!(source = source.name(), error = %e, "Dropping invalid signal");
                continue;
            }
            if !seen.insert(signal.id.clone()) {
                stats.signals_duplicate += 1;
                warn!(signal_id = signal.id.as_str(), "Dropping duplicate signal id");
                continue;
            }
            if signal.route.len() < 2 {
                stats.short_routes += 1;
                warn!(
                    signal_id = signal.id.as_str(),
                    hops = signal.route.len(),
                    "Signal arrived with an incomplete route"
                );
            }
            signals.push(signal);
        }
    }

    info!(
        sources_ok = stats.sources_ok,
        sources_failed = stats.sources_failed,
        signals = signals.len(),
        "Signal collection complete"
    );
    (signals, stats)
}
