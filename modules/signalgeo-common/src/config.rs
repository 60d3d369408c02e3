use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SignalGeoError};
use crate::vocab::{KeywordMatcher, MatchMode};

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Optional TOML file with `PipelineConfig` overrides.
    pub config_path: Option<PathBuf>,
    /// Persisted co-occurrence memory, read before and written after a run.
    pub co_memory_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir =
            PathBuf::from(env::var("SIGNALGEO_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let co_memory_path = env::var("SIGNALGEO_CO_MEMORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("co_occurrence_map.json"));
        Self {
            config_path: env::var("SIGNALGEO_CONFIG").ok().map(PathBuf::from),
            data_dir,
            co_memory_path,
        }
    }

    pub fn log(&self) {
        info!(
            data_dir = %self.data_dir.display(),
            config = ?self.config_path,
            co_memory = %self.co_memory_path.display(),
            "Configuration loaded"
        );
    }
}

/// Weights of the power-index linear combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerWeights {
    pub in_degree: f64,
    pub out_degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
}

impl Default for PowerWeights {
    fn default() -> Self {
        Self {
            in_degree: 1.0,
            out_degree: 1.2,
            betweenness: 2.0,
            closeness: 1.5,
        }
    }
}

/// Tuning for one pipeline run. Every field has a default, so a TOML file only
/// needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Multiplier applied to each co-occurrence weight during lookup.
    pub decay: f64,
    /// Router hops placed in front of an inferred node.
    pub placeholder_route: Vec<String>,
    /// Power term used by the stability index when `signal.source` is not a
    /// graph node.
    pub power_default: f64,
    pub match_mode: MatchMode,
    pub power_weights: PowerWeights,
    pub hop_seconds: f64,
    pub min_delay_factor: f64,
    pub nsi_scale: f64,
    pub recursion_keywords: Vec<String>,
    pub contradiction_keywords: Vec<String>,
    /// Run bridge reinforcement on every route after resolution.
    pub reinforce_bridges: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decay: 0.85,
            placeholder_route: vec!["reddit_thread".to_string(), "user_1".to_string()],
            power_default: 1.0,
            match_mode: MatchMode::Substring,
            power_weights: PowerWeights::default(),
            hop_seconds: 30.0,
            min_delay_factor: 0.1,
            nsi_scale: 10.0,
            recursion_keywords: [
                "twitter", "reddit", "youtube", "facebook", "tiktok", "whatsapp",
                "elon musk", "tweet", "thread", "trending", "viral",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            contradiction_keywords: [
                "not", "no", "never", "false", "fake", "hoax", "debunked", "refuted",
                "misleading", "incorrect",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            reinforce_bridges: true,
        }
    }
}

impl PipelineConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SignalGeoError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| SignalGeoError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SignalGeoError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(SignalGeoError::Config(format!(
                "decay {} outside [0, 1]",
                self.decay
            )));
        }
        if self.hop_seconds < 0.0 || self.min_delay_factor < 0.0 {
            return Err(SignalGeoError::Config(
                "hop_seconds and min_delay_factor must be non-negative".into(),
            ));
        }
        Ok(())
    }

    pub fn recursion_matcher(&self) -> Result<KeywordMatcher> {
        KeywordMatcher::new(&self.recursion_keywords, self.match_mode)
    }

    pub fn contradiction_matcher(&self) -> Result<KeywordMatcher> {
        KeywordMatcher::new(&self.contradiction_keywords, self.match_mode)
    }
}
