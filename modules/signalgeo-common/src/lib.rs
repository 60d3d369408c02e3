pub mod config;
pub mod error;
pub mod seeds;
pub mod types;
pub mod vocab;

pub use config::{Config, PipelineConfig, PowerWeights};
pub use error::{Result, SignalGeoError};
pub use seeds::SeedRegistry;
pub use types::*;
pub use vocab::{KeywordMatcher, MatchMode};
