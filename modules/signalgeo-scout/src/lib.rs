pub mod estimate;
pub mod posts;
pub mod sources;

pub use posts::{RawPost, RawPostFileSource};
pub use sources::{collect_signals, CollectStats, JsonFileSource, SignalSource};
