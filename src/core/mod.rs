//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod log;
pub mod market;
pub mod poller;
pub mod projection;

// Re-export main types for cleaner imports
pub use market::{
    HistoricalSeries, HistoryFeed, MarketFeed, MarketSnapshot, SentimentFeed, SentimentSnapshot,
    TimeRange,
};
pub use poller::{MarketPoller, PollingHandle, RefreshOutcome};
pub use projection::{GrowthScenario, Projection, ProjectionInput};
