//! Statistics for broadcasters

pub mod metrics;

pub use metrics::BroadcasterStats;
pub(crate) use metrics::Counters;
