//! Movement computation: grouping, pairing and metrics.

pub mod changes;
pub mod grouping;
pub mod metrics;
pub mod pairing;

// Re-export key types for convenience
pub use changes::{compute_changes, compute_changes_with, ChangeError, ChangeTables};
pub use grouping::group_observations;
pub use metrics::{compute_pair_metrics, compute_pair_metrics_with};
pub use pairing::{interval_pairs, total_pair};
