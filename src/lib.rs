//! Point-to-point movement analysis across repeated surveys.
//!
//! This crate provides tools for:
//! - Loading survey CSV files of `time, id, x, y, z` observations
//! - Grouping observations by point id and ordering them by survey time
//! - Computing distance, elevation change and azimuth between consecutive
//!   surveys and between each point's first and last survey
//! - Exporting movement tables, point and line layers, and a movement plot
//!
//! # Example
//!
//! ```no_run
//! use survey_movement::{core::loaders::load_observations_csv, processors::compute_changes};
//! use survey_movement::InputConfig;
//!
//! let observations = load_observations_csv("survey.csv", &InputConfig::default()).unwrap();
//! let tables = compute_changes(&observations).unwrap();
//! println!("{} interval changes", tables.interval.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{
    DuplicatePolicy, GroupingConfig, InputConfig, MetricsConfig, MovementConfig, OutputConfig,
    PlotConfig,
};
pub use self::core::observation::{MovementRecord, Observation, ObservationGroup, PointId, SurveyTime};
pub use processors::{compute_changes, compute_pair_metrics, ChangeTables};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
