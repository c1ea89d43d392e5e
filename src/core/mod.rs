//! Core data types and I/O operations.

pub mod loaders;
pub mod observation;
pub mod writers;

pub use loaders::{load_observations_csv, parse_observations, LoaderError};
pub use observation::{
    IdKind, MovementRecord, Observation, ObservationGroup, PointId, SurveyTime,
};
pub use writers::{write_changes_csv, write_lines_csv, write_points_csv, OutputPaths, WriteError};
