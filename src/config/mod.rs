//! Configuration types for the movement analysis.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How input CSV files are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Whether the first row is a header (survey exports usually have none)
    #[serde(default)]
    pub has_headers: bool,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            has_headers: false,
            delimiter: default_delimiter(),
        }
    }
}

/// Rounding applied to derived movement metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Decimal places kept for planar distance
    #[serde(default = "default_linear_decimals")]
    pub distance_decimals: u32,

    /// Decimal places kept for elevation change
    #[serde(default = "default_linear_decimals")]
    pub delta_z_decimals: u32,

    /// Decimal places kept for azimuth (whole degrees by default)
    #[serde(default)]
    pub azimuth_decimals: u32,
}

fn default_linear_decimals() -> u32 {
    3
}

/// Finest rounding accepted for any metric; beyond this `f64` has no digits left.
pub const MAX_DECIMALS: u32 = 12;

impl MetricsConfig {
    /// Check that every decimal count is at most [`MAX_DECIMALS`].
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("distance_decimals", self.distance_decimals),
            ("delta_z_decimals", self.delta_z_decimals),
            ("azimuth_decimals", self.azimuth_decimals),
        ] {
            if value > MAX_DECIMALS {
                return Err(format!(
                    "metrics.{} is {}, the maximum is {}",
                    name, value, MAX_DECIMALS
                ));
            }
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            distance_decimals: default_linear_decimals(),
            delta_z_decimals: default_linear_decimals(),
            azimuth_decimals: 0,
        }
    }
}

/// What to do when one point has two observations with the same survey time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the batch
    #[default]
    Reject,
    /// Keep both, ordered as they appeared in the input
    KeepInputOrder,
}

/// Configuration for grouping observations by point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

/// Output file naming and overwrite behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Replace existing output files
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,

    #[serde(default = "default_interval_suffix")]
    pub interval_suffix: String,

    #[serde(default = "default_total_suffix")]
    pub total_suffix: String,

    #[serde(default = "default_points_suffix")]
    pub points_suffix: String,

    #[serde(default = "default_lines_suffix")]
    pub lines_suffix: String,

    #[serde(default = "default_plot_suffix")]
    pub plot_suffix: String,
}

fn default_overwrite() -> bool {
    true
}

fn default_interval_suffix() -> String {
    "_InterSurveyData.csv".to_string()
}

fn default_total_suffix() -> String {
    "_TotalSurveyData.csv".to_string()
}

fn default_points_suffix() -> String {
    "_MovementPoints.csv".to_string()
}

fn default_lines_suffix() -> String {
    "_MovementLine.csv".to_string()
}

fn default_plot_suffix() -> String {
    "_Movement.png".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            overwrite: default_overwrite(),
            interval_suffix: default_interval_suffix(),
            total_suffix: default_total_suffix(),
            points_suffix: default_points_suffix(),
            lines_suffix: default_lines_suffix(),
            plot_suffix: default_plot_suffix(),
        }
    }
}

/// Configuration for the movement plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Render the PNG as part of `compare`
    #[serde(default = "default_plot_enabled")]
    pub enabled: bool,

    #[serde(default = "default_plot_width")]
    pub width: u32,

    #[serde(default = "default_plot_height")]
    pub height: u32,

    /// Radius of survey vertices in pixels
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,
}

fn default_plot_enabled() -> bool {
    true
}

fn default_plot_width() -> u32 {
    1600
}

fn default_plot_height() -> u32 {
    1200
}

fn default_point_radius() -> u32 {
    3
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: default_plot_enabled(),
            width: default_plot_width(),
            height: default_plot_height(),
            point_radius: default_point_radius(),
        }
    }
}

/// Main configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl MovementConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: MovementConfig = serde_yaml::from_str(&content)?;
        config.metrics.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
