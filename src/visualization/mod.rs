//! Plan-view plot of point movement.
//!
//! Each point id is drawn as a polyline through its surveys in time order,
//! with a dot at every surveyed position.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::core::observation::ObservationGroup;
use crate::core::writers::{ensure_parent_dirs, WriteError};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error(transparent)]
    Output(#[from] WriteError),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("No observations to plot")]
    NothingToPlot,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Color palette cycled over point ids.
const PATH_COLORS: &[(u8, u8, u8)] = &[
    (228, 26, 28),   // Red
    (55, 126, 184),  // Blue
    (77, 175, 74),   // Green
    (152, 78, 163),  // Purple
    (255, 127, 0),   // Orange
    (166, 86, 40),   // Brown
    (247, 129, 191), // Pink
    (0, 206, 209),   // Turquoise
    (138, 43, 226),  // Blue Violet
    (255, 215, 0),   // Gold
];

/// Color for the `index`-th group.
fn path_color(index: usize) -> RGBColor {
    let (r, g, b) = PATH_COLORS[index % PATH_COLORS.len()];
    RGBColor(r, g, b)
}

/// Plot movement paths of every group and save as PNG.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image (parent directories are created)
/// * `groups` - Time-ordered observations per point
/// * `config` - Image size and vertex radius
pub fn plot_movement(output_path: &Path, groups: &[ObservationGroup], config: &PlotConfig) -> Result<()> {
    if groups.is_empty() {
        return Err(VisualizationError::NothingToPlot);
    }

    let paths: Vec<Vec<(f64, f64)>> = groups
        .iter()
        .map(|g| g.observations().iter().map(|o| (o.x, o.y)).collect())
        .collect();

    let (x_min, x_max, y_min, y_max) = compute_bounds(&paths);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    ensure_parent_dirs(output_path)?;

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();

    root.fill(&WHITE).map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    // Lines first so vertices stay visible on top
    chart
        .draw_series(
            paths
                .iter()
                .enumerate()
                .filter(|(_, path)| path.len() > 1)
                .map(|(i, path)| PathElement::new(path.clone(), path_color(i).stroke_width(2))),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let radius = config.point_radius as i32;
    chart
        .draw_series(paths.iter().enumerate().flat_map(|(i, path)| {
            let color = path_color(i);
            path.iter()
                .map(move |&(x, y)| Circle::new((x, y), radius, color.filled()))
        }))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present().map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Compute the bounds (min/max) for x and y over all paths.
///
/// A zero extent on either axis is widened by one unit each side.
fn compute_bounds(paths: &[Vec<(f64, f64)>]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in paths.iter().flatten() {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}
