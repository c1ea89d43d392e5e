//! Movement metrics for a pair of observations.
//!
//! Azimuths follow the surveying convention: degrees clockwise from the
//! y-axis (grid north), which is why `atan2` takes `(dx, dy)` rather than the
//! mathematical `(dy, dx)`.

use crate::config::{MetricsConfig, MAX_DECIMALS};
use crate::core::observation::{MovementRecord, Observation};

/// Round to `decimals` places, ties to even.
///
/// `decimals` is capped at [`MAX_DECIMALS`]. Values too large to scale are
/// returned unchanged. Negative zero is returned as `0.0`.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value + 0.0;
    }
    // Adding 0.0 turns -0.0 into 0.0
    scaled.round_ties_even() / factor + 0.0
}

/// Planar Euclidean distance between two points.
#[inline]
pub fn planar_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// Unrounded bearing of the displacement `(dx, dy)` in degrees, in (-180, 180].
///
/// Zero displacement has no direction; it is defined as 0.
#[inline]
pub fn azimuth_degrees(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    dx.atan2(dy).to_degrees()
}

/// Round a raw azimuth and shift it into [0, 360).
///
/// A bearing a hair below zero can land on exactly 360 after the shift; it
/// wraps to 0.
pub fn normalize_azimuth(raw_degrees: f64, decimals: u32) -> f64 {
    let rounded = round_to(raw_degrees, decimals);
    let shifted = if rounded < 0.0 { rounded + 360.0 } else { rounded };
    if shifted >= 360.0 {
        0.0
    } else {
        shifted
    }
}

/// Compute distance, elevation change and azimuth from `origin` to
/// `destination` with the default rounding (3, 3 and 0 decimals).
///
/// # Example
///
/// ```
/// use survey_movement::core::Observation;
/// use survey_movement::processors::metrics::compute_pair_metrics;
///
/// let a = Observation::new(2008, "P1", 100.0, 200.0, 10.0);
/// let b = Observation::new(2012, "P1", 103.0, 204.0, 10.5);
/// let record = compute_pair_metrics(&a, &b);
/// assert_eq!(record.distance, 5.0);
/// assert_eq!(record.delta_z, 0.5);
/// assert_eq!(record.azimuth, 37.0);
/// ```
pub fn compute_pair_metrics(origin: &Observation, destination: &Observation) -> MovementRecord {
    compute_pair_metrics_with(origin, destination, &MetricsConfig::default())
}

/// Like [`compute_pair_metrics`] with configurable rounding.
pub fn compute_pair_metrics_with(
    origin: &Observation,
    destination: &Observation,
    config: &MetricsConfig,
) -> MovementRecord {
    let dx = destination.x - origin.x;
    let dy = destination.y - origin.y;

    let distance = round_to(
        planar_distance(origin.x, origin.y, destination.x, destination.y),
        config.distance_decimals,
    );
    let delta_z = round_to(destination.z - origin.z, config.delta_z_decimals);
    let azimuth = normalize_azimuth(azimuth_degrees(dx, dy), config.azimuth_decimals);

    MovementRecord {
        from_time: origin.time.clone(),
        from_id: origin.id.clone(),
        x1: origin.x,
        y1: origin.y,
        z1: origin.z,
        to_time: destination.time.clone(),
        to_id: destination.id.clone(),
        x2: destination.x,
        y2: destination.y,
        z2: destination.z,
        distance,
        delta_z,
        azimuth,
    }
}
