//! Interval and total movement tables for a set of survey observations.
//!
//! Observations are grouped by point id, paired within each group and
//! measured. Groups are independent, so pairing and metrics run in parallel
//! with Rayon; the final tables are sorted by `(id, from_time)`.

use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::grouping::group_observations;
use super::metrics::compute_pair_metrics_with;
use super::pairing::{interval_pairs, total_pair};
use crate::config::MovementConfig;
use crate::core::observation::{MovementRecord, Observation, ObservationGroup, PointId};

/// Errors that can occur while computing movement tables.
#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("point '{id}' has more than one observation at time '{time}'")]
    DuplicateObservation { id: String, time: String },

    #[error("point '{id}' at time '{time}' has a non-finite coordinate")]
    NonFiniteCoordinate { id: String, time: String },
}

/// Result type for change computations.
pub type Result<T> = std::result::Result<T, ChangeError>;

/// Output of one run: both movement tables plus the groups they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTables {
    /// One record per pair of consecutive surveys of each point.
    pub interval: Vec<MovementRecord>,
    /// One record per point, first survey to last survey.
    pub total: Vec<MovementRecord>,
    /// Time-ordered observations per point, in id order. Used to build
    /// movement lines.
    pub groups: Vec<ObservationGroup>,
}

impl ChangeTables {
    /// Points surveyed only once; their total record is degenerate.
    pub fn singleton_ids(&self) -> Vec<&PointId> {
        self.groups
            .iter()
            .filter(|g| g.is_singleton())
            .map(ObservationGroup::id)
            .collect()
    }

    /// Number of observations across all groups.
    pub fn observation_count(&self) -> usize {
        self.groups.iter().map(ObservationGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Compute interval and total changes with the default configuration.
///
/// # Example
///
/// ```
/// use survey_movement::core::Observation;
/// use survey_movement::processors::compute_changes;
///
/// let observations = vec![
///     Observation::new(2000, "P3", 0.0, 0.0, 0.0),
///     Observation::new(2010, "P3", 0.0, 2.0, 0.0),
///     Observation::new(2005, "P3", 0.0, 1.0, 0.0),
/// ];
/// let tables = compute_changes(&observations).unwrap();
/// assert_eq!(tables.interval.len(), 2);
/// assert_eq!(tables.total.len(), 1);
/// assert_eq!(tables.total[0].distance, 2.0);
/// ```
pub fn compute_changes(observations: &[Observation]) -> Result<ChangeTables> {
    compute_changes_with(observations, &MovementConfig::default())
}

/// Compute interval and total changes.
///
/// Uses `config.grouping` for duplicate handling and `config.metrics` for
/// rounding.
///
/// # Errors
///
/// Fails without producing partial tables if any observation has a
/// non-finite coordinate, or on duplicate `(id, time)` pairs under
/// [`DuplicatePolicy::Reject`](crate::config::DuplicatePolicy::Reject).
pub fn compute_changes_with(
    observations: &[Observation],
    config: &MovementConfig,
) -> Result<ChangeTables> {
    let groups = group_observations(observations, config.grouping.duplicates)?;
    let metrics = &config.metrics;

    let per_group: Vec<(Vec<MovementRecord>, MovementRecord)> = groups
        .par_iter()
        .map(|group| {
            let interval = interval_pairs(group)
                .map(|(from, to)| compute_pair_metrics_with(from, to, metrics))
                .collect();
            let (first, last) = total_pair(group);
            (interval, compute_pair_metrics_with(first, last, metrics))
        })
        .collect();

    let interval_len = per_group.iter().map(|(rows, _)| rows.len()).sum();
    let mut interval = Vec::with_capacity(interval_len);
    let mut total = Vec::with_capacity(per_group.len());
    for (rows, span) in per_group {
        interval.extend(rows);
        total.push(span);
    }

    sort_records(&mut interval);
    sort_records(&mut total);

    let tables = ChangeTables {
        interval,
        total,
        groups,
    };

    let singletons = tables.singleton_ids();
    if !singletons.is_empty() {
        warn!(
            "{} point(s) surveyed only once, total change is zero: {}",
            singletons.len(),
            singletons
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!(
        "Computed {} interval and {} total changes for {} points",
        tables.interval.len(),
        tables.total.len(),
        tables.groups.len()
    );

    Ok(tables)
}

/// Stable sort by `(from_id, from_time)`.
fn sort_records(records: &mut [MovementRecord]) {
    records.sort_by(|a, b| {
        a.from_id
            .cmp(&b.from_id)
            .then_with(|| a.from_time.cmp(&b.from_time))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::core::observation::SurveyTime;

    fn sample_observations() -> Vec<Observation> {
        vec![
            Observation::new(2010, "P3", 0.0, 10.0, 1.0),
            Observation::new(2012, "P1", 103.0, 204.0, 10.5),
            Observation::new(2008, "P2", 0.0, 0.0, 0.0),
            Observation::new(2000, "P3", 0.0, 0.0, 0.0),
            Observation::new(2008, "P1", 100.0, 200.0, 10.0),
            Observation::new(2012, "P2", -1.0, 0.0, 0.0),
            Observation::new(2005, "P3", 0.0, 4.0, 0.25),
            Observation::new(2008, "P4", 7.0, 7.0, 7.0),
        ]
    }

    fn records_for<'a>(records: &'a [MovementRecord], id: &str) -> Vec<&'a MovementRecord> {
        let id = PointId::from(id);
        records.iter().filter(|r| r.from_id == id).collect()
    }

    #[test]
    fn test_worked_examples() {
        let tables = compute_changes(&sample_observations()).unwrap();

        let p1 = records_for(&tables.interval, "P1");
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].distance, 5.0);
        assert_eq!(p1[0].delta_z, 0.5);
        assert_eq!(p1[0].azimuth, 37.0);

        let p2 = records_for(&tables.total, "P2");
        assert_eq!(p2[0].azimuth, 270.0);
    }

    #[test]
    fn test_three_surveys_give_two_intervals_and_one_total() {
        let tables = compute_changes(&sample_observations()).unwrap();

        let p3 = records_for(&tables.interval, "P3");
        assert_eq!(p3.len(), 2);
        assert_eq!(p3[0].from_time, SurveyTime::Integer(2000));
        assert_eq!(p3[0].to_time, SurveyTime::Integer(2005));
        assert_eq!(p3[1].from_time, SurveyTime::Integer(2005));
        assert_eq!(p3[1].to_time, SurveyTime::Integer(2010));
        assert_eq!(p3[0].distance, 4.0);
        assert_eq!(p3[1].delta_z, 0.75);

        let total = records_for(&tables.total, "P3");
        assert_eq!(total.len(), 1);
        assert_eq!(total[0].from_time, SurveyTime::Integer(2000));
        assert_eq!(total[0].to_time, SurveyTime::Integer(2010));
        assert_eq!(total[0].distance, 10.0);
        assert_eq!(total[0].azimuth, 0.0);
    }

    #[test]
    fn test_record_counts_per_group() {
        let observations = sample_observations();
        let tables = compute_changes(&observations).unwrap();

        for group in &tables.groups {
            let n = group.len();
            let intervals = tables.interval.iter().filter(|r| &r.from_id == group.id()).count();
            let totals = tables.total.iter().filter(|r| &r.from_id == group.id()).count();
            assert_eq!(intervals, n - 1);
            assert_eq!(totals, 1);
        }
        assert_eq!(tables.observation_count(), observations.len());
        assert!(tables
            .interval
            .iter()
            .chain(tables.total.iter())
            .all(|r| r.from_id == r.to_id));
    }

    #[test]
    fn test_singleton_gets_degenerate_total() {
        let tables = compute_changes(&sample_observations()).unwrap();

        assert!(records_for(&tables.interval, "P4").is_empty());
        let p4 = records_for(&tables.total, "P4");
        assert_eq!(p4.len(), 1);
        assert!(p4[0].is_degenerate());
        assert_eq!(p4[0].distance, 0.0);
        assert_eq!(p4[0].delta_z, 0.0);
        assert_eq!(p4[0].azimuth, 0.0);
        assert_eq!(tables.singleton_ids(), vec![&PointId::from("P4")]);
    }

    #[test]
    fn test_output_sorted_regardless_of_input_order() {
        let mut observations = sample_observations();
        let forward = compute_changes(&observations).unwrap();
        observations.reverse();
        let reversed = compute_changes(&observations).unwrap();

        assert_eq!(forward.interval, reversed.interval);
        assert_eq!(forward.total, reversed.total);

        let keys: Vec<(String, String)> = forward
            .interval
            .iter()
            .map(|r| (r.from_id.to_string(), r.from_time.to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_numeric_ids_sort_numerically() {
        let observations = vec![
            Observation::new(1, 10, 0.0, 0.0, 0.0),
            Observation::new(1, 9, 0.0, 0.0, 0.0),
            Observation::new(2, 10, 1.0, 0.0, 0.0),
            Observation::new(2, 9, 1.0, 0.0, 0.0),
        ];
        let tables = compute_changes(&observations).unwrap();
        assert_eq!(tables.total[0].from_id, PointId::Integer(9));
        assert_eq!(tables.total[1].from_id, PointId::Integer(10));
    }

    #[test]
    fn test_idempotent() {
        let observations = sample_observations();
        let first = compute_changes(&observations).unwrap();
        let second = compute_changes(&observations).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let tables = compute_changes(&[]).unwrap();
        assert!(tables.is_empty());
        assert!(tables.interval.is_empty());
        assert!(tables.total.is_empty());
    }

    #[test]
    fn test_duplicate_policy_from_config() {
        let observations = vec![
            Observation::new(2008, "P1", 0.0, 0.0, 0.0),
            Observation::new(2008, "P1", 0.0, 1.0, 0.0),
        ];

        assert!(matches!(
            compute_changes(&observations),
            Err(ChangeError::DuplicateObservation { .. })
        ));

        let mut config = MovementConfig::default();
        config.grouping.duplicates = DuplicatePolicy::KeepInputOrder;
        let tables = compute_changes_with(&observations, &config).unwrap();
        assert_eq!(tables.interval.len(), 1);
        assert_eq!(tables.interval[0].y2, 1.0);
    }
}
