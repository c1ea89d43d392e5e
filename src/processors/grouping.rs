//! Partition observations by point id and order each point's surveys.

use std::collections::BTreeMap;

use log::debug;

use super::changes::{ChangeError, Result};
use crate::config::DuplicatePolicy;
use crate::core::observation::{Observation, ObservationGroup, PointId};

/// Group observations by id in a single pass.
///
/// Each group is sorted by survey time with a stable sort, so observations
/// sharing a time keep their input order. Groups come back in ascending id
/// order. An empty input yields no groups.
///
/// # Errors
///
/// - [`ChangeError::NonFiniteCoordinate`] if any coordinate is NaN or infinite
/// - [`ChangeError::DuplicateObservation`] if a point has two observations at
///   the same time and `policy` is [`DuplicatePolicy::Reject`]
pub fn group_observations(
    observations: &[Observation],
    policy: DuplicatePolicy,
) -> Result<Vec<ObservationGroup>> {
    let mut by_id: BTreeMap<PointId, Vec<Observation>> = BTreeMap::new();

    for obs in observations {
        if !obs.is_finite() {
            return Err(ChangeError::NonFiniteCoordinate {
                id: obs.id.to_string(),
                time: obs.time.to_string(),
            });
        }
        by_id.entry(obs.id.clone()).or_default().push(obs.clone());
    }

    let mut groups = Vec::with_capacity(by_id.len());
    for (id, mut members) in by_id {
        members.sort_by(|a, b| a.time.cmp(&b.time));

        if policy == DuplicatePolicy::Reject {
            if let Some(pair) = members.windows(2).find(|w| w[0].time == w[1].time) {
                return Err(ChangeError::DuplicateObservation {
                    id: id.to_string(),
                    time: pair[0].time.to_string(),
                });
            }
        }

        groups.push(ObservationGroup::new(id, members));
    }

    debug!(
        "Grouped {} observations into {} points",
        observations.len(),
        groups.len()
    );

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observation::SurveyTime;

    #[test]
    fn test_groups_are_keyed_and_time_ordered() {
        let observations = vec![
            Observation::new(2010, "B", 0.0, 0.0, 0.0),
            Observation::new(2005, "A", 1.0, 0.0, 0.0),
            Observation::new(2000, "B", 2.0, 0.0, 0.0),
            Observation::new(2000, "A", 3.0, 0.0, 0.0),
        ];

        let groups = group_observations(&observations, DuplicatePolicy::Reject).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id(), &PointId::from("A"));
        assert_eq!(groups[1].id(), &PointId::from("B"));

        let times: Vec<&SurveyTime> = groups[1].observations().iter().map(|o| &o.time).collect();
        assert_eq!(times, vec![&SurveyTime::Integer(2000), &SurveyTime::Integer(2010)]);
        assert_eq!(groups[0].first().x, 3.0);
        assert_eq!(groups[0].last().x, 1.0);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let groups = group_observations(&[], DuplicatePolicy::Reject).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_duplicate_time_rejected() {
        let observations = vec![
            Observation::new(2008, "P1", 0.0, 0.0, 0.0),
            Observation::new(2008, "P1", 1.0, 1.0, 1.0),
        ];

        match group_observations(&observations, DuplicatePolicy::Reject) {
            Err(ChangeError::DuplicateObservation { id, time }) => {
                assert_eq!(id, "P1");
                assert_eq!(time, "2008");
            }
            other => panic!("Expected DuplicateObservation, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_time_kept_in_input_order() {
        let observations = vec![
            Observation::new(2012, "P1", 9.0, 0.0, 0.0),
            Observation::new(2008, "P1", 1.0, 0.0, 0.0),
            Observation::new(2008, "P1", 2.0, 0.0, 0.0),
        ];

        let groups = group_observations(&observations, DuplicatePolicy::KeepInputOrder).unwrap();
        let xs: Vec<f64> = groups[0].observations().iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let observations = vec![Observation::new(2008, "P1", 0.0, f64::INFINITY, 0.0)];
        let result = group_observations(&observations, DuplicatePolicy::Reject);
        assert!(matches!(result, Err(ChangeError::NonFiniteCoordinate { .. })));
    }
}
