//! Pair generation within one point's time-ordered surveys.

use crate::core::observation::{Observation, ObservationGroup};

/// Consecutive survey pairs `(obs[i], obs[i + 1])`, in time order.
///
/// A group of `n` observations yields `n - 1` pairs; a singleton yields none.
pub fn interval_pairs(
    group: &ObservationGroup,
) -> impl Iterator<Item = (&Observation, &Observation)> + '_ {
    group.observations().windows(2).map(|w| (&w[0], &w[1]))
}

/// The first-to-last survey pair.
///
/// For a singleton both ends are the same observation.
pub fn total_pair(group: &ObservationGroup) -> (&Observation, &Observation) {
    (group.first(), group.last())
}
