//! Neighborhood formation and census
//!
//! A policy is chosen once per trial and maps this generation's (pre-tax)
//! income plus last generation's assignment to a new assignment. After
//! every assignment a census recounts the neighborhoods.
//!
//! # Policies
//!
//! - **Static**: nobody moves.
//! - **SortedPairs**: families ranked by ascending income; rank `r` lives in
//!   neighborhood `r / 2`. With an odd population the richest family is
//!   alone in the last neighborhood.
//! - **FullSort**: greedy formation by marginal income contribution. The
//!   joining rule has never been pinned down, so selecting it is an error
//!   rather than a silent fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from assignment, census, and tax pooling
#[derive(Debug, Error, PartialEq)]
pub enum NeighborhoodError {
    #[error("Neighborhood policy {0} is not implemented")]
    NotImplemented(NeighborhoodPolicy),

    #[error("No neighborhoods exist")]
    NoNeighborhoods,

    #[error("Neighborhood ids are not dense: id {missing} has no members")]
    AssignmentGap { missing: usize },

    #[error("Family {family} assigned to neighborhood {hood} but only {hood_count} exist")]
    UnknownNeighborhood {
        family: usize,
        hood: usize,
        hood_count: usize,
    },

    #[error("Row length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unknown neighborhood policy '{0}'")]
    UnknownPolicy(String),
}

/// Neighborhood formation policy, fixed for a trial
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeighborhoodPolicy {
    #[default]
    Static,
    SortedPairs,
    FullSort,
}

impl NeighborhoodPolicy {
    /// Compute this generation's assignment.
    ///
    /// # Example
    /// ```
    /// use mobility_simulator_core_rs::NeighborhoodPolicy;
    ///
    /// let hood = NeighborhoodPolicy::SortedPairs
    ///     .assign(&[4.0, 1.0, 3.0, 2.0], &[0, 0, 1, 1])
    ///     .unwrap();
    /// assert_eq!(hood, vec![1, 0, 1, 0]);
    /// ```
    pub fn assign(
        &self,
        income: &[f64],
        previous: &[usize],
    ) -> Result<Vec<usize>, NeighborhoodError> {
        if income.len() != previous.len() {
            return Err(NeighborhoodError::LengthMismatch {
                expected: income.len(),
                actual: previous.len(),
            });
        }

        match self {
            NeighborhoodPolicy::Static => Ok(previous.to_vec()),
            NeighborhoodPolicy::SortedPairs => Ok(sorted_pairs(income)),
            NeighborhoodPolicy::FullSort => Err(NeighborhoodError::NotImplemented(*self)),
        }
    }
}

impl fmt::Display for NeighborhoodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NeighborhoodPolicy::Static => "Static",
            NeighborhoodPolicy::SortedPairs => "SortedPairs",
            NeighborhoodPolicy::FullSort => "FullSort",
        };
        f.write_str(name)
    }
}

impl FromStr for NeighborhoodPolicy {
    type Err = NeighborhoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "static" => Ok(NeighborhoodPolicy::Static),
            "sortedpairs" => Ok(NeighborhoodPolicy::SortedPairs),
            "fullsort" => Ok(NeighborhoodPolicy::FullSort),
            _ => Err(NeighborhoodError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Ascending income rank of each family (ties keep family order).
fn income_ranks(income: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..income.len()).collect();
    order.sort_by(|&a, &b| income[a].total_cmp(&income[b]));

    let mut ranks = vec![0; income.len()];
    for (rank, family) in order.into_iter().enumerate() {
        ranks[family] = rank;
    }
    ranks
}

fn sorted_pairs(income: &[f64]) -> Vec<usize> {
    income_ranks(income).into_iter().map(|rank| rank / 2).collect()
}

/// Generation-0 assignment: first half in neighborhood 0, the rest in 1.
///
/// A single family has nowhere to split to and stays in 0.
pub fn initial_assignment(n_families: usize) -> Vec<usize> {
    let half = n_families / 2;
    (0..n_families)
        .map(|i| if half > 0 && i >= half { 1 } else { 0 })
        .collect()
}

/// Neighborhood head-count after an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Census {
    /// Distinct neighborhoods in use (ids `0..hood_count`)
    pub hood_count: usize,
    /// Members per neighborhood, zero-padded to the requested width
    pub population: Vec<usize>,
}

/// Count members per neighborhood and check the ids are dense.
///
/// `width` is the padded length of the population vector (`N_FAMILIES`).
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::mechanisms::neighborhood::census;
///
/// let c = census(&[1, 0, 1, 0], 4).unwrap();
/// assert_eq!(c.hood_count, 2);
/// assert_eq!(c.population, vec![2, 2, 0, 0]);
/// ```
pub fn census(assignment: &[usize], width: usize) -> Result<Census, NeighborhoodError> {
    let hood_count = assignment.iter().max().map_or(0, |&m| m + 1);

    let mut population = vec![0usize; hood_count.max(width)];
    for &hood in assignment {
        population[hood] += 1;
    }

    if let Some(missing) = population[..hood_count].iter().position(|&p| p == 0) {
        return Err(NeighborhoodError::AssignmentGap { missing });
    }

    Ok(Census {
        hood_count,
        population,
    })
}

/// Family indices of each neighborhood, in family order.
pub fn members_by_hood(assignment: &[usize], hood_count: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); hood_count];
    for (family, &hood) in assignment.iter().enumerate() {
        if let Some(list) = members.get_mut(hood) {
            list.push(family);
        }
    }
    members
}
