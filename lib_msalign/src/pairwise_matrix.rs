//! All-pairs comparison of the input structures, used to build the guide tree.

use std::collections::HashMap;

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};

use crate::{
    alignment::{AlignmentRow, PairwiseAlignment, multiple::MultipleAlignment},
    dtw::{DtwParameters, align_coordinates, align_features, select_rows},
    error::{Error, Result},
    structure::Structure,
    superposition::{Superposition, rmsd},
};


/// Pairwise alignments keyed by the ordered pair of structure names,
/// together with the parameters they were computed with.
#[derive(Debug, Clone)]
pub struct PairwiseAlignmentCache {
    parameters: DtwParameters,
    alignments: HashMap<(String, String), PairwiseAlignment>,
}

/// The result of comparing all pairs of structures by RMSD and coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct RmsdMatrices {
    /// RMSD over the common positions after superposition, NaN if a pair could not be compared.
    pub rmsd: Array2<f64>,
    /// The fraction of alignment columns in which both structures have a residue.
    pub coverage: Array2<f64>,
    /// Min-max normalised RMSD, multiplied by one minus the coverage.
    pub distance: Array2<f64>,
}

impl PairwiseAlignmentCache {
    pub fn new(parameters: DtwParameters) -> Self {
        Self {
            parameters,
            alignments: Default::default(),
        }
    }

    pub fn parameters(&self) -> &DtwParameters {
        &self.parameters
    }

    /// Store the alignment under both orders of the names, swapping its rows for the reverse order.
    pub fn insert(&mut self, first: &str, second: &str, alignment: PairwiseAlignment) {
        self.alignments
            .insert((second.to_string(), first.to_string()), alignment.swapped());
        self.alignments
            .insert((first.to_string(), second.to_string()), alignment);
    }

    pub fn get(&self, first: &str, second: &str) -> Option<&PairwiseAlignment> {
        self.alignments
            .get(&(first.to_string(), second.to_string()))
    }

    /// Like [`get`](Self::get), but only returns alignments computed with the given parameters.
    pub fn get_with_parameters(
        &self,
        first: &str,
        second: &str,
        parameters: &DtwParameters,
    ) -> Option<&PairwiseAlignment> {
        if &self.parameters == parameters {
            self.get(first, second)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }
}

/// Align the features of all pairs of structures and collect the scores.
///
/// Higher scores mean more similar structures. The diagonal is zero.
pub fn pairwise_score_matrix(
    structures: &[Structure],
    parameters: &DtwParameters,
) -> Result<(Array2<f64>, PairwiseAlignmentCache)> {
    info!(
        "Computing pairwise feature scores of {} structures",
        structures.len()
    );
    let mut scores = Array2::zeros((structures.len(), structures.len()));
    let mut cache = PairwiseAlignmentCache::new(*parameters);

    for (i, first) in structures.iter().enumerate() {
        for (j, second) in structures.iter().enumerate().skip(i + 1) {
            let alignment = align_features(first, second, parameters)?;
            debug!(
                "Feature score of {} and {} is {}",
                first.name(),
                second.name(),
                alignment.score()
            );
            scores[[i, j]] = alignment.score();
            scores[[j, i]] = alignment.score();
            cache.insert(first.name(), second.name(), alignment);
        }
    }

    Ok((scores, cache))
}

/// Convert a similarity score matrix into a distance matrix by subtracting each score from the maximum off-diagonal score.
pub fn scores_to_distances(scores: ArrayView2<f64>) -> Array2<f64> {
    let max_score = scores
        .indexed_iter()
        .filter(|((row, column), _)| row != column)
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);

    Array2::from_shape_fn(scores.dim(), |(row, column)| {
        if row == column {
            0.0
        } else {
            max_score - scores[[row, column]]
        }
    })
}

/// Compare all pairs of structures by RMSD and coverage of their seed alignment.
///
/// If `dtw` is given, each pair is realigned with DTW on its coordinates after superimposing it using the seed.
/// A pair without common positions gets NaN RMSD, zero coverage and distance one.
pub fn pairwise_rmsd_matrix(
    structures: &[Structure],
    seed: &MultipleAlignment,
    dtw: Option<&DtwParameters>,
) -> Result<RmsdMatrices> {
    info!(
        "Computing pairwise RMSD and coverage of {} structures",
        structures.len()
    );
    let seed_rows = seed_rows(structures, seed)?;
    let n = structures.len();
    let mut rmsds = Array2::zeros((n, n));
    let mut coverage = Array2::zeros((n, n));
    let mut failed = Array2::from_elem((n, n), false);

    for i in 0..n {
        for j in (i + 1)..n {
            let (first, second) = (&structures[i], &structures[j]);
            let alignment = match dtw {
                Some(parameters) => align_coordinates(
                    first,
                    second,
                    Some((seed_rows[i], seed_rows[j])),
                    parameters,
                )?,
                None => project_pair(seed_rows[i], seed_rows[j])?,
            };

            match rmsd_coverage(first, second, &alignment)? {
                Some((pair_rmsd, pair_coverage)) => {
                    debug!(
                        "{} and {} have RMSD {pair_rmsd} with coverage {pair_coverage}",
                        first.name(),
                        second.name()
                    );
                    rmsds[[i, j]] = pair_rmsd;
                    rmsds[[j, i]] = pair_rmsd;
                    coverage[[i, j]] = pair_coverage;
                    coverage[[j, i]] = pair_coverage;
                }
                None => {
                    warn!(
                        "{} and {} have no common positions, using maximal distance",
                        first.name(),
                        second.name()
                    );
                    rmsds[[i, j]] = f64::NAN;
                    rmsds[[j, i]] = f64::NAN;
                    failed[[i, j]] = true;
                    failed[[j, i]] = true;
                }
            }
        }
    }

    let (min, max) = rmsds
        .indexed_iter()
        .filter(|((row, column), value)| row != column && value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (_, value)| {
            (min.min(*value), max.max(*value))
        });
    let range = if max > min { max - min } else { 0.0 };
    if range == 0.0 {
        debug!("All pairwise RMSDs are equal, normalising them to zero");
    }

    let distance = Array2::from_shape_fn((n, n), |(row, column)| {
        if row == column {
            0.0
        } else if failed[[row, column]] {
            1.0
        } else {
            let normalised = if range > 0.0 {
                (rmsds[[row, column]] - min) / range
            } else {
                0.0
            };
            normalised * (1.0 - coverage[[row, column]])
        }
    });

    Ok(RmsdMatrices {
        rmsd: rmsds,
        coverage,
        distance,
    })
}

/// Look up the seed row of each structure and check that it covers all its residues.
pub(crate) fn seed_rows<'seed>(
    structures: &[Structure],
    seed: &'seed MultipleAlignment,
) -> Result<Vec<&'seed AlignmentRow>> {
    structures
        .iter()
        .map(|structure| {
            let row = seed
                .row(structure.name())
                .ok_or_else(|| Error::MissingSeedAlignment(structure.name().to_string()))?;
            if row.residue_count() != structure.residue_count() {
                return Err(Error::SeedLengthMismatch {
                    name: structure.name().to_string(),
                    expected: structure.residue_count(),
                    actual: row.residue_count(),
                });
            }
            Ok(row)
        })
        .collect()
}

/// Restrict two rows of a multiple alignment to the columns where at least one of them has a residue.
fn project_pair(first: &AlignmentRow, second: &AlignmentRow) -> Result<PairwiseAlignment> {
    let (first, second): (AlignmentRow, AlignmentRow) = first
        .iter()
        .zip(second.iter())
        .filter(|(a, b)| !(a.is_gap() && b.is_gap()))
        .unzip();
    PairwiseAlignment::new(first, second, 0.0)
}

/// RMSD after superimposing the common positions, and the coverage of the alignment.
/// Returns `None` if there are no common positions.
fn rmsd_coverage(
    first: &Structure,
    second: &Structure,
    alignment: &PairwiseAlignment,
) -> Result<Option<(f64, f64)>> {
    let (first_positions, second_positions): (Vec<_>, Vec<_>) =
        alignment.common_positions().into_iter().unzip();
    if first_positions.is_empty() {
        return Ok(None);
    }

    let fixed = select_rows(first.coordinates(), &first_positions)?;
    let moving = select_rows(second.coordinates(), &second_positions)?;
    let superimposed = Superposition::fit(fixed.view(), moving.view())?.apply(moving.view());
    let pair_rmsd = rmsd(fixed.view(), superimposed.view())?;

    if pair_rmsd.is_nan() {
        Ok(None)
    } else {
        Ok(Some((pair_rmsd, alignment.coverage())))
    }
}
