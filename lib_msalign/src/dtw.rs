//! Dynamic time warping of per-residue signals with affine gap penalties.
//!
//! The alignment maximises the sum of the match scores `exp(-gamma * |a - b|^2)` minus the gap penalties.
//! A gap of length `k` is penalised with `open + (k - 1) * extend`, also at the ends of the alignment.

use log::trace;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::{
    alignment::{AlignedResidue, AlignmentRow, PairwiseAlignment, common_positions},
    error::{Error, Result},
    structure::Structure,
    superposition::Superposition,
};


#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GapPenalties {
    pub open: f64,
    pub extend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DtwParameters {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub gap_penalties: GapPenalties,
    /// Width of the similarity kernel.
    pub gamma: f64,
}

/// The three layers of the Gotoh recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DtwState {
    Match,
    /// A residue of the first signal is aligned to a gap.
    GapInSecond,
    /// A residue of the second signal is aligned to a gap.
    GapInFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DtwEntry {
    score: f64,
    predecessor: Option<DtwState>,
}

struct DtwMatrix {
    layers: [Array2<DtwEntry>; 3],
}

impl Default for GapPenalties {
    fn default() -> Self {
        Self {
            open: 1.0,
            extend: 0.1,
        }
    }
}

impl GapPenalties {
    /// The penalty of a gap column, which opens a gap if `is_first`, and extends one otherwise.
    pub fn gap_penalty(&self, is_first: bool) -> f64 {
        if is_first { self.open } else { self.extend }
    }
}

impl DtwParameters {
    /// Defaults for aligning alpha-carbon coordinates.
    pub fn coordinate_defaults() -> Self {
        Self {
            gap_penalties: GapPenalties::default(),
            gamma: 0.03,
        }
    }

    /// Defaults for aligning feature vectors.
    pub fn feature_defaults() -> Self {
        Self {
            gap_penalties: GapPenalties::default(),
            gamma: 1.0,
        }
    }

    pub fn match_score(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let squared_distance: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        (-self.gamma * squared_distance).exp()
    }
}

impl DtwState {
    const ALL: [Self; 3] = [Self::Match, Self::GapInSecond, Self::GapInFirst];

    fn layer(self) -> usize {
        match self {
            Self::Match => 0,
            Self::GapInSecond => 1,
            Self::GapInFirst => 2,
        }
    }
}

impl Default for DtwEntry {
    fn default() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            predecessor: None,
        }
    }
}

impl DtwMatrix {
    fn new(first_length: usize, second_length: usize) -> Self {
        let shape = (first_length + 1, second_length + 1);
        Self {
            layers: [
                Array2::default(shape),
                Array2::default(shape),
                Array2::default(shape),
            ],
        }
    }

    fn entry(&self, state: DtwState, i: usize, j: usize) -> DtwEntry {
        self.layers[state.layer()][[i, j]]
    }

    fn set_entry(&mut self, state: DtwState, i: usize, j: usize, entry: DtwEntry) {
        self.layers[state.layer()][[i, j]] = entry;
    }

    /// Select the best predecessor in the order match, gap in second, gap in first.
    fn best_predecessor(
        &self,
        i: usize,
        j: usize,
        transition: impl Fn(DtwState) -> f64,
    ) -> DtwEntry {
        let mut best = DtwEntry::default();
        for state in DtwState::ALL {
            let score = self.entry(state, i, j).score + transition(state);
            if score > best.score {
                best = DtwEntry {
                    score,
                    predecessor: Some(state),
                };
            }
        }
        best
    }

    fn fill(
        &mut self,
        first: ArrayView2<f64>,
        second: ArrayView2<f64>,
        parameters: &DtwParameters,
    ) {
        let gap_penalties = parameters.gap_penalties;
        self.set_entry(
            DtwState::Match,
            0,
            0,
            DtwEntry {
                score: 0.0,
                predecessor: None,
            },
        );

        for i in 0..=first.nrows() {
            for j in 0..=second.nrows() {
                if i > 0 && j > 0 {
                    let score = parameters.match_score(first.row(i - 1), second.row(j - 1));
                    let mut entry = self.best_predecessor(i - 1, j - 1, |_| 0.0);
                    entry.score += score;
                    self.set_entry(DtwState::Match, i, j, entry);
                }

                if i > 0 {
                    let entry = self.best_predecessor(i - 1, j, |state| {
                        -gap_penalties.gap_penalty(state != DtwState::GapInSecond)
                    });
                    self.set_entry(DtwState::GapInSecond, i, j, entry);
                }

                if j > 0 {
                    let entry = self.best_predecessor(i, j - 1, |state| {
                        -gap_penalties.gap_penalty(state != DtwState::GapInFirst)
                    });
                    self.set_entry(DtwState::GapInFirst, i, j, entry);
                }
            }
        }
    }

    fn traceback(
        &self,
        first_length: usize,
        second_length: usize,
    ) -> (AlignmentRow, AlignmentRow, f64) {
        let end = self.best_predecessor(first_length, second_length, |_| 0.0);
        let mut first_row = Vec::new();
        let mut second_row = Vec::new();

        let (mut i, mut j) = (first_length, second_length);
        let mut state = end.predecessor;
        while let Some(current) = state {
            if i == 0 && j == 0 {
                break;
            }

            state = self.entry(current, i, j).predecessor;
            match current {
                DtwState::Match => {
                    i -= 1;
                    j -= 1;
                    first_row.push(AlignedResidue::Residue(i));
                    second_row.push(AlignedResidue::Residue(j));
                }
                DtwState::GapInSecond => {
                    i -= 1;
                    first_row.push(AlignedResidue::Residue(i));
                    second_row.push(AlignedResidue::Gap);
                }
                DtwState::GapInFirst => {
                    j -= 1;
                    first_row.push(AlignedResidue::Gap);
                    second_row.push(AlignedResidue::Residue(j));
                }
            }
        }
        debug_assert_eq!((i, j), (0, 0));

        first_row.reverse();
        second_row.reverse();
        (first_row.into(), second_row.into(), end.score)
    }
}

/// Align two signals with one row per residue.
///
/// The returned rows contain each residue index of their signal exactly once and in order.
pub fn align_signals(
    first: ArrayView2<f64>,
    second: ArrayView2<f64>,
    parameters: &DtwParameters,
) -> Result<PairwiseAlignment> {
    if first.ncols() != second.ncols() && first.nrows() > 0 && second.nrows() > 0 {
        return Err(Error::SignalDimensionMismatch {
            first: first.ncols(),
            second: second.ncols(),
        });
    }

    let mut matrix = DtwMatrix::new(first.nrows(), second.nrows());
    matrix.fill(first, second, parameters);
    let (first_row, second_row, score) = matrix.traceback(first.nrows(), second.nrows());

    trace!("DTW rows {first_row} and {second_row} with score {score}");
    debug_assert!(first_row.is_complete_permutation(first.nrows()));
    debug_assert!(second_row.is_complete_permutation(second.nrows()));

    PairwiseAlignment::new(first_row, second_row, score)
}

/// Align the feature arrays of two structures.
pub fn align_features(
    first: &Structure,
    second: &Structure,
    parameters: &DtwParameters,
) -> Result<PairwiseAlignment> {
    let first_features = first
        .features()
        .ok_or_else(|| Error::MissingFeatures(first.name().to_string()))?;
    let second_features = second
        .features()
        .ok_or_else(|| Error::MissingFeatures(second.name().to_string()))?;
    if first_features.ncols() != second_features.ncols() {
        return Err(Error::FeatureDimensionMismatch {
            first: first.name().to_string(),
            second: second.name().to_string(),
            first_dimension: first_features.ncols(),
            second_dimension: second_features.ncols(),
        });
    }

    align_signals(first_features, second_features, parameters)
}

/// Align the coordinates of two structures.
///
/// If a seed alignment is given, the second structure is first superimposed onto the first one
/// using the common positions of the seed rows.
pub fn align_coordinates(
    first: &Structure,
    second: &Structure,
    seed: Option<(&AlignmentRow, &AlignmentRow)>,
    parameters: &DtwParameters,
) -> Result<PairwiseAlignment> {
    let Some((first_seed, second_seed)) = seed else {
        return align_signals(first.coordinates(), second.coordinates(), parameters);
    };

    if first_seed.len() != second_seed.len() {
        return Err(Error::SeedColumnCountMismatch {
            first: first_seed.len(),
            second: second_seed.len(),
        });
    }

    let (first_positions, second_positions): (Vec<_>, Vec<_>) =
        common_positions(first_seed, second_seed).into_iter().unzip();
    let fixed = select_rows(first.coordinates(), &first_positions)?;
    let moving = select_rows(second.coordinates(), &second_positions)?;
    let superposition = Superposition::fit(fixed.view(), moving.view())?;
    let superimposed = superposition.apply(second.coordinates());

    align_signals(first.coordinates(), superimposed.view(), parameters)
}

/// Collect the given rows of `data` into a new array, in the given order.
pub(crate) fn select_rows(data: ArrayView2<f64>, rows: &[usize]) -> Result<Array2<f64>> {
    if let Some(&index) = rows.iter().find(|&&row| row >= data.nrows()) {
        return Err(Error::ResidueIndexOutOfBounds {
            index,
            length: data.nrows(),
        });
    }

    Ok(data.select(Axis(0), rows))
}
