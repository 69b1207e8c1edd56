//! Representation of pairwise and multiple alignments of structures.
//!
//! An alignment row maps each column of an alignment to a residue index of one structure, or to a gap.
//! Text with `-` characters only appears at the interchange boundary, see [`AlignmentRow::from_aligned_string`]
//! and [`AlignmentRow::to_aligned_string`].

use std::{fmt::Display, ops::Index};

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

pub mod multiple;

#[cfg(test)]
mod tests;

/// The gap character of the aligned string interchange format.
pub const GAP_CHARACTER: char = '-';

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum AlignedResidue {
    Residue(usize),
    Gap,
}

/// One row of an alignment, i.e. the residue (or gap) of a single structure in each column.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct AlignmentRow {
    columns: Vec<AlignedResidue>,
}

/// Two rows of equal length aligning two structures, with the score of the alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    first: AlignmentRow,
    second: AlignmentRow,
    score: f64,
}

impl AlignedResidue {
    pub fn residue(self) -> Option<usize> {
        match self {
            AlignedResidue::Residue(index) => Some(index),
            AlignedResidue::Gap => None,
        }
    }

    pub fn is_gap(self) -> bool {
        self == AlignedResidue::Gap
    }
}

impl AlignmentRow {
    /// The row of an unaligned structure, mapping column `i` to residue `i`.
    pub fn identity(residue_count: usize) -> Self {
        (0..residue_count).map(AlignedResidue::Residue).collect()
    }

    /// Parse an aligned string where every character other than `-` is the next residue of the structure.
    pub fn from_aligned_string(aligned: &str) -> Self {
        let mut next_residue = 0;
        aligned
            .chars()
            .map(|c| {
                if c == GAP_CHARACTER {
                    AlignedResidue::Gap
                } else {
                    next_residue += 1;
                    AlignedResidue::Residue(next_residue - 1)
                }
            })
            .collect()
    }

    /// Convert from the integer form, where negative values mark gaps.
    pub fn from_indices(indices: &[isize]) -> Self {
        indices
            .iter()
            .map(|&index| {
                usize::try_from(index)
                    .map(AlignedResidue::Residue)
                    .unwrap_or(AlignedResidue::Gap)
            })
            .collect()
    }

    /// Convert into the integer form, where gaps are `-1`.
    pub fn to_indices(&self) -> Vec<isize> {
        self.columns
            .iter()
            .map(|column| match column {
                AlignedResidue::Residue(index) => *index as isize,
                AlignedResidue::Gap => -1,
            })
            .collect()
    }

    /// Render the row as aligned string, taking residue symbols from the ungapped `sequence`.
    pub fn to_aligned_string(&self, sequence: &str) -> Result<String> {
        let sequence: Vec<char> = sequence.chars().collect();
        self.columns
            .iter()
            .map(|column| match column {
                AlignedResidue::Residue(index) => {
                    sequence
                        .get(*index)
                        .copied()
                        .ok_or(Error::ResidueIndexOutOfBounds {
                            index: *index,
                            length: sequence.len(),
                        })
                }
                AlignedResidue::Gap => Ok(GAP_CHARACTER),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AlignedResidue> + '_ {
        self.columns.iter().copied()
    }

    /// The residue indices of the row in column order, skipping gaps.
    pub fn residues(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().filter_map(|column| column.residue())
    }

    /// The number of non-gap columns.
    pub fn residue_count(&self) -> usize {
        self.residues().count()
    }

    /// Returns true if every residue index in `0..residue_count` appears exactly once, and no other index appears.
    pub fn is_complete_permutation(&self, residue_count: usize) -> bool {
        let mut seen = vec![false; residue_count];
        for residue in self.residues() {
            match seen.get_mut(residue) {
                Some(seen) if !*seen => *seen = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|seen| seen)
    }

    /// Express this row in the column space of an alignment of its own columns.
    ///
    /// `through` is a row of an alignment in which this row's columns were treated as residues.
    /// The result has the length of `through`, and holds a gap wherever `through` holds a gap.
    pub fn expand_through(&self, through: &AlignmentRow) -> Result<AlignmentRow> {
        through
            .iter()
            .map(|column| match column {
                AlignedResidue::Residue(index) => {
                    self.columns
                        .get(index)
                        .copied()
                        .ok_or(Error::ResidueIndexOutOfBounds {
                            index,
                            length: self.len(),
                        })
                }
                AlignedResidue::Gap => Ok(AlignedResidue::Gap),
            })
            .collect()
    }

    /// Rename the residues of this row to the columns they occupy in `through`.
    ///
    /// This keeps the column space of this row, but makes its residue indices point into the
    /// column space of `through`. Residues that do not occur in `through` become gaps.
    pub fn reindex_residues(&self, through: &AlignmentRow) -> AlignmentRow {
        let mut residue_to_column = Vec::new();
        for (column, residue) in through.columns.iter().enumerate() {
            if let AlignedResidue::Residue(residue) = residue {
                if residue_to_column.len() <= *residue {
                    residue_to_column.resize(*residue + 1, None);
                }
                residue_to_column[*residue] = Some(column);
            }
        }

        self.columns
            .iter()
            .map(|column| {
                column
                    .residue()
                    .and_then(|residue| residue_to_column.get(residue).copied().flatten())
                    .map(AlignedResidue::Residue)
                    .unwrap_or(AlignedResidue::Gap)
            })
            .collect()
    }

    /// Spread the per-residue rows of `data` over the columns of this row, filling gap columns with NaN.
    pub fn gapped_data(&self, data: ArrayView2<f64>) -> Result<Array2<f64>> {
        let mut gapped = Array2::from_elem((self.len(), data.ncols()), f64::NAN);
        for (column, residue) in self.columns.iter().enumerate() {
            if let AlignedResidue::Residue(residue) = *residue {
                if residue >= data.nrows() {
                    return Err(Error::ResidueIndexOutOfBounds {
                        index: residue,
                        length: data.nrows(),
                    });
                }
                gapped.row_mut(column).assign(&data.row(residue));
            }
        }
        Ok(gapped)
    }
}

/// The residue index pairs of all columns where neither row has a gap.
pub fn common_positions(first: &AlignmentRow, second: &AlignmentRow) -> Vec<(usize, usize)> {
    debug_assert_eq!(first.len(), second.len());

    first
        .iter()
        .zip(second.iter())
        .filter_map(|(a, b)| Some((a.residue()?, b.residue()?)))
        .collect()
}

impl PairwiseAlignment {
    pub fn new(first: AlignmentRow, second: AlignmentRow, score: f64) -> Result<Self> {
        if first.len() != second.len() {
            return Err(Error::RowLengthMismatch {
                first: first.len(),
                second: second.len(),
            });
        }

        Ok(Self {
            first,
            second,
            score,
        })
    }

    pub fn first(&self) -> &AlignmentRow {
        &self.first
    }

    pub fn second(&self) -> &AlignmentRow {
        &self.second
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn column_count(&self) -> usize {
        self.first.len()
    }

    /// The same alignment with the roles of the two structures exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
            score: self.score,
        }
    }

    pub fn common_positions(&self) -> Vec<(usize, usize)> {
        common_positions(&self.first, &self.second)
    }

    /// The fraction of columns in which both structures have a residue.
    pub fn coverage(&self) -> f64 {
        if self.column_count() == 0 {
            0.0
        } else {
            self.common_positions().len() as f64 / self.column_count() as f64
        }
    }
}

impl FromIterator<AlignedResidue> for AlignmentRow {
    fn from_iter<T: IntoIterator<Item = AlignedResidue>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Extend<AlignedResidue> for AlignmentRow {
    fn extend<T: IntoIterator<Item = AlignedResidue>>(&mut self, iter: T) {
        self.columns.extend(iter);
    }
}

impl From<Vec<AlignedResidue>> for AlignmentRow {
    fn from(columns: Vec<AlignedResidue>) -> Self {
        Self { columns }
    }
}

impl Index<usize> for AlignmentRow {
    type Output = AlignedResidue;

    fn index(&self, index: usize) -> &Self::Output {
        &self.columns[index]
    }
}

impl Display for AlignedResidue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignedResidue::Residue(index) => write!(f, "{index}"),
            AlignedResidue::Gap => write!(f, "{GAP_CHARACTER}"),
        }
    }
}

impl Display for AlignmentRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        let mut once = false;
        for column in &self.columns {
            if once {
                write!(f, " ")?;
            } else {
                once = true;
            }
            write!(f, "{column}")?;
        }
        write!(f, "]")
    }
}
