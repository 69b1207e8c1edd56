use anyhow::{Result, anyhow};
use lib_msalign::{
    alignment::{AlignmentRow, common_positions},
    guide_tree::Merge,
    multiple_alignment::MultipleAlignmentResult,
    structure::Structure,
    superposition::{Superposition, rmsd},
};
use log::debug;
use ndarray::{ArrayView2, Axis};
use noisy_float::types::R64;
use serde::Serialize;

use super::AlignmentMethod;

#[derive(Debug, Serialize)]
pub struct AlignmentReport {
    alignment_method: String,
    column_count: usize,
    core_column_count: usize,
    distances: Vec<Vec<R64>>,
    statistics: Vec<StructureStatistics>,
    guide_tree: GuideTreeReport,
}

#[derive(Debug, Serialize)]
struct GuideTreeReport {
    rows: Vec<[usize; 2]>,
    branch_lengths: Vec<R64>,
    merges: Vec<Merge>,
}

#[derive(Debug, Serialize)]
struct StructureStatistics {
    name: String,
    residue_count: usize,
    gap_count: usize,
    /// Root mean square distance to the consensus structure after superposition.
    ///
    /// Missing if only one structure was aligned or the structure has no residues.
    consensus_rmsd: Option<R64>,
}

impl AlignmentReport {
    pub fn new(
        alignment_method: AlignmentMethod,
        structures: &[Structure],
        result: &MultipleAlignmentResult,
    ) -> Result<Self> {
        let alignment = result.alignment();
        let statistics = structures
            .iter()
            .map(|structure| {
                let row = alignment
                    .row(structure.name())
                    .ok_or_else(|| anyhow!("Structure {} is not aligned", structure.name()))?;
                let consensus_rmsd = result
                    .root()
                    .map(|root| consensus_rmsd(structure, row, root))
                    .transpose()?
                    .flatten();

                Ok(StructureStatistics {
                    name: structure.name().to_string(),
                    residue_count: structure.residue_count(),
                    gap_count: row.len() - row.residue_count(),
                    consensus_rmsd,
                })
            })
            .collect::<Result<_>>()?;

        let guide_tree = result.guide_tree();
        Ok(Self {
            alignment_method: format!("{alignment_method:?}"),
            column_count: alignment.column_count(),
            core_column_count: result.core_column_count(),
            distances: matrix_rows(result.distances())?,
            statistics,
            guide_tree: GuideTreeReport {
                rows: guide_tree.to_rows(),
                branch_lengths: guide_tree
                    .branch_lengths()
                    .iter()
                    .copied()
                    .map(finite)
                    .collect::<Result<_>>()?,
                merges: guide_tree.merges().to_vec(),
            },
        })
    }
}

/// The root of the guide tree has one residue per alignment column.
fn consensus_rmsd(
    structure: &Structure,
    row: &AlignmentRow,
    root: &Structure,
) -> Result<Option<R64>> {
    let (root_positions, positions): (Vec<_>, Vec<_>) =
        common_positions(&AlignmentRow::identity(root.residue_count()), row)
            .into_iter()
            .unzip();
    if positions.is_empty() {
        return Ok(None);
    }

    let fixed = root.coordinates().select(Axis(0), &root_positions);
    let moving = structure.coordinates().select(Axis(0), &positions);

    let superposition = Superposition::fit(fixed.view(), moving.view())?;
    let value = rmsd(fixed.view(), superposition.apply(moving.view()).view())?;
    debug!("RMSD of {} to the consensus is {value}", structure.name());
    finite(value).map(Some)
}

fn matrix_rows(matrix: ArrayView2<f64>) -> Result<Vec<Vec<R64>>> {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().copied().map(finite).collect())
        .collect()
}

fn finite(value: f64) -> Result<R64> {
    R64::try_new(value).ok_or_else(|| anyhow!("Cannot report non-finite value {value}"))
}
