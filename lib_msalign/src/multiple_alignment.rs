//! Progressive multiple alignment along a guide tree.
//!
//! Each merge aligns the two child nodes, superimposes the second child onto the first one,
//! and creates a consensus structure whose residues are the columns of the merged alignment.

use std::collections::HashSet;

use log::{debug, info, trace};
use ndarray::{Array2, ArrayView2, Zip};

use crate::{
    alignment::{
        AlignmentRow, common_positions,
        multiple::{MultipleAlignment, NodeAlignment},
    },
    config::MultipleAlignmentConfig,
    dtw::select_rows,
    error::{Error, Result},
    guide_tree::GuideTree,
    pairwise_matrix::{
        pairwise_rmsd_matrix, pairwise_score_matrix, scores_to_distances, seed_rows,
    },
    structure::Structure,
    superposition::Superposition,
};

use strategy::{CoordinateMerge, FeatureMerge, MergeStrategy};

pub mod strategy;


/// The name of the consensus structure of the root merge.
pub const ROOT_NAME: &str = "int-final";

/// The prefix of the names of all consensus structures.
pub const INTERNAL_NODE_PREFIX: &str = "int-";

/// Aligns a fixed set of structures.
pub struct MultipleAligner<'structures> {
    structures: &'structures [Structure],
    config: MultipleAlignmentConfig,
}

#[derive(Debug, Clone)]
pub struct MultipleAlignmentResult {
    alignment: MultipleAlignment,
    guide_tree: GuideTree,
    distances: Array2<f64>,
    internal_nodes: Vec<Structure>,
}

impl<'structures> MultipleAligner<'structures> {
    /// Returns an error if there are no structures, names are not unique or reserved for internal nodes,
    /// or the config is invalid.
    pub fn new(
        structures: &'structures [Structure],
        config: MultipleAlignmentConfig,
    ) -> Result<Self> {
        if structures.is_empty() {
            return Err(Error::NoStructures);
        }

        let mut names = HashSet::new();
        for structure in structures {
            if structure.name().starts_with(INTERNAL_NODE_PREFIX) {
                return Err(Error::ReservedStructureName(structure.name().to_string()));
            }
            if !names.insert(structure.name()) {
                return Err(Error::DuplicateStructureName(structure.name().to_string()));
            }
        }
        config.verify()?;

        Ok(Self { structures, config })
    }

    pub fn config(&self) -> &MultipleAlignmentConfig {
        &self.config
    }

    /// Align the structures by their features, along a guide tree built from pairwise feature scores.
    pub fn align_features(&self) -> Result<MultipleAlignmentResult> {
        info!("Aligning {} structures by features", self.structures.len());
        let (scores, cache) = pairwise_score_matrix(self.structures, &self.config.feature)?;
        let distances = scores_to_distances(scores.view());
        let guide_tree = GuideTree::build(distances.view())?;

        let mut strategy =
            FeatureMerge::new(self.config.feature, Some(&cache), self.structures.len());
        self.merge_along(guide_tree, distances, &mut strategy)
    }

    /// Align the structures by their features along the given guide tree.
    pub fn align_features_along(&self, guide_tree: GuideTree) -> Result<MultipleAlignmentResult> {
        let distances = Array2::zeros((self.structures.len(), self.structures.len()));
        let mut strategy = FeatureMerge::new(self.config.feature, None, self.structures.len());
        self.merge_along(guide_tree, distances, &mut strategy)
    }

    /// Align the structures by their coordinates, along a guide tree built from the RMSD and coverage
    /// of the seed alignment.
    pub fn align_coordinates(&self, seed: &MultipleAlignment) -> Result<MultipleAlignmentResult> {
        info!(
            "Aligning {} structures by coordinates",
            self.structures.len()
        );
        let matrices = pairwise_rmsd_matrix(
            self.structures,
            seed,
            self.config
                .realign_pairs
                .then_some(&self.config.coordinate),
        )?;
        let guide_tree = GuideTree::build(matrices.distance.view())?;
        self.align_coordinates_along(seed, guide_tree, matrices.distance)
    }

    /// Align the structures by their coordinates along the given guide tree.
    pub fn align_coordinates_along(
        &self,
        seed: &MultipleAlignment,
        guide_tree: GuideTree,
        distances: Array2<f64>,
    ) -> Result<MultipleAlignmentResult> {
        let leaf_seeds = seed_rows(self.structures, seed)?
            .into_iter()
            .cloned()
            .collect();
        let mut strategy = CoordinateMerge::new(self.config.coordinate, leaf_seeds);
        self.merge_along(guide_tree, distances, &mut strategy)
    }

    /// Align by features first, then refine by coordinates using the feature alignment as seed.
    pub fn align_progressive(&self) -> Result<MultipleAlignmentResult> {
        let feature_result = self.align_features()?;
        info!(
            "Feature alignment has {} columns, refining it by coordinates",
            feature_result.alignment().column_count()
        );
        self.align_coordinates(feature_result.alignment())
    }

    fn merge_along(
        &self,
        guide_tree: GuideTree,
        distances: Array2<f64>,
        strategy: &mut impl MergeStrategy,
    ) -> Result<MultipleAlignmentResult> {
        let leaf_count = self.structures.len();
        if guide_tree.leaf_count() != leaf_count {
            return Err(Error::MatrixSizeMismatch {
                expected: leaf_count,
                actual: guide_tree.leaf_count(),
            });
        }
        guide_tree.validate()?;

        let mut nodes: Vec<Structure> = self.structures.to_vec();
        let mut snapshots: Vec<NodeAlignment> = self
            .structures
            .iter()
            .map(|structure| NodeAlignment::leaf(structure.name(), structure.residue_count()))
            .collect();

        for merge in guide_tree.merges() {
            let parent_id = nodes.len();
            let name = match merge.parent {
                Some(parent) => format!("{INTERNAL_NODE_PREFIX}{parent}"),
                None => ROOT_NAME.to_string(),
            };

            let first = &nodes[merge.first];
            let second = &nodes[merge.second];
            debug!("Merging {} and {} into {name}", first.name(), second.name());

            let alignment = strategy.align_pair(merge.first, first, merge.second, second)?;
            trace!("Pairwise rows {} and {}", alignment.first(), alignment.second());
            debug_assert!(
                alignment
                    .first()
                    .is_complete_permutation(first.residue_count())
            );
            debug_assert!(
                alignment
                    .second()
                    .is_complete_permutation(second.residue_count())
            );

            let parent = merge_structures(
                name,
                first,
                alignment.first(),
                second,
                alignment.second(),
            )?;
            let snapshot = NodeAlignment::merge(
                &snapshots[merge.first],
                alignment.first(),
                &snapshots[merge.second],
                alignment.second(),
            )?;
            debug_assert_eq!(snapshot.column_count(), parent.residue_count());
            debug_assert!(!snapshot.has_all_gap_column());

            strategy.record_merge(merge.first, parent_id, &alignment)?;
            nodes.push(parent);
            snapshots.push(snapshot);
        }

        let alignment = snapshots
            .pop()
            .map(MultipleAlignment::from)
            .ok_or(Error::NoStructures)?;
        info!(
            "Aligned {} structures into {} columns",
            leaf_count,
            alignment.column_count()
        );

        Ok(MultipleAlignmentResult {
            alignment,
            guide_tree,
            distances,
            internal_nodes: nodes.split_off(leaf_count),
        })
    }
}

/// Build the consensus of two structures aligned by the given rows.
///
/// The second structure is superimposed onto the first one using the common positions of the rows.
/// Coordinates are averaged per column, and features are averaged if both structures have them.
fn merge_structures(
    name: String,
    first: &Structure,
    first_row: &AlignmentRow,
    second: &Structure,
    second_row: &AlignmentRow,
) -> Result<Structure> {
    let (first_positions, second_positions): (Vec<_>, Vec<_>) =
        common_positions(first_row, second_row).into_iter().unzip();
    let fixed = select_rows(first.coordinates(), &first_positions)?;
    let moving = select_rows(second.coordinates(), &second_positions)?;
    let superimposed = Superposition::fit(fixed.view(), moving.view())?.apply(second.coordinates());

    let coordinates = consensus_mean(
        first_row.gapped_data(first.coordinates())?.view(),
        second_row.gapped_data(superimposed.view())?.view(),
    );

    let features = match (first.features(), second.features()) {
        (Some(first_features), Some(second_features)) => {
            if first_features.ncols() != second_features.ncols() {
                return Err(Error::FeatureDimensionMismatch {
                    first: first.name().to_string(),
                    second: second.name().to_string(),
                    first_dimension: first_features.ncols(),
                    second_dimension: second_features.ncols(),
                });
            }
            Some(consensus_mean(
                first_row.gapped_data(first_features)?.view(),
                second_row.gapped_data(second_features)?.view(),
            ))
        }
        _ => None,
    };

    Structure::new(name, None, coordinates, features)
}

/// The element-wise mean of two arrays, ignoring NaN values.
/// Elements that are NaN in both arrays stay NaN.
pub fn consensus_mean(first: ArrayView2<f64>, second: ArrayView2<f64>) -> Array2<f64> {
    Zip::from(first)
        .and(second)
        .map_collect(|&a, &b| match (a.is_nan(), b.is_nan()) {
            (false, false) => (a + b) / 2.0,
            (false, true) => a,
            (true, false) => b,
            (true, true) => f64::NAN,
        })
}

impl MultipleAlignmentResult {
    pub fn alignment(&self) -> &MultipleAlignment {
        &self.alignment
    }

    pub fn guide_tree(&self) -> &GuideTree {
        &self.guide_tree
    }

    /// The distance matrix the guide tree was built from.
    pub fn distances(&self) -> ArrayView2<'_, f64> {
        self.distances.view()
    }

    /// The consensus structures created by the merges, in creation order.
    pub fn internal_nodes(&self) -> &[Structure] {
        &self.internal_nodes
    }

    /// The consensus of all structures, or `None` if only one structure was aligned.
    pub fn root(&self) -> Option<&Structure> {
        self.internal_nodes.last()
    }

    /// The number of columns in which no structure has a gap.
    pub fn core_column_count(&self) -> usize {
        (0..self.alignment.column_count())
            .filter(|&column| {
                self.alignment
                    .rows()
                    .all(|(_, row)| !row[column].is_gap())
            })
            .count()
    }
}
