//! How the pairwise alignment of the two children of a merge is obtained.

use log::debug;

use crate::{
    alignment::{AlignmentRow, PairwiseAlignment},
    dtw::{DtwParameters, align_coordinates, align_features},
    error::{Error, Result},
    guide_tree::NodeId,
    pairwise_matrix::PairwiseAlignmentCache,
    structure::Structure,
};


pub trait MergeStrategy {
    /// Align the two children of a merge. The rows of the result index the residues of the children.
    fn align_pair(
        &self,
        first_id: NodeId,
        first: &Structure,
        second_id: NodeId,
        second: &Structure,
    ) -> Result<PairwiseAlignment>;

    /// Called after the node `parent_id` was created from the children of `alignment`.
    fn record_merge(
        &mut self,
        first_id: NodeId,
        parent_id: NodeId,
        alignment: &PairwiseAlignment,
    ) -> Result<()>;
}

/// Align children by their features, reusing cached alignments of leaf pairs.
pub struct FeatureMerge<'cache> {
    parameters: DtwParameters,
    cache: Option<&'cache PairwiseAlignmentCache>,
    /// Only nodes with an id below this are leaves, the cache holds no internal nodes.
    leaf_count: usize,
}

/// Align children by their coordinates, after superimposing them using a seed alignment.
pub struct CoordinateMerge {
    parameters: DtwParameters,
    /// The seed row of each node, indexed by node id.
    seeds: Vec<AlignmentRow>,
}

impl<'cache> FeatureMerge<'cache> {
    pub fn new(
        parameters: DtwParameters,
        cache: Option<&'cache PairwiseAlignmentCache>,
        leaf_count: usize,
    ) -> Self {
        Self {
            parameters,
            cache,
            leaf_count,
        }
    }
}

impl MergeStrategy for FeatureMerge<'_> {
    fn align_pair(
        &self,
        first_id: NodeId,
        first: &Structure,
        second_id: NodeId,
        second: &Structure,
    ) -> Result<PairwiseAlignment> {
        let both_leaves = first_id < self.leaf_count && second_id < self.leaf_count;
        if let Some(alignment) = self.cache.filter(|_| both_leaves).and_then(|cache| {
            cache.get_with_parameters(first.name(), second.name(), &self.parameters)
        }) {
            return Ok(alignment.clone());
        }

        debug!(
            "Computing feature alignment of {} and {}",
            first.name(),
            second.name()
        );
        align_features(first, second, &self.parameters)
    }

    fn record_merge(
        &mut self,
        _first_id: NodeId,
        _parent_id: NodeId,
        _alignment: &PairwiseAlignment,
    ) -> Result<()> {
        Ok(())
    }
}

impl CoordinateMerge {
    /// The seed rows are given in the order of the leaves.
    pub fn new(parameters: DtwParameters, leaf_seeds: Vec<AlignmentRow>) -> Self {
        Self {
            parameters,
            seeds: leaf_seeds,
        }
    }

    fn seed(&self, id: NodeId) -> Result<&AlignmentRow> {
        self.seeds
            .get(id)
            .ok_or_else(|| Error::MissingSeedAlignment(format!("node {id}")))
    }
}

impl MergeStrategy for CoordinateMerge {
    fn align_pair(
        &self,
        first_id: NodeId,
        first: &Structure,
        second_id: NodeId,
        second: &Structure,
    ) -> Result<PairwiseAlignment> {
        let seed = (self.seed(first_id)?, self.seed(second_id)?);
        align_coordinates(first, second, Some(seed), &self.parameters)
    }

    /// The parent inherits the seed row of the first child, with residues renamed to the parent's columns.
    fn record_merge(
        &mut self,
        first_id: NodeId,
        parent_id: NodeId,
        alignment: &PairwiseAlignment,
    ) -> Result<()> {
        debug_assert_eq!(parent_id, self.seeds.len());
        let seed = self.seed(first_id)?.reindex_residues(alignment.first());
        self.seeds.push(seed);
        Ok(())
    }
}
