//! Guide trees for progressive alignment, built with neighbor joining.

use log::{debug, trace};
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

#[cfg(test)]
mod tests;

/// Identifies a node of the guide tree.
/// Leaves have the ids `0..leaf_count`, internal nodes are numbered consecutively after the leaves.
pub type NodeId = usize;

/// One step of progressive alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Merge {
    pub first: NodeId,
    pub second: NodeId,
    /// The id of the created node, or `None` for the root merge.
    pub parent: Option<NodeId>,
}

/// The raw output of neighbor joining.
///
/// Each join except the last emits the two rows `[child, parent]` with the same parent.
/// The last join emits the single row `[first, second]` joining the two remaining nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborJoining {
    pub rows: Vec<[NodeId; 2]>,
    /// The length of the edge above each node, indexed by node id.
    pub branch_lengths: Vec<f64>,
}

/// An ordered list of merges, such that each merge only references nodes created by earlier merges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuideTree {
    leaf_count: usize,
    merges: Vec<Merge>,
    branch_lengths: Vec<f64>,
}

/// Join the nodes of a distance matrix until two are left.
///
/// The pair with the minimum Q-criterion is joined first, ties are broken by the first pair in row-major order.
/// The joined nodes are removed from the list of active nodes, and the new node is appended to it.
pub fn neighbor_joining(distances: ArrayView2<f64>) -> Result<NeighborJoining> {
    let leaf_count = validate_distance_matrix(distances)?;
    if leaf_count < 2 {
        return Ok(NeighborJoining {
            rows: Vec::new(),
            branch_lengths: vec![0.0; leaf_count],
        });
    }

    let mut active: Vec<NodeId> = (0..leaf_count).collect();
    let mut working = distances.to_owned();
    let mut rows = Vec::with_capacity(2 * leaf_count - 3);
    let mut branch_lengths = vec![0.0; 2 * leaf_count - 2];

    while active.len() > 2 {
        let n = active.len();
        let sums: Vec<f64> = working.rows().into_iter().map(|row| row.sum()).collect();

        let (mut min_i, mut min_j) = (0, 1);
        let mut min_q = f64::INFINITY;
        for i in 0..n {
            for j in (i + 1)..n {
                let q = (n as f64 - 2.0) * working[[i, j]] - sums[i] - sums[j];
                if q < min_q {
                    min_q = q;
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let d_ij = working[[min_i, min_j]];
        let b_i = d_ij / 2.0 + (sums[min_i] - sums[min_j]) / (2.0 * (n as f64 - 2.0));
        let b_j = d_ij - b_i;

        let parent = leaf_count + rows.len() / 2;
        let (node_i, node_j) = (active[min_i], active[min_j]);
        branch_lengths[node_i] = b_i.max(0.0);
        branch_lengths[node_j] = b_j.max(0.0);
        rows.push([node_i, parent]);
        rows.push([node_j, parent]);
        trace!("Joined {node_i} and {node_j} into {parent} with Q-criterion {min_q}");

        let remaining: Vec<usize> = (0..n).filter(|&k| k != min_i && k != min_j).collect();
        let next = Array2::from_shape_fn((n - 1, n - 1), |(a, b)| {
            match (remaining.get(a), remaining.get(b)) {
                (Some(&a), Some(&b)) => working[[a, b]],
                (Some(&k), None) | (None, Some(&k)) => {
                    (working[[min_i, k]] + working[[min_j, k]] - d_ij) / 2.0
                }
                (None, None) => 0.0,
            }
        });
        working = next;
        active = remaining
            .into_iter()
            .map(|k| active[k])
            .chain([parent])
            .collect();
    }

    let d_final = working[[0, 1]];
    branch_lengths[active[0]] = (d_final / 2.0).max(0.0);
    branch_lengths[active[1]] = (d_final / 2.0).max(0.0);
    rows.push([active[0], active[1]]);

    debug!("Built a neighbor joining tree with {} rows", rows.len());
    Ok(NeighborJoining {
        rows,
        branch_lengths,
    })
}

fn validate_distance_matrix(distances: ArrayView2<f64>) -> Result<usize> {
    let (rows, columns) = distances.dim();
    if rows != columns {
        return Err(Error::NonSquareMatrix { rows, columns });
    }

    for ((row, column), value) in distances.indexed_iter() {
        if !value.is_finite() {
            return Err(Error::NonFiniteMatrixEntry { row, column });
        }
    }

    Ok(rows)
}

impl GuideTree {
    /// Build a guide tree from a distance matrix via neighbor joining.
    pub fn build(distances: ArrayView2<f64>) -> Result<Self> {
        let leaf_count = validate_distance_matrix(distances)?;
        if leaf_count == 0 {
            return Err(Error::NoStructures);
        }

        let NeighborJoining {
            rows,
            branch_lengths,
        } = neighbor_joining(distances)?;
        let mut tree = Self::from_rows(&rows, leaf_count)?;
        tree.branch_lengths = branch_lengths;
        Ok(tree)
    }

    /// Validate the row form of a tree and convert it into a list of merges.
    ///
    /// Branch lengths are initialised to zero.
    pub fn from_rows(rows: &[[NodeId; 2]], leaf_count: usize) -> Result<Self> {
        if leaf_count == 0 {
            return Err(Error::NoStructures);
        }

        let expected = (2 * leaf_count).saturating_sub(3);
        if rows.len() != expected {
            return Err(Error::GuideTreeRowCount {
                leaves: leaf_count,
                expected,
                actual: rows.len(),
            });
        }

        let mut used = vec![false; 2 * leaf_count - 1];
        let mut merges = Vec::with_capacity(leaf_count - 1);
        let mut use_node = |merge: usize, node: NodeId, existing: usize| {
            if node >= existing {
                return Err(Error::GuideTreeUnknownNode { merge, node });
            }
            if std::mem::replace(&mut used[node], true) {
                return Err(Error::GuideTreeReusedNode { node });
            }
            Ok(())
        };

        for (merge, pair) in rows.chunks(2).enumerate() {
            let existing = leaf_count + merge;
            let (first, second, parent) = match pair {
                [[first, parent], [second, next_parent]] => {
                    if parent != next_parent {
                        return Err(Error::GuideTreeParentMismatch {
                            row: 2 * merge,
                            next_row: 2 * merge + 1,
                            parent: *parent,
                            next_parent: *next_parent,
                        });
                    }
                    if *parent != existing {
                        return Err(Error::GuideTreeUnexpectedParent {
                            merge,
                            expected: existing,
                            actual: *parent,
                        });
                    }
                    (*first, *second, Some(*parent))
                }
                [[first, second]] => (*first, *second, None),
                _ => unreachable!("chunks of two are never empty"),
            };

            if first == second {
                return Err(Error::GuideTreeSelfMerge(first));
            }
            use_node(merge, first, existing)?;
            use_node(merge, second, existing)?;

            merges.push(Merge {
                first,
                second,
                parent,
            });
        }

        Ok(Self {
            leaf_count,
            merges,
            branch_lengths: vec![0.0; 2 * leaf_count - 2],
        })
    }

    /// Check that the merges form a valid tree over `leaf_count` leaves.
    ///
    /// Trees built by [`build`](Self::build) or [`from_rows`](Self::from_rows) are always valid,
    /// but deserialised trees are not checked on construction.
    pub fn validate(&self) -> Result<()> {
        Self::from_rows(&self.to_rows(), self.leaf_count).map(|_| ())
    }

    #[cfg(test)]
    pub(crate) fn from_merges_unchecked(leaf_count: usize, merges: Vec<Merge>) -> Self {
        Self {
            leaf_count,
            merges,
            branch_lengths: Vec::new(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// The length of the edge above each node, indexed by node id.
    /// The root has no id and no edge.
    pub fn branch_lengths(&self) -> &[f64] {
        &self.branch_lengths
    }

    /// Convert back into the row form produced by neighbor joining.
    pub fn to_rows(&self) -> Vec<[NodeId; 2]> {
        self.merges
            .iter()
            .flat_map(|merge| match merge.parent {
                Some(parent) => vec![[merge.first, parent], [merge.second, parent]],
                None => vec![[merge.first, merge.second]],
            })
            .collect()
    }
}
