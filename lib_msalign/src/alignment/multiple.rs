use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    structure::Structure,
};

use super::AlignmentRow;

/// The rows of all leaves below one node of the guide tree, in the column space of that node.
///
/// Snapshots are immutable, merging two of them creates a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeAlignment {
    rows: BTreeMap<String, AlignmentRow>,
    column_count: usize,
}

/// The final alignment of all input structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleAlignment {
    rows: BTreeMap<String, AlignmentRow>,
    column_count: usize,
}

impl NodeAlignment {
    /// The snapshot of a leaf, which aligns only the leaf to itself.
    pub fn leaf(name: impl Into<String>, residue_count: usize) -> Self {
        Self {
            rows: BTreeMap::from([(name.into(), AlignmentRow::identity(residue_count))]),
            column_count: residue_count,
        }
    }

    /// Build a snapshot from rows that all have the same length.
    pub fn from_rows(rows: BTreeMap<String, AlignmentRow>) -> Result<Self> {
        let column_count = rows.values().next().map(AlignmentRow::len).unwrap_or(0);
        if let Some(row) = rows.values().find(|row| row.len() != column_count) {
            return Err(Error::RowLengthMismatch {
                first: column_count,
                second: row.len(),
            });
        }

        Ok(Self { rows, column_count })
    }

    /// Merge the snapshots of two children using the pairwise alignment of the children.
    ///
    /// `first_through` and `second_through` are the rows of the pairwise alignment,
    /// whose residue indices are columns of the respective child snapshot.
    pub fn merge(
        first: &NodeAlignment,
        first_through: &AlignmentRow,
        second: &NodeAlignment,
        second_through: &AlignmentRow,
    ) -> Result<Self> {
        if first_through.len() != second_through.len() {
            return Err(Error::RowLengthMismatch {
                first: first_through.len(),
                second: second_through.len(),
            });
        }

        let mut rows = BTreeMap::new();
        for (child, through) in [(first, first_through), (second, second_through)] {
            for (name, row) in &child.rows {
                if rows
                    .insert(name.clone(), row.expand_through(through)?)
                    .is_some()
                {
                    return Err(Error::DuplicateStructureName(name.clone()));
                }
            }
        }

        let merged = Self {
            rows,
            column_count: first_through.len(),
        };
        debug_assert!(merged.is_uniform());
        Ok(merged)
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row(&self, name: &str) -> Option<&AlignmentRow> {
        self.rows.get(name)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &AlignmentRow)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), row))
    }

    pub fn leaf_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn leaf_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if all rows have the column count of the snapshot.
    pub fn is_uniform(&self) -> bool {
        self.rows.values().all(|row| row.len() == self.column_count)
    }

    /// Returns true if some column is a gap in every row.
    pub fn has_all_gap_column(&self) -> bool {
        (0..self.column_count).any(|column| self.rows.values().all(|row| row[column].is_gap()))
    }
}

impl MultipleAlignment {
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row(&self, name: &str) -> Option<&AlignmentRow> {
        self.rows.get(name)
    }

    /// The rows ordered by structure name.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &AlignmentRow)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the alignment as aligned strings in the order of `structures`.
    pub fn aligned_strings(&self, structures: &[Structure]) -> Result<Vec<(String, String)>> {
        structures
            .iter()
            .map(|structure| {
                let name = structure.name();
                let row = self
                    .row(name)
                    .ok_or_else(|| Error::UnknownStructure(name.to_string()))?;
                let sequence = structure
                    .sequence()
                    .ok_or_else(|| Error::MissingSequence(name.to_string()))?;
                Ok((name.to_string(), row.to_aligned_string(sequence)?))
            })
            .collect()
    }

    /// Build an alignment from aligned strings, e.g. as read from an aligned fasta file.
    pub fn from_aligned_strings<'name>(
        aligned: impl IntoIterator<Item = (&'name str, &'name str)>,
    ) -> Result<Self> {
        let mut rows = BTreeMap::new();
        for (name, aligned) in aligned {
            if rows
                .insert(name.to_string(), AlignmentRow::from_aligned_string(aligned))
                .is_some()
            {
                return Err(Error::DuplicateStructureName(name.to_string()));
            }
        }

        Ok(NodeAlignment::from_rows(rows)?.into())
    }
}

impl From<NodeAlignment> for MultipleAlignment {
    fn from(value: NodeAlignment) -> Self {
        Self {
            rows: value.rows,
            column_count: value.column_count,
        }
    }
}
