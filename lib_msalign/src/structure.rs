//! Protein structures as consumed and produced by the aligner.

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// A named chain of residues with one 3D point per residue and optional per-residue features.
///
/// Leaves are built from extracted coordinates and features.
/// Internal nodes of the guide tree are built by the multiple aligner and carry no sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: String,
    sequence: Option<String>,
    coordinates: Array2<f64>,
    features: Option<Array2<f64>>,
}

impl Structure {
    /// Returns an error if the sequence, coordinates and features disagree on the number of residues.
    pub fn new(
        name: impl Into<String>,
        sequence: Option<String>,
        coordinates: Array2<f64>,
        features: Option<Array2<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        let residue_count = coordinates.nrows();

        if coordinates.ncols() != 3 {
            return Err(Error::CoordinateDimension {
                name,
                actual: coordinates.ncols(),
            });
        }

        if let Some(sequence) = &sequence {
            let sequence_length = sequence.chars().count();
            if sequence_length != residue_count {
                return Err(Error::ResidueCountMismatch {
                    name,
                    kind: "sequence",
                    coordinates: residue_count,
                    actual: sequence_length,
                });
            }
        }

        if let Some(features) = &features {
            if features.nrows() != residue_count {
                return Err(Error::ResidueCountMismatch {
                    name,
                    kind: "feature array",
                    coordinates: residue_count,
                    actual: features.nrows(),
                });
            }
        }

        Ok(Self {
            name,
            sequence,
            coordinates,
            features,
        })
    }

    /// Build a structure from a list of points, e.g. alpha-carbon positions.
    pub fn from_points(
        name: impl Into<String>,
        sequence: Option<String>,
        points: &[[f64; 3]],
        features: Option<Array2<f64>>,
    ) -> Result<Self> {
        let coordinates = Array2::from_shape_fn((points.len(), 3), |(row, axis)| points[row][axis]);
        Self::new(name, sequence, coordinates, features)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn coordinates(&self) -> ArrayView2<'_, f64> {
        self.coordinates.view()
    }

    pub fn features(&self) -> Option<ArrayView2<'_, f64>> {
        self.features.as_ref().map(Array2::view)
    }

    pub fn residue_count(&self) -> usize {
        self.coordinates.nrows()
    }

    pub fn feature_dimension(&self) -> Option<usize> {
        self.features.as_ref().map(Array2::ncols)
    }
}
