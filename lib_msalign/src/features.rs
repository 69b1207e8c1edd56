//! Assembly of per-residue feature matrices.
//!
//! Secondary structure features are produced by DSSP, which reports them per residue number.
//! Fluctuation features are computed from the alpha-carbon coordinates with elastic network models.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

pub mod normal_modes;

/// The kinds of per-residue features.
///
/// The order of the variants is the column order of assembled feature matrices.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FeatureKind {
    /// Offset of the first hydrogen bond partner from N-H to C=O.
    NhO1Index,
    NhO1Energy,
    NhO2Index,
    NhO2Energy,
    /// Offset of the first hydrogen bond partner from C=O to N-H.
    ONh1Index,
    ONh1Energy,
    ONh2Index,
    ONh2Energy,
    /// Solvent accessibility.
    Accessibility,
    /// Virtual torsion angle of the alpha-carbons `i - 1`, `i`, `i + 1` and `i + 2`.
    Alpha,
    /// Virtual bond angle of the alpha-carbons `i - 2`, `i` and `i + 2`.
    Kappa,
    Phi,
    Psi,
    /// Cosine of the angle between the C=O of this and the previous residue.
    Tco,
    /// Squared fluctuations of an anisotropic network model.
    Anm,
    /// Squared fluctuations of a Gaussian network model.
    Gnm,
}

impl FeatureKind {
    pub const ALL: [Self; 16] = [
        Self::NhO1Index,
        Self::NhO1Energy,
        Self::NhO2Index,
        Self::NhO2Energy,
        Self::ONh1Index,
        Self::ONh1Energy,
        Self::ONh2Index,
        Self::ONh2Energy,
        Self::Accessibility,
        Self::Alpha,
        Self::Kappa,
        Self::Phi,
        Self::Psi,
        Self::Tco,
        Self::Anm,
        Self::Gnm,
    ];

    /// The name of the feature as used in DSSP data labels and configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NhO1Index => "dssp_NH_O_1_index",
            Self::NhO1Energy => "dssp_NH_O_1_energy",
            Self::NhO2Index => "dssp_NH_O_2_index",
            Self::NhO2Energy => "dssp_NH_O_2_energy",
            Self::ONh1Index => "dssp_O_NH_1_index",
            Self::ONh1Energy => "dssp_O_NH_1_energy",
            Self::ONh2Index => "dssp_O_NH_2_index",
            Self::ONh2Energy => "dssp_O_NH_2_energy",
            Self::Accessibility => "dssp_acc",
            Self::Alpha => "dssp_alpha",
            Self::Kappa => "dssp_kappa",
            Self::Phi => "dssp_phi",
            Self::Psi => "dssp_psi",
            Self::Tco => "dssp_tco",
            Self::Anm => "anm",
            Self::Gnm => "gnm",
        }
    }

    pub fn is_dssp(&self) -> bool {
        !matches!(self, Self::Anm | Self::Gnm)
    }
}

/// Convert sparse per-residue records into a dense column.
///
/// Records are pairs of a one-based residue number and a value.
/// Residues without record get the value zero, and records outside of the structure are ignored.
pub fn residue_feature_column(
    residue_count: usize,
    records: impl IntoIterator<Item = (usize, f64)>,
) -> Vec<f64> {
    let mut column = vec![0.0; residue_count];
    for (residue_number, value) in records {
        match residue_number
            .checked_sub(1)
            .and_then(|index| column.get_mut(index))
        {
            Some(entry) => *entry = value,
            None => debug!(
                "Ignoring feature record of residue {residue_number} outside of {residue_count} residues"
            ),
        }
    }
    column
}

/// Collects feature columns of one structure.
#[derive(Debug, Clone)]
pub struct FeatureMatrixBuilder {
    residue_count: usize,
    columns: BTreeMap<FeatureKind, Vec<f64>>,
}

impl FeatureMatrixBuilder {
    pub fn new(residue_count: usize) -> Self {
        Self {
            residue_count,
            columns: Default::default(),
        }
    }

    /// Add a dense column with one value per residue.
    pub fn add_column(&mut self, kind: FeatureKind, column: Vec<f64>) -> Result<&mut Self> {
        if column.len() != self.residue_count {
            return Err(Error::FeatureColumnLength {
                feature: kind.to_string(),
                expected: self.residue_count,
                actual: column.len(),
            });
        }
        if self.columns.contains_key(&kind) {
            return Err(Error::DuplicateFeature(kind.to_string()));
        }

        self.columns.insert(kind, column);
        Ok(self)
    }

    /// Add a column from sparse records, see [`residue_feature_column`].
    pub fn add_records(
        &mut self,
        kind: FeatureKind,
        records: impl IntoIterator<Item = (usize, f64)>,
    ) -> Result<&mut Self> {
        let column = residue_feature_column(self.residue_count, records);
        self.add_column(kind, column)
    }

    /// Add the squared fluctuations of both elastic network models computed from alpha-carbon coordinates.
    pub fn add_normal_modes(
        &mut self,
        coordinates: ArrayView2<f64>,
        mode_count: usize,
    ) -> Result<&mut Self> {
        let gnm = normal_modes::GaussianNetworkModel {
            mode_count,
            ..Default::default()
        };
        let anm = normal_modes::AnisotropicNetworkModel {
            mode_count,
            ..Default::default()
        };

        self.add_column(FeatureKind::Gnm, gnm.squared_fluctuations(coordinates))?;
        self.add_column(FeatureKind::Anm, anm.squared_fluctuations(coordinates))
    }

    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.columns.keys().copied()
    }

    /// Assemble the columns into a matrix with one row per residue, ordered by [`FeatureKind`].
    pub fn build(&self) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.residue_count, self.columns.len()));
        for (mut target, column) in matrix.columns_mut().into_iter().zip(self.columns.values()) {
            for (target, value) in target.iter_mut().zip(column) {
                *target = *value;
            }
        }
        matrix
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FeatureKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::error::Error;

    use super::{FeatureKind, FeatureMatrixBuilder, residue_feature_column};

    #[test]
    fn test_missing_records_are_zero() {
        // Residue 2 has no hydrogen bond partner.
        let column = residue_feature_column(3, [(1, -1.4), (3, -0.7), (7, 5.0)]);
        assert_eq!(column, vec![-1.4, 0.0, -0.7]);
        assert_eq!(residue_feature_column(2, [(0, 1.0)]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_builder_order() {
        let mut builder = FeatureMatrixBuilder::new(2);
        builder
            .add_column(FeatureKind::Tco, vec![0.9, -0.9])
            .unwrap()
            .add_records(FeatureKind::NhO1Energy, [(2, -2.0)])
            .unwrap();

        assert_eq!(
            builder.kinds().collect::<Vec<_>>(),
            vec![FeatureKind::NhO1Energy, FeatureKind::Tco]
        );
        assert_eq!(builder.build(), array![[0.0, 0.9], [-2.0, -0.9]]);
    }

    #[test]
    fn test_builder_errors() {
        let mut builder = FeatureMatrixBuilder::new(2);
        assert!(matches!(
            builder.add_column(FeatureKind::Phi, vec![1.0]),
            Err(Error::FeatureColumnLength {
                expected: 2,
                actual: 1,
                ..
            })
        ));

        builder.add_column(FeatureKind::Phi, vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            builder.add_column(FeatureKind::Phi, vec![1.0, 2.0]),
            Err(Error::DuplicateFeature(name)) if name == "dssp_phi"
        ));
    }

    #[test]
    fn test_names() {
        for kind in FeatureKind::ALL {
            assert_eq!(kind.name().parse::<FeatureKind>().unwrap(), kind);
        }
        assert!(FeatureKind::Kappa.is_dssp());
        assert!(!FeatureKind::Gnm.is_dssp());
        assert!(matches!(
            "dssp_bp1".parse::<FeatureKind>(),
            Err(Error::UnknownFeature(_))
        ));
    }
}
