use crate::{
    dtw::DtwParameters,
    error::{Error, Result},
};

/// Parameters of a multiple alignment run.
///
/// Feature alignment and coordinate alignment use separate DTW parameters.
/// Pairwise alignments cached while building the feature score matrix are only reused
/// for merges that use the same parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultipleAlignmentConfig {
    pub feature: DtwParameters,
    pub coordinate: DtwParameters,
    /// If true, the RMSD matrix of coordinate alignment is computed from fresh DTW alignments
    /// of the superimposed pairs instead of the seed alignment.
    pub realign_pairs: bool,
}

impl Default for MultipleAlignmentConfig {
    fn default() -> Self {
        Self {
            feature: DtwParameters::feature_defaults(),
            coordinate: DtwParameters::coordinate_defaults(),
            realign_pairs: true,
        }
    }
}

impl MultipleAlignmentConfig {
    /// Returns an error if a penalty or kernel width is negative or not finite.
    pub fn verify(&self) -> Result<()> {
        for (name, value) in [
            ("feature.open", self.feature.gap_penalties.open),
            ("feature.extend", self.feature.gap_penalties.extend),
            ("feature.gamma", self.feature.gamma),
            ("coordinate.open", self.coordinate.gap_penalties.open),
            ("coordinate.extend", self.coordinate.gap_penalties.extend),
            ("coordinate.gamma", self.coordinate.gamma),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParameter { name, value });
            }
        }

        Ok(())
    }
}
