use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, ensure};
use lib_msalign::{
    features::{FeatureKind, FeatureMatrixBuilder},
    structure::Structure,
};
use log::debug;
use ndarray::Array2;
use serde::Deserialize;

#[derive(Deserialize)]
struct StructureFile {
    #[serde(rename = "structure", default)]
    structures: Vec<StructureRecord>,
}

#[derive(Deserialize)]
struct StructureRecord {
    name: String,
    sequence: Option<String>,
    /// One alpha-carbon position per residue.
    coordinates: Vec<[f64; 3]>,
    /// One row of feature values per residue.
    features: Option<Vec<Vec<f64>>>,
    /// Sparse feature records by DSSP feature name, as pairs of one-based residue number and value.
    #[serde(default)]
    dssp: BTreeMap<String, Vec<(usize, f64)>>,
}

pub fn read_structure_file(path: &Path, normal_modes: Option<usize>) -> Result<Vec<Structure>> {
    let mut file = BufReader::new(File::open(path).with_context(|| format!("Opening {path:?}"))?);
    let mut input = String::new();
    file.read_to_string(&mut input)?;
    let file: StructureFile =
        toml::from_str(&input).with_context(|| format!("Parsing {path:?}"))?;

    file.structures
        .into_iter()
        .map(|record| record.into_structure(normal_modes))
        .collect()
}

impl StructureRecord {
    fn into_structure(self, normal_modes: Option<usize>) -> Result<Structure> {
        let features = if let Some(features) = self.features {
            ensure!(
                self.dssp.is_empty(),
                "Structure {} has both dense features and DSSP records",
                self.name
            );
            Some(dense_features(&self.name, features)?)
        } else if !self.dssp.is_empty() || normal_modes.is_some() {
            let mut builder = FeatureMatrixBuilder::new(self.coordinates.len());
            for (feature, records) in self.dssp {
                let kind: FeatureKind = feature.parse()?;
                ensure!(
                    kind.is_dssp(),
                    "Feature {kind} of structure {} is not a DSSP feature",
                    self.name
                );
                builder.add_records(kind, records)?;
            }

            if let Some(mode_count) = normal_modes {
                let coordinates = Array2::from_shape_fn(
                    (self.coordinates.len(), 3),
                    |(row, axis)| self.coordinates[row][axis],
                );
                builder.add_normal_modes(coordinates.view(), mode_count)?;
            }

            debug!(
                "Assembled features {:?} of structure {}",
                builder.kinds().map(|kind| kind.name()).collect::<Vec<_>>(),
                self.name
            );
            Some(builder.build())
        } else {
            None
        };

        Ok(Structure::from_points(
            self.name,
            self.sequence,
            &self.coordinates,
            features,
        )?)
    }
}

fn dense_features(name: &str, rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let row_count = rows.len();
    let column_count = rows.first().map(Vec::len).unwrap_or(0);
    ensure!(
        rows.iter().all(|row| row.len() == column_count),
        "The feature rows of structure {name} have different lengths"
    );

    Ok(Array2::from_shape_vec(
        (row_count, column_count),
        rows.into_iter().flatten().collect(),
    )?)
}
