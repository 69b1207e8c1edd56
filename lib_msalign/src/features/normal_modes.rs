//! Elastic network models of alpha-carbon coordinates.
//!
//! Both models connect residues closer than a cutoff with springs, and compute the squared fluctuation of each
//! residue from the lowest non-trivial modes of the network, i.e. `sum_k u_k[i]^2 / lambda_k`.

use log::trace;
use nalgebra::{DMatrix, SymmetricEigen, Vector3};
use ndarray::ArrayView2;

pub const GNM_CUTOFF: f64 = 7.3;
pub const ANM_CUTOFF: f64 = 15.0;
pub const DEFAULT_MODE_COUNT: usize = 50;

/// Eigenvalues below this belong to rigid body motions.
const ZERO_MODE_THRESHOLD: f64 = 1e-6;

/// Isotropic model with one degree of freedom per residue, based on the Kirchhoff matrix of the contact graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNetworkModel {
    pub cutoff: f64,
    pub mode_count: usize,
}

/// Model with three degrees of freedom per residue, based on the Hessian of the spring network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnisotropicNetworkModel {
    pub cutoff: f64,
    pub mode_count: usize,
}

impl Default for GaussianNetworkModel {
    fn default() -> Self {
        Self {
            cutoff: GNM_CUTOFF,
            mode_count: DEFAULT_MODE_COUNT,
        }
    }
}

impl Default for AnisotropicNetworkModel {
    fn default() -> Self {
        Self {
            cutoff: ANM_CUTOFF,
            mode_count: DEFAULT_MODE_COUNT,
        }
    }
}

impl GaussianNetworkModel {
    pub fn kirchhoff_matrix(&self, coordinates: ArrayView2<f64>) -> DMatrix<f64> {
        let n = coordinates.nrows();
        let cutoff_squared = self.cutoff * self.cutoff;
        let mut kirchhoff = DMatrix::zeros(n, n);

        for i in 0..n {
            for j in (i + 1)..n {
                if (point(coordinates, j) - point(coordinates, i)).norm_squared() < cutoff_squared {
                    kirchhoff[(i, j)] = -1.0;
                    kirchhoff[(j, i)] = -1.0;
                    kirchhoff[(i, i)] += 1.0;
                    kirchhoff[(j, j)] += 1.0;
                }
            }
        }

        kirchhoff
    }

    pub fn squared_fluctuations(&self, coordinates: ArrayView2<f64>) -> Vec<f64> {
        let n = coordinates.nrows();
        if n < 2 {
            return vec![0.0; n];
        }

        mode_fluctuations(self.kirchhoff_matrix(coordinates), self.mode_count, 1)
    }
}

impl AnisotropicNetworkModel {
    pub fn hessian_matrix(&self, coordinates: ArrayView2<f64>) -> DMatrix<f64> {
        let n = coordinates.nrows();
        let cutoff_squared = self.cutoff * self.cutoff;
        let mut hessian = DMatrix::zeros(3 * n, 3 * n);

        for i in 0..n {
            for j in (i + 1)..n {
                let offset = point(coordinates, j) - point(coordinates, i);
                let distance_squared = offset.norm_squared();
                if distance_squared >= cutoff_squared || distance_squared == 0.0 {
                    continue;
                }

                let block = -(offset * offset.transpose()) / distance_squared;
                for a in 0..3 {
                    for b in 0..3 {
                        hessian[(3 * i + a, 3 * j + b)] = block[(a, b)];
                        hessian[(3 * j + a, 3 * i + b)] = block[(a, b)];
                        hessian[(3 * i + a, 3 * i + b)] -= block[(a, b)];
                        hessian[(3 * j + a, 3 * j + b)] -= block[(a, b)];
                    }
                }
            }
        }

        hessian
    }

    pub fn squared_fluctuations(&self, coordinates: ArrayView2<f64>) -> Vec<f64> {
        let n = coordinates.nrows();
        if n < 2 {
            return vec![0.0; n];
        }

        mode_fluctuations(self.hessian_matrix(coordinates), self.mode_count, 3)
    }
}

/// Sum the contributions of the lowest non-zero modes of `matrix`.
/// Each residue owns `dimension` consecutive rows of the matrix.
fn mode_fluctuations(matrix: DMatrix<f64>, mode_count: usize, dimension: usize) -> Vec<f64> {
    let residue_count = matrix.nrows() / dimension;
    let eigen = SymmetricEigen::new(matrix);

    let mut modes: Vec<(usize, f64)> = eigen.eigenvalues.iter().copied().enumerate().collect();
    modes.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut fluctuations = vec![0.0; residue_count];
    let mut used_modes = 0;
    for (index, eigenvalue) in modes
        .into_iter()
        .filter(|(_, eigenvalue)| *eigenvalue > ZERO_MODE_THRESHOLD)
        .take(mode_count)
    {
        let eigenvector = eigen.eigenvectors.column(index);
        for (row, component) in eigenvector.iter().enumerate() {
            fluctuations[row / dimension] += component * component / eigenvalue;
        }
        used_modes += 1;
    }

    trace!("Computed fluctuations of {residue_count} residues from {used_modes} modes");
    fluctuations
}

fn point(coordinates: ArrayView2<f64>, row: usize) -> Vector3<f64> {
    Vector3::new(
        coordinates[[row, 0]],
        coordinates[[row, 1]],
        coordinates[[row, 2]],
    )
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::{AnisotropicNetworkModel, GaussianNetworkModel};

    fn straight_chain(length: usize) -> Array2<f64> {
        Array2::from_shape_fn((length, 3), |(row, axis)| {
            if axis == 0 { 3.8 * row as f64 } else { 0.0 }
        })
    }

    fn helix(length: usize) -> Array2<f64> {
        Array2::from_shape_fn((length, 3), |(row, axis)| {
            let angle = 100f64.to_radians() * row as f64;
            match axis {
                0 => 2.3 * angle.cos(),
                1 => 2.3 * angle.sin(),
                _ => 1.5 * row as f64,
            }
        })
    }

    #[test]
    fn test_gnm_chain() {
        let model = GaussianNetworkModel::default();
        let chain = straight_chain(9);

        let kirchhoff = model.kirchhoff_matrix(chain.view());
        assert_eq!(kirchhoff[(0, 0)], 1.0);
        assert_eq!(kirchhoff[(4, 4)], 2.0);
        assert_eq!(kirchhoff[(0, 2)], 0.0);

        let fluctuations = model.squared_fluctuations(chain.view());
        assert_eq!(fluctuations.len(), 9);
        assert!(fluctuations.iter().all(|value| *value > 0.0));
        assert!((fluctuations[0] - fluctuations[8]).abs() < 1e-9);
        assert!(fluctuations[0] > fluctuations[4]);
    }

    #[test]
    fn test_anm_helix() {
        let model = AnisotropicNetworkModel::default();
        let coordinates = helix(12);

        let hessian = model.hessian_matrix(coordinates.view());
        for row in 0..hessian.nrows() {
            assert!(hessian.row(row).sum().abs() < 1e-9);
        }

        let fluctuations = model.squared_fluctuations(coordinates.view());
        assert_eq!(fluctuations.len(), 12);
        assert!(fluctuations.iter().all(|value| value.is_finite() && *value > 0.0));
        assert!(fluctuations[0] > fluctuations[6]);
    }

    #[test]
    fn test_mode_count_limit() {
        let chain = straight_chain(9);
        let all = GaussianNetworkModel::default().squared_fluctuations(chain.view());
        let one = GaussianNetworkModel {
            mode_count: 1,
            ..Default::default()
        }
        .squared_fluctuations(chain.view());

        for (one, all) in one.iter().zip(&all) {
            assert!(one <= all);
        }
    }

    #[test]
    fn test_tiny_inputs() {
        let single = straight_chain(1);
        assert_eq!(
            GaussianNetworkModel::default().squared_fluctuations(single.view()),
            vec![0.0]
        );
        assert_eq!(
            AnisotropicNetworkModel::default().squared_fluctuations(single.view()),
            vec![0.0]
        );
    }
}
