//! Least-squares rigid superposition of point sets (Kabsch algorithm).

use log::debug;
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// Relative size of the second singular value below which a point cloud is treated as collinear.
const DEGENERACY_THRESHOLD: f64 = 1e-8;

/// A rotation followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl Superposition {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Compute the rigid transformation that maps `moving` onto `fixed` with minimum squared error.
    ///
    /// Row `i` of `moving` corresponds to row `i` of `fixed`.
    /// If there are fewer than three points, or the points are collinear, the rotation is the identity
    /// and the translation maps the centroid of `moving` onto the centroid of `fixed`.
    pub fn fit(fixed: ArrayView2<f64>, moving: ArrayView2<f64>) -> Result<Self> {
        if fixed.nrows() != moving.nrows() {
            return Err(Error::PointCountMismatch {
                fixed: fixed.nrows(),
                moving: moving.nrows(),
            });
        }
        if fixed.nrows() == 0 {
            debug!("Superimposing empty point sets, using the identity");
            return Ok(Self::identity());
        }

        let fixed_centroid = centroid(fixed);
        let moving_centroid = centroid(moving);
        let centroid_translation = Self {
            rotation: Matrix3::identity(),
            translation: fixed_centroid - moving_centroid,
        };
        if fixed.nrows() < 3 {
            debug!(
                "Superimposing only {} points, using a pure translation",
                fixed.nrows()
            );
            return Ok(centroid_translation);
        }

        let mut covariance = Matrix3::zeros();
        for (fixed, moving) in fixed.rows().into_iter().zip(moving.rows()) {
            let fixed = point(fixed) - fixed_centroid;
            let moving = point(moving) - moving_centroid;
            covariance += moving * fixed.transpose();
        }

        let svd = covariance.svd(true, true);
        let mut singular_values: Vec<f64> = svd.singular_values.iter().copied().collect();
        singular_values.sort_by(|a, b| b.total_cmp(a));
        if singular_values[1] <= DEGENERACY_THRESHOLD * singular_values[0] {
            debug!("Superimposing collinear or coincident points, using a pure translation");
            return Ok(centroid_translation);
        }

        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            debug!("Singular value decomposition failed, using a pure translation");
            return Ok(centroid_translation);
        };

        let mut v = v_t.transpose();
        let mut rotation = v * u.transpose();
        if rotation.determinant() < 0.0 {
            // Flip the axis of the smallest singular value to turn the reflection into a rotation.
            let smallest = svd.singular_values.imin();
            v.column_mut(smallest).neg_mut();
            rotation = v * u.transpose();
        }

        Ok(Self {
            rotation,
            translation: fixed_centroid - rotation * moving_centroid,
        })
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Transform each row of `coordinates`.
    pub fn apply(&self, coordinates: ArrayView2<f64>) -> Array2<f64> {
        let mut result = Array2::zeros((coordinates.nrows(), 3));
        for (mut target, source) in result.rows_mut().into_iter().zip(coordinates.rows()) {
            let transformed = self.rotation * point(source) + self.translation;
            target[0] = transformed.x;
            target[1] = transformed.y;
            target[2] = transformed.z;
        }
        result
    }
}

/// The root mean square distance between corresponding rows, or NaN if there are no rows.
pub fn rmsd(first: ArrayView2<f64>, second: ArrayView2<f64>) -> Result<f64> {
    if first.nrows() != second.nrows() {
        return Err(Error::PointCountMismatch {
            fixed: first.nrows(),
            moving: second.nrows(),
        });
    }

    let squared_sum: f64 = first
        .rows()
        .into_iter()
        .zip(second.rows())
        .map(|(a, b)| (point(a) - point(b)).norm_squared())
        .sum();
    Ok((squared_sum / first.nrows() as f64).sqrt())
}

fn point(row: ndarray::ArrayView1<f64>) -> Vector3<f64> {
    Vector3::new(row[0], row[1], row[2])
}

fn centroid(points: ArrayView2<f64>) -> Vector3<f64> {
    points
        .rows()
        .into_iter()
        .fold(Vector3::zeros(), |sum, row| sum + point(row))
        / points.nrows() as f64
}
