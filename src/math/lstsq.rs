//! Least-squares solver for a fixed design matrix.
//!
//! The engine solves the same regression problem once per voxel: the design
//! matrix `X` is voxel-independent, only the observation vector changes. So
//! the expensive factorization happens once, and the per-voxel work is a
//! single matrix-vector product.
//!
//! Implementation choices:
//! - SVD-based pseudo-inverse so tall (more rows than columns) and
//!   near-collinear designs solve robustly.
//! - Progressively looser tolerances before giving up, because some basis
//!   choices produce nearly dependent columns without being unusable.
//! - `(XᵀX)⁻¹` is derived from the same SVD (`pinv · pinvᵀ`); it scales the
//!   residual variance into per-parameter standard deviations.

use nalgebra::{DMatrix, DVector};

/// Precomputed factorization of one design matrix.
#[derive(Debug, Clone)]
pub struct DesignSolver {
    pinv: DMatrix<f64>,
    xtx_inv: DMatrix<f64>,
}

impl DesignSolver {
    /// Factorize a design matrix.
    ///
    /// Returns `None` if the matrix is too ill-conditioned to solve
    /// robustly at any tolerance.
    pub fn new(x: &DMatrix<f64>) -> Option<Self> {
        let svd = x.clone().svd(true, true);

        for &tol in &[1e-10, 1e-8, 1e-6] {
            if let Ok(pinv) = svd.clone().pseudo_inverse(tol) {
                if pinv.iter().all(|v| v.is_finite()) {
                    let xtx_inv = &pinv * pinv.transpose();
                    return Some(Self { pinv, xtx_inv });
                }
            }
        }

        None
    }

    pub fn n_params(&self) -> usize {
        self.pinv.nrows()
    }

    /// Least-squares solution for one observation vector.
    pub fn solve(&self, y: &DVector<f64>) -> DVector<f64> {
        &self.pinv * y
    }

    /// `(XᵀX)⁻¹`: multiply by the residual variance to get the parameter
    /// covariance.
    pub fn covariance_factor(&self) -> &DMatrix<f64> {
        &self.xtx_inv
    }
}
