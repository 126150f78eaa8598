#![allow(clippy::needless_range_loop)]
//! Cholesky factorisation for the small covariate cross-product matrix.

use crate::dense::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinalgError {
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("Matrix is not square: {nrows} x {ncols}")]
    NotSquare { nrows: usize, ncols: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result of a Cholesky decomposition.
pub struct CholeskyDecomp {
    /// Lower triangular factor L such that A = L * L'.
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    /// Compute the Cholesky decomposition of a symmetric positive definite matrix.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LinalgError::NotSquare {
                nrows: n,
                ncols: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let diag = a.get(j, j) - sum;
            if diag <= 0.0 || !diag.is_finite() {
                return Err(LinalgError::NotPositiveDefinite);
            }
            l.set(j, j, diag.sqrt());

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Solve L * L' * x = b.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.nrows();
        debug_assert_eq!(b.len(), n);

        // L * y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l.get(i, j) * y[j];
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }

        // L' * x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }

        x
    }

    /// A^{-1} = (L L')^{-1}, one column at a time.
    pub fn inverse(&self) -> DenseMatrix {
        let n = self.l.nrows();
        let mut inv = DenseMatrix::zeros(n, n);
        let mut e = vec![0.0; n];
        for j in 0..n {
            e.fill(0.0);
            e[j] = 1.0;
            let col = self.solve(&e);
            inv.set_col(j, &col);
        }
        inv
    }
}
