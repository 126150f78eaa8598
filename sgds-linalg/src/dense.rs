#![allow(clippy::needless_range_loop)]
//! Dense matrix storage backed by faer.
//!
//! The model matrices consumed by the score tests are stored `K x n`
//! (covariates by samples) in column-major order, so that the `K`
//! coefficients belonging to one sample are contiguous. Every kernel
//! below walks whole columns, which keeps the sparse-restricted
//! products (only the samples with a non-zero dosage) cache friendly.
//!
//! None of the `*_into` kernels allocate: outputs go to caller-owned
//! buffers and are overwritten, never accumulated into.

use faer::Mat;

use crate::decomposition::LinalgError;

/// A dense matrix wrapper around faer's `Mat<f64>`.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from a flat vec in column-major order.
    pub fn from_col_major(nrows: usize, ncols: usize, data: &[f64]) -> Result<Self, LinalgError> {
        if data.len() != nrows * ncols {
            return Err(LinalgError::DimensionMismatch {
                expected: nrows * ncols,
                got: data.len(),
            });
        }
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i]);
        Ok(Self { inner })
    }

    /// Create a dense matrix from a flat slice in row-major order.
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Result<Self, LinalgError> {
        if data.len() != nrows * ncols {
            return Err(LinalgError::DimensionMismatch {
                expected: nrows * ncols,
                got: data.len(),
            });
        }
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Ok(Self { inner })
    }

    /// Scale each column `j` by `w[j]`, i.e. `self * diag(w)`.
    pub fn scale_cols(&self, w: &[f64]) -> Result<DenseMatrix, LinalgError> {
        if w.len() != self.ncols() {
            return Err(LinalgError::DimensionMismatch {
                expected: self.ncols(),
                got: w.len(),
            });
        }
        let inner = Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            self.inner.read(i, j) * w[j]
        });
        Ok(DenseMatrix { inner })
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Borrow column `j` as a contiguous slice.
    pub fn col(&self, j: usize) -> &[f64] {
        self.inner.col_as_slice(j)
    }

    /// Set an entire column from a slice.
    pub fn set_col(&mut self, j: usize, data: &[f64]) {
        debug_assert_eq!(data.len(), self.nrows());
        for i in 0..self.nrows() {
            self.inner.write(i, j, data[i]);
        }
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
        if self.ncols() != other.nrows() {
            return Err(LinalgError::DimensionMismatch {
                expected: self.ncols(),
                got: other.nrows(),
            });
        }
        let result = &self.inner * &other.inner;
        Ok(DenseMatrix { inner: result })
    }

    pub fn transpose(&self) -> DenseMatrix {
        let inner = self.inner.transpose().to_owned();
        DenseMatrix { inner }
    }

    /// Flatten to a column-major Vec.
    pub fn to_col_major(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.nrows() * self.ncols());
        for j in 0..self.ncols() {
            data.extend_from_slice(self.col(j));
        }
        data
    }

    /// `out = self * x`, with `x.len() == ncols` and `out.len() == nrows`.
    pub fn mul_vec_into(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(out.len(), self.nrows());
        out.fill(0.0);
        for j in 0..self.ncols() {
            axpy(x[j], self.col(j), out);
        }
    }

    /// `out = self[:, index] * x[index]`: only the listed columns contribute.
    pub fn mul_vec_subset_into(&self, index: &[usize], x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.nrows());
        out.fill(0.0);
        for &j in index {
            axpy(x[j], self.col(j), out);
        }
    }

    /// `out[t] = self[:, index[t]]' * c` for each listed column.
    ///
    /// Only the first `index.len()` entries of `out` are written.
    pub fn t_mul_vec_subset_into(&self, index: &[usize], c: &[f64], out: &mut [f64]) {
        debug_assert_eq!(c.len(), self.nrows());
        debug_assert!(out.len() >= index.len());
        for (o, &j) in out.iter_mut().zip(index) {
            *o = dot(self.col(j), c);
        }
    }

    /// `out = x - self' * c`, over every column.
    ///
    /// Paired with [`DenseMatrix::mul_vec_into`] this gives
    /// `out = x - M2' * (M1 * x)` with `c` as the intermediate.
    pub fn sub_t_mul_vec_into(&self, x: &[f64], c: &[f64], out: &mut [f64]) {
        debug_assert_eq!(c.len(), self.nrows());
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(out.len(), self.ncols());
        for j in 0..self.ncols() {
            out[j] = x[j] - dot(self.col(j), c);
        }
    }

    /// Quadratic form `c' * self * c` for a square matrix.
    pub fn quad_form(&self, c: &[f64]) -> f64 {
        debug_assert_eq!(self.nrows(), self.ncols());
        debug_assert_eq!(c.len(), self.ncols());
        let mut sum = 0.0;
        for j in 0..self.ncols() {
            sum += c[j] * dot(self.col(j), c);
        }
        sum
    }
}

#[inline]
fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl std::fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{:.6}", self.inner.read(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
