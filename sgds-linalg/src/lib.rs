//! sgds-linalg: numeric kernels for sgds
//!
//! Provides the column-major dense matrix used for the model's
//! projection matrices, the allocation-free per-variant vector
//! kernels, and the Cholesky factorisation used when preparing a
//! model.

pub mod decomposition;
pub mod dense;
pub mod vector;

pub use decomposition::LinalgError;
pub use dense::DenseMatrix;
pub use vector::AlleleSummary;
