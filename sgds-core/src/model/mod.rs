//! Null model ingestion: the serialized bundle, the validated read-only
//! context built from it, and (de)serialization.

pub mod bundle;
pub mod context;
pub mod serialization;

pub use bundle::{ModelBundle, TraitType};
pub use context::ModelContext;

use sgds_linalg::LinalgError;
use thiserror::Error;

/// Configuration errors raised while preparing, loading or ingesting a model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model field '{field}' has length {got}, expected {expected}")]
    Dimension {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Model has no samples")]
    NoSamples,

    #[error("Model parameter '{name}' is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Unknown trait type '{0}' (expected 'quantitative' or 'binary')")]
    UnknownTraitType(String),

    #[error("Covariate cross-product matrix is singular: {0}")]
    SingularCovariates(#[source] LinalgError),

    #[error(transparent)]
    Linalg(#[from] LinalgError),

    #[error("Invalid model file: expected magic bytes {expected:?}, got {got:?}")]
    BadMagic { expected: [u8; 4], got: [u8; 4] },

    #[error("Unsupported model version {0}")]
    UnsupportedVersion(u32),

    #[error("Failed to read or write model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode model: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Failed to write JSON sidecar: {0}")]
    Json(#[from] serde_json::Error),
}
