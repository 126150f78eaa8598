//! sgds-core: per-variant GLMM score tests
//!
//! Prepares the fixed projection matrices of a fitted null model, runs
//! single-variant score tests for quantitative and binary traits, and
//! recalibrates significant binary results with a saddle-point
//! approximation.

pub mod model;
pub mod score_test;
pub mod spa;
pub mod util;

pub use model::{ModelBundle, ModelContext, ModelError, TraitType};
pub use score_test::{
    BinaryResult, QuantitativeResult, ScoreBuffers, ScoreError, ScoreTester, VariantResult,
};
pub use spa::{SaddlePointSolver, SpaConfig, TailProbability, TailProbabilitySolver};
