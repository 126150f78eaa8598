//! Per-worker scratch space for the score tests.

use crate::model::ModelContext;

/// Scratch buffers sized once from a model and reused across variants.
///
/// One set per worker; they hold no state between calls that matters to
/// the results.
#[derive(Debug, Clone)]
pub struct ScoreBuffers {
    /// Projection coefficients, length `n_coeff`.
    pub(crate) coeff: Vec<f64>,
    /// Covariate-adjusted genotype over all samples, length `n_samples`.
    pub(crate) adj_geno: Vec<f64>,
    /// Non-zero dosage indices, length `n_samples`.
    pub(crate) index: Vec<usize>,
    /// `X * coeff` on the non-zero indices, length `n_samples`.
    pub(crate) proj: Vec<f64>,
    /// `g - proj` on the non-zero indices, length `n_samples`.
    pub(crate) g_tilde: Vec<f64>,
    /// Covariate-weighted residual sums, length `n_coeff`.
    pub(crate) tmp: Vec<f64>,
}

impl ScoreBuffers {
    pub fn new(n_samples: usize, n_coeff: usize) -> Self {
        Self {
            coeff: vec![0.0; n_coeff],
            adj_geno: vec![0.0; n_samples],
            index: vec![0; n_samples],
            proj: vec![0.0; n_samples],
            g_tilde: vec![0.0; n_samples],
            tmp: vec![0.0; n_coeff],
        }
    }

    pub fn for_model(ctx: &ModelContext) -> Self {
        Self::new(ctx.n_samples(), ctx.n_coeff())
    }

    /// Covariate-adjusted genotype from the last dense projection or
    /// recalibration.
    pub fn adjusted_genotype(&self) -> &[f64] {
        &self.adj_geno
    }
}
