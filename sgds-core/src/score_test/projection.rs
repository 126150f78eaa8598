//! Projection of a genotype onto the model covariates.
//!
//! With `P = (X'VX)^{-1} X'V`, the adjusted genotype is
//!   adj_g = g - X P g
//! and the score and its variance are
//!   S   = sum_i r_i adj_g_i
//!   var = sum_i w_i adj_g_i^2
//!
//! The dense route materializes `adj_g` over all samples. The sparse
//! route only touches samples with a non-zero dosage: writing
//! `c = P g` and `B = X c`, on the zero entries `adj_g_i = -B_i`, so
//!   var = c' (X'VX) c + sum_{g_i != 0} w_i (g~_i^2 - B_i^2)
//!   S   = sum_{g_i != 0} r_i g~_i + (sum_{g_i != 0} r_i x_i - X'r)' c
//! with `g~ = g - B`. The two are algebraically identical; the sparse
//! route costs `O(K * nnz)` instead of `O(K * n)`.

use sgds_linalg::vector::nonzero_index;

use super::ScoreBuffers;
use crate::model::ModelContext;

/// MAF below which binary traits take the sparse route.
pub const BINARY_SPARSE_MAF: f64 = 0.05;

/// Quantitative traits take the sparse route for any MAF above this,
/// i.e. always; the dense route is kept for equivalence checks.
pub const QUANTITATIVE_SPARSE_MAF: f64 = -0.05;

/// How one variant is projected onto the covariates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionStrategy {
    /// Only the non-zero dosages are projected.
    Sparse,
    /// The adjusted genotype is formed over every sample.
    Dense,
}

impl ProjectionStrategy {
    pub fn for_quantitative(maf: f64) -> Self {
        if maf > QUANTITATIVE_SPARSE_MAF {
            ProjectionStrategy::Sparse
        } else {
            ProjectionStrategy::Dense
        }
    }

    pub fn for_binary(maf: f64) -> Self {
        if maf < BINARY_SPARSE_MAF {
            ProjectionStrategy::Sparse
        } else {
            ProjectionStrategy::Dense
        }
    }
}

/// Pieces of the sparse-route statistic before trait-specific scaling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SparseTerms {
    /// Unscaled variance of the score.
    pub var: f64,
    /// Residual sum over the non-zero entries.
    pub s1: f64,
    /// Correction for the zero entries.
    pub s2: f64,
}

/// Sparse route. `weights` is `None` for unit weights.
///
/// Leaves `coeff = P g` in the buffers.
pub(crate) fn sparse_terms(
    ctx: &ModelContext,
    buf: &mut ScoreBuffers,
    g: &[f64],
    weights: Option<&[f64]>,
) -> SparseTerms {
    let n_nonzero = nonzero_index(g, &mut buf.index);
    let idx = &buf.index[..n_nonzero];

    ctx.proj_coeff_weighted
        .mul_vec_subset_into(idx, g, &mut buf.coeff);
    ctx.covariate_t
        .t_mul_vec_subset_into(idx, &buf.coeff, &mut buf.proj);
    for (t, &i) in idx.iter().enumerate() {
        buf.g_tilde[t] = g[i] - buf.proj[t];
    }

    let g_tilde = &buf.g_tilde[..n_nonzero];
    let proj = &buf.proj[..n_nonzero];

    let mut var = ctx.cov_cross_prod.quad_form(&buf.coeff);
    match weights {
        None => {
            for (gt, b) in g_tilde.iter().zip(proj) {
                var += gt * gt - b * b;
            }
        }
        Some(w) => {
            for ((gt, b), &i) in g_tilde.iter().zip(proj).zip(idx) {
                var += (gt * gt - b * b) * w[i];
            }
        }
    }

    let mut s1 = 0.0;
    for (gt, &i) in g_tilde.iter().zip(idx) {
        s1 += ctx.residual[i] * gt;
    }

    ctx.covariate_t
        .mul_vec_subset_into(idx, &ctx.residual, &mut buf.tmp);
    let s2: f64 = buf
        .tmp
        .iter()
        .zip(&ctx.score_adj)
        .zip(&buf.coeff)
        .map(|((t, s), c)| (t - s) * c)
        .sum();

    SparseTerms { var, s1, s2 }
}

/// Dense route: `coeff = X'V g`, `adj_geno = g - X (X'VX)^{-1} coeff`.
pub(crate) fn dense_adjust(ctx: &ModelContext, buf: &mut ScoreBuffers, g: &[f64]) {
    ctx.cov_weighted.mul_vec_into(g, &mut buf.coeff);
    ctx.proj_inv_coeff_t
        .sub_t_mul_vec_into(g, &buf.coeff, &mut buf.adj_geno);
}

/// Complete `adj_geno = g - X coeff` after the sparse route, which
/// leaves `coeff = P g` but never forms the dense adjusted genotype.
pub(crate) fn adjust_from_coeff(ctx: &ModelContext, buf: &mut ScoreBuffers, g: &[f64]) {
    ctx.covariate_t
        .sub_t_mul_vec_into(g, &buf.coeff, &mut buf.adj_geno);
}
