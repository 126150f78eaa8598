//! Score test for binary traits with saddle-point recalibration.
//!
//! Variance terms carry the binomial weights `mu * (1 - mu)`. When the
//! normal-approximation p-value is at or below [`SPA_PVALUE_CUTOFF`], the
//! adjusted genotype is rescaled by `1/sqrt(AC)` and the statistic is
//! handed to a [`TailProbabilitySolver`].

use sgds_linalg::vector::{dot, dot_pair_weighted, scale_in_place};
use tracing::debug;

use super::projection::{adjust_from_coeff, dense_adjust, sparse_terms, ProjectionStrategy};
use super::{prepare_variant, BinaryResult, ScoreBuffers, ScoreError, ScoreStatistic};
use crate::model::ModelContext;
use crate::spa::TailProbabilitySolver;
use crate::util::math::{score_pvalue, se_from_pvalue};

/// Unadjusted p-values at or below this are recalibrated.
pub const SPA_PVALUE_CUTOFF: f64 = 0.05;

/// Standardized distance below which the solver keeps the normal approximation.
pub const SPA_NORMAL_CUTOFF: f64 = 2.0;

/// Statistic for an imputed, minor-allele coded genotype `g`.
///
/// The dense route leaves the adjusted genotype in the buffers; the
/// sparse route leaves only the projection coefficients.
pub fn statistic(
    ctx: &ModelContext,
    buf: &mut ScoreBuffers,
    g: &[f64],
    strategy: ProjectionStrategy,
) -> ScoreStatistic {
    match strategy {
        ProjectionStrategy::Sparse => {
            let terms = sparse_terms(ctx, buf, g, Some(&ctx.mu_var));
            ScoreStatistic {
                score: terms.s1 + terms.s2,
                variance: terms.var * ctx.var_ratio,
            }
        }
        ProjectionStrategy::Dense => {
            dense_adjust(ctx, buf, g);
            let (s, var) = dot_pair_weighted(&ctx.residual, &ctx.mu_var, &buf.adj_geno);
            ScoreStatistic {
                score: s,
                variance: var * ctx.var_ratio,
            }
        }
    }
}

/// Run the binary test on a raw dosage vector, imputing and flipping it
/// in place.
pub fn test<S: TailProbabilitySolver + ?Sized>(
    ctx: &ModelContext,
    buf: &mut ScoreBuffers,
    solver: &S,
    dosage: &mut [f64],
) -> Result<Option<BinaryResult>, ScoreError> {
    let Some(v) = prepare_variant(ctx, buf, dosage)? else {
        return Ok(None);
    };

    let strategy = ProjectionStrategy::for_binary(v.maf);
    debug!("Binary test: maf={:.6}, mac={}, {:?}", v.maf, v.mac, strategy);
    let stat = statistic(ctx, buf, dosage, strategy);

    let pvalue_noadj = score_pvalue(stat.score, stat.variance);
    let mut beta = v.sign() * stat.score / stat.variance;
    let mut pvalue = pvalue_noadj;
    let mut converged = true;

    if pvalue_noadj.is_finite() && pvalue_noadj <= SPA_PVALUE_CUTOFF {
        if strategy == ProjectionStrategy::Sparse {
            adjust_from_coeff(ctx, buf, dosage);
        }

        let ac2 = if v.minus {
            2.0 * v.n as f64 - v.ac
        } else {
            v.ac
        };
        let sqrt_ac2 = ac2.sqrt();
        scale_in_place(1.0 / sqrt_ac2, &mut buf.adj_geno);

        let q = dot(&ctx.y, &buf.adj_geno);
        let (m1, var2) = dot_pair_weighted(&ctx.mu, &ctx.mu_var, &buf.adj_geno);
        let var1 = var2 * ctx.var_ratio;
        let tstat = q - m1;
        // onto the unadjusted-variance scale the solver works on
        let qtilde = tstat / var1.sqrt() * var2.sqrt() + m1;

        let tail = solver.tail_probability(
            qtilde,
            m1,
            var2,
            &ctx.mu,
            &buf.adj_geno,
            SPA_NORMAL_CUTOFF,
        );
        pvalue = tail.pvalue;
        converged = tail.converged;
        beta = v.sign() * (tstat / var1) / sqrt_ac2;
    }

    let se = se_from_pvalue(beta, pvalue);

    Ok(Some(BinaryResult {
        af: v.af,
        ac: v.ac,
        n: v.n,
        beta,
        se,
        pvalue,
        pvalue_noadj,
        converged,
    }))
}
