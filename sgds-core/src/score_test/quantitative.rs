//! Score test for quantitative traits.
//!
//! The genotype is scaled by `1/sqrt(mac)` and the score by `1/tau_e`:
//!   T    = S / sqrt(mac) / tau_e
//!   var1 = var / mac * VR
//!   p    = P(chi2_1 > T^2 / var1)
//!   beta = T / var1 / sqrt(mac)

use sgds_linalg::vector::dot_pair;
use tracing::debug;

use super::projection::{dense_adjust, sparse_terms, ProjectionStrategy};
use super::{prepare_variant, QuantitativeResult, ScoreBuffers, ScoreError, ScoreStatistic};
use crate::model::ModelContext;
use crate::util::math::{score_pvalue, se_from_pvalue};

/// Statistic for an imputed, minor-allele coded genotype `g`.
///
/// On the sparse route the zero-entry correction `s2` is added after the
/// `1/sqrt(mac)` scaling of the non-zero part, so the two routes agree
/// only when that correction vanishes.
pub fn statistic(
    ctx: &ModelContext,
    buf: &mut ScoreBuffers,
    g: &[f64],
    mac: f64,
    strategy: ProjectionStrategy,
) -> ScoreStatistic {
    let inv_mac = 1.0 / mac;
    let inv_sqrt_mac = inv_mac.sqrt();
    let tau_e = ctx.tau[0];

    match strategy {
        ProjectionStrategy::Sparse => {
            let terms = sparse_terms(ctx, buf, g, None);
            ScoreStatistic {
                score: (terms.s1 * inv_sqrt_mac + terms.s2) / tau_e,
                variance: terms.var * inv_mac * ctx.var_ratio,
            }
        }
        ProjectionStrategy::Dense => {
            dense_adjust(ctx, buf, g);
            let (s, var) = dot_pair(&ctx.residual, &buf.adj_geno);
            ScoreStatistic {
                score: s * inv_sqrt_mac / tau_e,
                variance: var * inv_mac * ctx.var_ratio,
            }
        }
    }
}

/// Run the quantitative test on a raw dosage vector, imputing and
/// flipping it in place.
pub fn test(
    ctx: &ModelContext,
    buf: &mut ScoreBuffers,
    dosage: &mut [f64],
) -> Result<Option<QuantitativeResult>, ScoreError> {
    let Some(v) = prepare_variant(ctx, buf, dosage)? else {
        return Ok(None);
    };

    let strategy = ProjectionStrategy::for_quantitative(v.maf);
    debug!("Quantitative test: maf={:.6}, mac={}, {:?}", v.maf, v.mac, strategy);
    let stat = statistic(ctx, buf, dosage, v.mac, strategy);

    let pvalue = score_pvalue(stat.score, stat.variance);
    let beta = v.sign() * stat.score / stat.variance / v.mac.sqrt();
    let se = se_from_pvalue(beta, pvalue);

    Ok(Some(QuantitativeResult {
        af: v.af,
        ac: v.ac,
        n: v.n,
        beta,
        se,
        pvalue,
    }))
}
