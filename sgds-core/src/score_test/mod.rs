//! Single-variant score tests under a fitted GLMM null model.
//!
//! Each call takes one raw dosage vector and, for a variant passing the
//! MAF/MAC gate, projects it onto the model covariates, assembles the
//! score and its variance and returns a calibrated p-value. Binary traits
//! recalibrate significant results with a saddle-point approximation.
//!
//! Variants failing the gate return `Ok(None)`. Numerical degeneracy
//! (non-positive variance, solver non-convergence) never errors: it shows
//! up as non-finite fields or `converged == false`.

pub mod binary;
pub mod buffers;
pub mod output;
pub mod projection;
pub mod quantitative;
pub mod tester;

pub use buffers::ScoreBuffers;
pub use projection::ProjectionStrategy;
pub use tester::ScoreTester;

use thiserror::Error;
use tracing::trace;

use sgds_linalg::vector::{af_ac_impute, negate_and_shift};

use crate::model::ModelContext;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Dosage vector has {got} entries, model has {expected} samples")]
    DosageLength { expected: usize, got: usize },
}

/// Result of a quantitative-trait test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantitativeResult {
    /// Alt allele frequency.
    pub af: f64,
    /// Alt allele count.
    pub ac: f64,
    /// Number of non-missing samples.
    pub n: usize,
    pub beta: f64,
    pub se: f64,
    pub pvalue: f64,
}

/// Result of a binary-trait test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryResult {
    /// Alt allele frequency.
    pub af: f64,
    /// Alt allele count.
    pub ac: f64,
    /// Number of non-missing samples.
    pub n: usize,
    pub beta: f64,
    pub se: f64,
    /// Calibrated p-value (saddle point when recalibrated).
    pub pvalue: f64,
    /// Normal-approximation p-value.
    pub pvalue_noadj: f64,
    /// Whether the tail-probability solver converged; true when no
    /// recalibration was needed.
    pub converged: bool,
}

/// Either kind of result, as produced by [`ScoreTester::test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantResult {
    Quantitative(QuantitativeResult),
    Binary(BinaryResult),
}

impl VariantResult {
    pub fn pvalue(&self) -> f64 {
        match self {
            VariantResult::Quantitative(r) => r.pvalue,
            VariantResult::Binary(r) => r.pvalue,
        }
    }
}

/// Score statistic and its variance-ratio adjusted variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStatistic {
    pub score: f64,
    pub variance: f64,
}

/// A dosage vector that passed the gate, imputed and coded towards the
/// minor allele.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PreparedVariant {
    pub af: f64,
    pub ac: f64,
    pub n: usize,
    pub maf: f64,
    pub mac: f64,
    /// Whether the coding was flipped (`g <- 2 - g`).
    pub minus: bool,
}

impl PreparedVariant {
    pub fn sign(&self) -> f64 {
        if self.minus {
            -1.0
        } else {
            1.0
        }
    }
}

/// Impute, summarize, gate and flip one dosage vector in place.
pub(crate) fn prepare_variant(
    ctx: &ModelContext,
    buffers: &mut ScoreBuffers,
    g: &mut [f64],
) -> Result<Option<PreparedVariant>, ScoreError> {
    if g.len() != ctx.n_samp {
        return Err(ScoreError::DosageLength {
            expected: ctx.n_samp,
            got: g.len(),
        });
    }

    let summary = af_ac_impute(g, &mut buffers.index);
    let n = summary.n_valid;
    let maf = summary.af.min(1.0 - summary.af);
    let mac = summary.ac.min(2.0 * n as f64 - summary.ac);
    if !ctx.passes_filter(n, maf, mac) {
        trace!("Variant filtered: n={}, maf={}, mac={}", n, maf, mac);
        return Ok(None);
    }

    let minus = summary.af > 0.5;
    if minus {
        negate_and_shift(2.0, g);
    }

    Ok(Some(PreparedVariant {
        af: summary.af,
        ac: summary.ac,
        n,
        maf,
        mac,
        minus,
    }))
}
