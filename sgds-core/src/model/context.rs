//! ModelContext: the validated, immutable view of a null model.
//!
//! Built once per analysis. Every dimension is checked here so that the
//! per-variant code can index freely; after construction nothing is
//! mutated, so a context can be shared across worker threads while each
//! worker owns its own [`ScoreBuffers`](crate::score_test::ScoreBuffers).

use tracing::info;

use sgds_linalg::DenseMatrix;

use super::bundle::{check_len, normalize_threshold, ModelBundle, TraitType};
use super::ModelError;

#[derive(Debug, Clone)]
pub struct ModelContext {
    pub(crate) trait_type: TraitType,
    pub(crate) sample_ids: Vec<String>,
    pub(crate) n_samp: usize,
    pub(crate) n_coeff: usize,
    pub(crate) tau: [f64; 2],
    pub(crate) y: Vec<f64>,
    pub(crate) mu: Vec<f64>,
    pub(crate) residual: Vec<f64>,
    pub(crate) mu_var: Vec<f64>,
    pub(crate) proj_inv_coeff_t: DenseMatrix,
    pub(crate) cov_weighted: DenseMatrix,
    pub(crate) proj_coeff_weighted: DenseMatrix,
    pub(crate) cov_cross_prod: DenseMatrix,
    pub(crate) covariate_t: DenseMatrix,
    pub(crate) score_adj: Vec<f64>,
    pub(crate) var_ratio: f64,
    pub(crate) maf_threshold: f64,
    pub(crate) mac_threshold: f64,
}

impl ModelContext {
    /// Validate a bundle and build the context from it.
    pub fn new(bundle: ModelBundle) -> Result<Self, ModelError> {
        let n = bundle.y.len();
        let k = bundle.n_coeff;
        if n == 0 {
            return Err(ModelError::NoSamples);
        }
        if !bundle.sample_ids.is_empty() {
            check_len("sample_ids", n, bundle.sample_ids.len())?;
        }
        check_len("mu", n, bundle.mu.len())?;
        check_len("residual", n, bundle.residual.len())?;
        check_len("mu_var", n, bundle.mu_var.len())?;
        check_len("score_adj", k, bundle.score_adj.len())?;

        let proj_inv_coeff_t = matrix("proj_inv_coeff_t", k, n, &bundle.proj_inv_coeff_t)?;
        let cov_weighted = matrix("cov_weighted", k, n, &bundle.cov_weighted)?;
        let proj_coeff_weighted =
            matrix("proj_coeff_weighted", k, n, &bundle.proj_coeff_weighted)?;
        let cov_cross_prod = matrix("cov_cross_prod", k, k, &bundle.cov_cross_prod)?;
        let covariate_t = matrix("covariate_t", k, n, &bundle.covariate_t)?;

        if !bundle.tau[0].is_finite() || bundle.tau[0] == 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "tau[0]",
                value: bundle.tau[0],
            });
        }
        if !bundle.var_ratio.is_finite() || bundle.var_ratio <= 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "var_ratio",
                value: bundle.var_ratio,
            });
        }

        let maf_threshold = normalize_threshold(bundle.maf);
        let mac_threshold = normalize_threshold(bundle.mac);

        info!(
            "Loaded {:?} model: {} samples, {} coefficients, VR={:.4}, MAF>={}, MAC>={}",
            bundle.trait_type, n, k, bundle.var_ratio, maf_threshold, mac_threshold
        );

        Ok(Self {
            trait_type: bundle.trait_type,
            sample_ids: bundle.sample_ids,
            n_samp: n,
            n_coeff: k,
            tau: bundle.tau,
            y: bundle.y,
            mu: bundle.mu,
            residual: bundle.residual,
            mu_var: bundle.mu_var,
            proj_inv_coeff_t,
            cov_weighted,
            proj_coeff_weighted,
            cov_cross_prod,
            covariate_t,
            score_adj: bundle.score_adj,
            var_ratio: bundle.var_ratio,
            maf_threshold,
            mac_threshold,
        })
    }

    /// Replace the MAF/MAC filters. Non-finite values disable a filter.
    pub fn with_thresholds(mut self, maf: f64, mac: f64) -> Self {
        self.maf_threshold = normalize_threshold(maf);
        self.mac_threshold = normalize_threshold(mac);
        self
    }

    pub fn trait_type(&self) -> TraitType {
        self.trait_type
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn n_samples(&self) -> usize {
        self.n_samp
    }

    pub fn n_coeff(&self) -> usize {
        self.n_coeff
    }

    pub fn tau(&self) -> [f64; 2] {
        self.tau
    }

    pub fn variance_ratio(&self) -> f64 {
        self.var_ratio
    }

    pub fn maf_threshold(&self) -> f64 {
        self.maf_threshold
    }

    pub fn mac_threshold(&self) -> f64 {
        self.mac_threshold
    }

    /// Whether a variant passes the inclusion gate. Both bounds are inclusive.
    pub fn passes_filter(&self, n_valid: usize, maf: f64, mac: f64) -> bool {
        n_valid > 0 && maf > 0.0 && maf >= self.maf_threshold && mac >= self.mac_threshold
    }
}

fn matrix(
    field: &'static str,
    nrows: usize,
    ncols: usize,
    data: &[f64],
) -> Result<DenseMatrix, ModelError> {
    check_len(field, nrows * ncols, data.len())?;
    Ok(DenseMatrix::from_col_major(nrows, ncols, data)?)
}
