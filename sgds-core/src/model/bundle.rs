//! ModelBundle: the serialized null model consumed by the score tests.
//!
//! A bundle is a plain bag of vectors. Matrices are stored flat in
//! column-major order with `n_coeff` rows and `n_samples` columns,
//! except the `n_coeff x n_coeff` covariate cross product.
//!
//! With design matrix `X` (n x K), working weights `w` and
//! `V = diag(w)`:
//!
//! | field                 | value                 | shape |
//! |-----------------------|-----------------------|-------|
//! | `proj_inv_coeff_t`    | `(X'VX)^{-1} X'`      | K x n |
//! | `cov_weighted`        | `X'V`                 | K x n |
//! | `proj_coeff_weighted` | `(X'VX)^{-1} X'V`     | K x n |
//! | `cov_cross_prod`      | `X'VX`                | K x K |
//! | `covariate_t`         | `X'`                  | K x n |
//! | `score_adj`           | `X'(y - mu)`          | K     |

use serde::{Deserialize, Serialize};
use tracing::info;

use sgds_linalg::decomposition::CholeskyDecomp;
use sgds_linalg::DenseMatrix;

use super::ModelError;

/// Outcome type of the null model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraitType {
    Quantitative,
    Binary,
}

impl std::str::FromStr for TraitType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quantitative" | "quant" | "q" => Ok(TraitType::Quantitative),
            "binary" | "bin" | "b" => Ok(TraitType::Binary),
            _ => Err(ModelError::UnknownTraitType(s.to_string())),
        }
    }
}

/// The fitted null model with every precomputed quantity the per-variant
/// tests need. Serialized to `.sgds.model` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Magic bytes for validation.
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    pub trait_type: TraitType,
    /// Sample IDs in model order. May be empty when the caller keeps its own.
    pub sample_ids: Vec<String>,
    /// Minimum MAF; non-finite disables the filter.
    pub maf: f64,
    /// Minimum MAC; non-finite disables the filter.
    pub mac: f64,
    /// Number of mean-model coefficients (rows of the K x n matrices).
    pub n_coeff: usize,
    /// Variance components [tau_e, tau_g].
    pub tau: [f64; 2],
    pub y: Vec<f64>,
    pub mu: Vec<f64>,
    /// y - mu
    pub residual: Vec<f64>,
    /// mu * (1 - mu) for binary, 1 for quantitative.
    pub mu_var: Vec<f64>,
    pub proj_inv_coeff_t: Vec<f64>,
    pub cov_weighted: Vec<f64>,
    pub proj_coeff_weighted: Vec<f64>,
    pub cov_cross_prod: Vec<f64>,
    pub covariate_t: Vec<f64>,
    pub score_adj: Vec<f64>,
    pub var_ratio: f64,
}

impl ModelBundle {
    /// Magic bytes: "SGDS".
    pub const MAGIC: [u8; 4] = [b'S', b'G', b'D', b'S'];
    pub const VERSION: u32 = 1;

    /// Derive a bundle from an already fitted null model.
    ///
    /// `x` is the `n x K` design matrix (intercept included by the caller),
    /// `mu` the fitted means. Working weights are `mu * (1 - mu)` for
    /// binary traits and 1 for quantitative traits.
    #[allow(clippy::too_many_arguments)]
    pub fn from_null_fit(
        trait_type: TraitType,
        sample_ids: Vec<String>,
        x: &DenseMatrix,
        y: &[f64],
        mu: &[f64],
        tau: [f64; 2],
        var_ratio: f64,
        maf: f64,
        mac: f64,
    ) -> Result<Self, ModelError> {
        let n = x.nrows();
        let k = x.ncols();
        check_len("y", n, y.len())?;
        check_len("mu", n, mu.len())?;
        if !sample_ids.is_empty() {
            check_len("sample_ids", n, sample_ids.len())?;
        }

        let mu_var: Vec<f64> = match trait_type {
            TraitType::Binary => mu.iter().map(|&m| m * (1.0 - m)).collect(),
            TraitType::Quantitative => vec![1.0; n],
        };
        let residual: Vec<f64> = y.iter().zip(mu).map(|(&yi, &mi)| yi - mi).collect();

        let covariate_t = x.transpose();
        let cov_weighted = covariate_t.scale_cols(&mu_var)?;
        let cov_cross_prod = cov_weighted.mat_mul(x)?;
        let cross_inv = CholeskyDecomp::new(&cov_cross_prod)
            .map_err(ModelError::SingularCovariates)?
            .inverse();
        let proj_inv_coeff_t = cross_inv.mat_mul(&covariate_t)?;
        let proj_coeff_weighted = cross_inv.mat_mul(&cov_weighted)?;

        let mut score_adj = vec![0.0; k];
        covariate_t.mul_vec_into(&residual, &mut score_adj);

        info!(
            "Prepared {:?} model: {} samples, {} coefficients, tau=[{:.6}, {:.6}], VR={:.4}",
            trait_type, n, k, tau[0], tau[1], var_ratio
        );

        Ok(Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            trait_type,
            sample_ids,
            maf: normalize_threshold(maf),
            mac: normalize_threshold(mac),
            n_coeff: k,
            tau,
            y: y.to_vec(),
            mu: mu.to_vec(),
            residual,
            mu_var,
            proj_inv_coeff_t: proj_inv_coeff_t.to_col_major(),
            cov_weighted: cov_weighted.to_col_major(),
            proj_coeff_weighted: proj_coeff_weighted.to_col_major(),
            cov_cross_prod: cov_cross_prod.to_col_major(),
            covariate_t: covariate_t.to_col_major(),
            score_adj,
            var_ratio,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.y.len()
    }

    /// Effective sample size: `4 / (1/n_cases + 1/n_controls)` for binary traits.
    pub fn n_eff(&self) -> f64 {
        match self.trait_type {
            TraitType::Binary => {
                let n_cases = self.y.iter().filter(|&&y| y > 0.5).count() as f64;
                let n_controls = self.y.iter().filter(|&&y| y < 0.5).count() as f64;
                if n_cases > 0.0 && n_controls > 0.0 {
                    4.0 / (1.0 / n_cases + 1.0 / n_controls)
                } else {
                    self.n_samples() as f64
                }
            }
            TraitType::Quantitative => self.n_samples() as f64,
        }
    }
}

/// Non-finite thresholds mean "no filter" and become -1.
pub fn normalize_threshold(t: f64) -> f64 {
    if t.is_finite() {
        t
    } else {
        -1.0
    }
}

pub(crate) fn check_len(field: &'static str, expected: usize, got: usize) -> Result<(), ModelError> {
    if expected == got {
        Ok(())
    } else {
        Err(ModelError::Dimension {
            field,
            expected,
            got,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(n: usize) -> DenseMatrix {
        // intercept + one covariate
        let mut data = vec![1.0; n];
        data.extend((0..n).map(|i| i as f64 / n as f64));
        DenseMatrix::from_col_major(n, 2, &data).unwrap()
    }

    #[test]
    fn test_from_null_fit_shapes() {
        let n = 6;
        let y = vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let mu = vec![0.3, 0.4, 0.5, 0.5, 0.6, 0.7];
        let b = ModelBundle::from_null_fit(
            TraitType::Binary,
            Vec::new(),
            &design(n),
            &y,
            &mu,
            [1.0, 0.2],
            1.1,
            0.0,
            f64::NAN,
        )
        .unwrap();

        assert_eq!(b.n_coeff, 2);
        assert_eq!(b.n_samples(), n);
        assert_eq!(b.proj_inv_coeff_t.len(), 2 * n);
        assert_eq!(b.cov_cross_prod.len(), 4);
        assert_eq!(b.score_adj.len(), 2);
        assert_eq!(b.mac, -1.0);
        assert!((b.mu_var[0] - 0.21).abs() < 1e-12);
        assert!((b.residual[5] + 0.7).abs() < 1e-12);
        // sum of residuals
        assert!((b.score_adj[0] - (3.0 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_projection_is_left_inverse() {
        // (X'VX)^{-1} X'V X = I
        let n = 5;
        let x = design(n);
        let mu = vec![0.2, 0.3, 0.4, 0.5, 0.6];
        let b = ModelBundle::from_null_fit(
            TraitType::Binary,
            Vec::new(),
            &x,
            &[0.0; 5],
            &mu,
            [1.0, 0.0],
            1.0,
            0.0,
            0.0,
        )
        .unwrap();
        let p = DenseMatrix::from_col_major(2, n, &b.proj_coeff_weighted).unwrap();
        let id = p.mat_mul(&x).unwrap();
        assert!((id.get(0, 0) - 1.0).abs() < 1e-10);
        assert!(id.get(0, 1).abs() < 1e-10);
        assert!(id.get(1, 0).abs() < 1e-10);
        assert!((id.get(1, 1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_quantitative_weights_are_one() {
        let n = 4;
        let b = ModelBundle::from_null_fit(
            TraitType::Quantitative,
            Vec::new(),
            &design(n),
            &[0.0, 1.0, 2.0, 3.0],
            &[1.5; 4],
            [1.0, 0.0],
            1.0,
            0.0,
            0.0,
        )
        .unwrap();
        assert!(b.mu_var.iter().all(|&w| w == 1.0));
        assert_eq!(b.cov_weighted, b.covariate_t);
    }

    #[test]
    fn test_collinear_covariates_rejected() {
        let n = 4;
        let x = DenseMatrix::from_col_major(n, 2, &[1.0; 8]).unwrap();
        let err = ModelBundle::from_null_fit(
            TraitType::Quantitative,
            Vec::new(),
            &x,
            &[0.0; 4],
            &[0.0; 4],
            [1.0, 0.0],
            1.0,
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::SingularCovariates(_)));
    }

    #[test]
    fn test_length_mismatch() {
        let err = ModelBundle::from_null_fit(
            TraitType::Quantitative,
            Vec::new(),
            &design(4),
            &[0.0; 3],
            &[0.0; 4],
            [1.0, 0.0],
            1.0,
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Dimension {
                field: "y",
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn test_n_eff() {
        let mut b = ModelBundle::from_null_fit(
            TraitType::Binary,
            Vec::new(),
            &design(4),
            &[1.0, 1.0, 0.0, 0.0],
            &[0.5; 4],
            [1.0, 0.0],
            1.0,
            0.0,
            0.0,
        )
        .unwrap();
        // 4 / (1/2 + 1/2)
        assert!((b.n_eff() - 4.0).abs() < 1e-12);
        b.trait_type = TraitType::Quantitative;
        assert_eq!(b.n_eff(), 4.0);
    }

    #[test]
    fn test_trait_type_from_str() {
        assert_eq!("Binary".parse::<TraitType>().unwrap(), TraitType::Binary);
        assert_eq!("q".parse::<TraitType>().unwrap(), TraitType::Quantitative);
        assert!("survival".parse::<TraitType>().is_err());
    }
}
