//! Distribution helpers for 1-df score tests.

use statrs::function::erf::{erfc, erfc_inv};

/// Upper tail of the chi-squared distribution with one degree of freedom,
/// `P(X > stat) = erfc(sqrt(stat / 2))`.
///
/// Accurate far into the tail, unlike `1 - cdf`. Negative or NaN
/// statistics give NaN.
pub fn chisq1_upper(stat: f64) -> f64 {
    if stat.is_nan() || stat < 0.0 {
        f64::NAN
    } else if stat.is_infinite() {
        0.0
    } else {
        erfc((0.5 * stat).sqrt())
    }
}

/// P-value of `score^2 / variance ~ chi2(1)`.
///
/// A variance that is not strictly positive and finite, or a non-finite
/// score, makes the test uncomputable and yields NaN.
pub fn score_pvalue(score: f64, variance: f64) -> f64 {
    if !score.is_finite() || !variance.is_finite() || variance <= 0.0 {
        return f64::NAN;
    }
    chisq1_upper(score * score / variance)
}

/// Standard normal quantile at `p / 2`, i.e. `qnorm(p / 2)`.
pub fn normal_quantile_half(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    -std::f64::consts::SQRT_2 * erfc_inv(p)
}

/// Standard error implied by an effect and its two-sided p-value:
/// `|beta / qnorm(p / 2)|`.
pub fn se_from_pvalue(beta: f64, pvalue: f64) -> f64 {
    (beta / normal_quantile_half(pvalue)).abs()
}
