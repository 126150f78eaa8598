//! Saddlepoint approximation for binary (binomial) score statistics.
//!
//! The cumulant generating function of `q = sum_i g_i * Y_i` with
//! `Y_i ~ Bernoulli(mu_i)` is
//!   K(t) = sum_i log(1 - mu_i + mu_i * exp(g_i * t))
//! The saddle point solves K'(t) = q; the tail probability then follows
//! from the Lugannani-Rice formula. Both tails are evaluated, at `q` and
//! at its mirror `2 * mean - q`, and summed.

use tracing::warn;

use super::{TailProbability, TailProbabilitySolver};
use crate::util::math::chisq1_upper;

/// Root finding settings.
#[derive(Debug, Clone, Copy)]
pub struct SpaConfig {
    /// Convergence tolerance on successive Newton iterates.
    pub tol: f64,
    /// Iteration cap for each root search.
    pub max_iter: usize,
}

impl Default for SpaConfig {
    fn default() -> Self {
        Self {
            tol: f64::EPSILON.powf(0.25),
            max_iter: 1000,
        }
    }
}

/// CGF K(t).
pub fn k0_binom(t: f64, mu: &[f64], g: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (mi, gi) in mu.iter().zip(g.iter()) {
        sum += (1.0 - mi + mi * (gi * t).exp()).ln();
    }
    sum
}

/// K'(t) - q.
pub fn k1_adj_binom(t: f64, mu: &[f64], g: &[f64], q: f64) -> f64 {
    let mut sum = 0.0;
    for (mi, gi) in mu.iter().zip(g.iter()) {
        let denom = (1.0 - mi) * (-gi * t).exp() + mi;
        sum += mi * gi / denom;
    }
    sum - q
}

/// K''(t).
pub fn k2_binom(t: f64, mu: &[f64], g: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (mi, gi) in mu.iter().zip(g.iter()) {
        let e = (-gi * t).exp();
        let denom = (1.0 - mi) * e + mi;
        sum += (1.0 - mi) * mi * gi * gi * e / (denom * denom);
    }
    sum
}

/// Result of root finding for K'(t) = q.
#[derive(Debug, Clone, Copy)]
pub struct RootResult {
    /// The saddle point; +/- infinity when `q` lies outside the support.
    pub root: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Find the root of K'(t) = q by Newton-Raphson, halving the step when
/// an iterate overshoots past a sign change.
pub fn find_root_k1(
    init: f64,
    mu: &[f64],
    g: &[f64],
    q: f64,
    tol: f64,
    max_iter: usize,
) -> RootResult {
    // q outside [sum of negative g, sum of positive g] has no saddle point
    let g_pos: f64 = g.iter().filter(|&&v| v > 0.0).sum();
    let g_neg: f64 = g.iter().filter(|&&v| v < 0.0).sum();
    if q >= g_pos {
        return RootResult {
            root: f64::INFINITY,
            iterations: 0,
            converged: true,
        };
    }
    if q <= g_neg {
        return RootResult {
            root: f64::NEG_INFINITY,
            iterations: 0,
            converged: true,
        };
    }

    let mut t = init;
    let mut k1_eval = k1_adj_binom(t, mu, g, q);
    let mut prev_jump = f64::INFINITY;

    for iter in 1..=max_iter {
        let k2_eval = k2_binom(t, mu, g);
        let t_new = t - k1_eval / k2_eval;

        if !t_new.is_finite() {
            return RootResult {
                root: t,
                iterations: iter,
                converged: false,
            };
        }

        if (t_new - t).abs() < tol {
            return RootResult {
                root: t_new,
                iterations: iter,
                converged: true,
            };
        }

        let new_k1 = k1_adj_binom(t_new, mu, g, q);

        if k1_eval * new_k1 < 0.0 && (t_new - t).abs() > prev_jump - tol {
            // overshoot: step half the previous jump towards the sign change
            let direction = if new_k1 - k1_eval > 0.0 { 1.0 } else { -1.0 };
            prev_jump /= 2.0;
            t += direction * prev_jump;
            k1_eval = k1_adj_binom(t, mu, g, q);
        } else {
            if k1_eval * new_k1 < 0.0 {
                prev_jump = (t_new - t).abs();
            }
            t = t_new;
            k1_eval = new_k1;
        }
    }

    RootResult {
        root: t,
        iterations: max_iter,
        converged: false,
    }
}

/// One-tail saddlepoint probability at saddle point `zeta` (Lugannani-Rice).
///
/// Returns `None` when the approximation is degenerate at this point.
/// The value may be negative for `zeta` on the near side of the mean;
/// callers take its absolute value.
pub fn saddle_probability(zeta: f64, mu: &[f64], g: &[f64], q: f64) -> Option<f64> {
    if zeta.is_infinite() {
        // q at or beyond the edge of the support
        return Some(0.0);
    }
    let k1 = k0_binom(zeta, mu, g);
    let k2 = k2_binom(zeta, mu, g);
    if !k1.is_finite() || !k2.is_finite() {
        return Some(0.0);
    }

    let temp1 = zeta * q - k1;
    if temp1 < 0.0 || k2 < 0.0 {
        return None;
    }
    let w = zeta.signum() * (2.0 * temp1).sqrt();
    let v = zeta * k2.sqrt();
    if w == 0.0 {
        return None;
    }

    let z_test = w + (1.0 / w) * (v / w).ln();
    if !z_test.is_finite() {
        return None;
    }
    let pval = if z_test > 0.0 {
        upper_normal_tail(z_test)
    } else {
        -lower_normal_tail(z_test)
    };
    Some(pval)
}

fn upper_normal_tail(z: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(z / std::f64::consts::SQRT_2)
}

fn lower_normal_tail(z: f64) -> f64 {
    upper_normal_tail(-z)
}

/// Saddlepoint solver for binary traits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaddlePointSolver {
    pub config: SpaConfig,
}

impl SaddlePointSolver {
    pub fn new(config: SpaConfig) -> Self {
        Self { config }
    }
}

impl TailProbabilitySolver for SaddlePointSolver {
    fn tail_probability(
        &self,
        q: f64,
        mean: f64,
        variance: f64,
        mu: &[f64],
        g: &[f64],
        cutoff: f64,
    ) -> TailProbability {
        if !q.is_finite() || !mean.is_finite() || !variance.is_finite() || variance <= 0.0 {
            return TailProbability {
                pvalue: 1.0,
                converged: false,
            };
        }

        let score = q - mean;
        let pval_noadj = chisq1_upper(score * score / variance);
        if score.abs() / variance.sqrt() < cutoff {
            return TailProbability {
                pvalue: pval_noadj,
                converged: true,
            };
        }

        let qinv = 2.0 * mean - q;
        let SpaConfig { tol, max_iter } = self.config;
        let root1 = find_root_k1(0.0, mu, g, q, tol, max_iter);
        let root2 = find_root_k1(0.0, mu, g, qinv, tol, max_iter);

        if root1.converged && root2.converged {
            let p1 = saddle_probability(root1.root, mu, g, q).unwrap_or(pval_noadj / 2.0);
            let p2 = saddle_probability(root2.root, mu, g, qinv).unwrap_or(pval_noadj / 2.0);
            TailProbability {
                pvalue: p1.abs() + p2.abs(),
                converged: true,
            }
        } else {
            warn!(
                "Saddle point root search did not converge (q={:.6}, mean={:.6}, var={:.6})",
                q, mean, variance
            );
            TailProbability {
                pvalue: pval_noadj,
                converged: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k0_binom() {
        let mu = vec![0.3, 0.5, 0.7];
        let g = vec![0.0, 1.0, 2.0];
        // K(0) = sum(log(1)) = 0
        assert!(k0_binom(0.0, &mu, &g).abs() < 1e-12);
    }

    #[test]
    fn test_k1_at_zero() {
        let mu = vec![0.3, 0.5, 0.7];
        let g = vec![0.0, 1.0, 2.0];
        // K'(0) = sum(mu_i * g_i) = 1.9
        assert!((k1_adj_binom(0.0, &mu, &g, 0.0) - 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_k2_at_zero_is_variance() {
        let mu = vec![0.3, 0.5, 0.7];
        let g = vec![0.0, 1.0, 2.0];
        // K''(0) = sum(mu (1 - mu) g^2) = 0.25 + 4 * 0.21
        assert!((k2_binom(0.0, &mu, &g) - 1.09).abs() < 1e-12);
    }

    #[test]
    fn test_root_finding_converges() {
        let mu = vec![0.3, 0.5, 0.7, 0.4, 0.6];
        let g = vec![0.0, 1.0, 2.0, 0.0, 1.0];
        let q = 3.5;
        let r = find_root_k1(0.0, &mu, &g, q, 1e-8, 1000);
        assert!(r.converged);
        assert!(k1_adj_binom(r.root, &mu, &g, q).abs() < 1e-6);
        // q above the mean needs a positive saddle point
        assert!(r.root > 0.0);
    }

    #[test]
    fn test_root_outside_support() {
        let mu = vec![0.5; 10];
        let g = vec![1.0; 10];
        let hi = find_root_k1(0.0, &mu, &g, 20.0, 1e-6, 100);
        assert!(hi.converged && hi.root == f64::INFINITY);
        let lo = find_root_k1(0.0, &mu, &g, -1.0, 1e-6, 100);
        assert!(lo.converged && lo.root == f64::NEG_INFINITY);
    }

    #[test]
    fn test_normal_region_returns_unadjusted() {
        let mu = vec![0.4; 20];
        let g = vec![1.0; 20];
        let mean = 8.0;
        let var = 20.0 * 0.24;
        let solver = SaddlePointSolver::default();
        let r = solver.tail_probability(mean + 0.5, mean, var, &mu, &g, 2.0);
        assert!(r.converged);
        assert!((r.pvalue - chisq1_upper(0.25 / var)).abs() < 1e-15);
    }

    #[test]
    fn test_tail_probability_close_to_exact_binomial() {
        // q = sum of 40 Bernoulli(0.1); P(|q - 4| >= 6) = P(q >= 10) + P(q <= -2)
        let n = 40;
        let mu = vec![0.1; n];
        let g = vec![1.0; n];
        let mean = 4.0;
        let var = n as f64 * 0.09;
        let solver = SaddlePointSolver::default();
        let r = solver.tail_probability(10.0, mean, var, &mu, &g, 2.0);
        assert!(r.converged);

        // exact upper tail P(X >= 10), X ~ Bin(40, 0.1)
        let mut exact = 0.0;
        let mut pmf = 0.9f64.powi(40);
        for k in 0..=40 {
            if k >= 10 {
                exact += pmf;
            }
            pmf *= (40 - k) as f64 / (k + 1) as f64 * (0.1 / 0.9);
        }
        // the SPA continuous approximation sits between P(X >= 10) and P(X >= 11)
        assert!(r.pvalue > 0.0 && r.pvalue < 1.0);
        assert!(r.pvalue < exact * 1.5, "spa {} vs exact {}", r.pvalue, exact);
        assert!(r.pvalue > exact * 0.2, "spa {} vs exact {}", r.pvalue, exact);
        // and far from the normal approximation, which overstates significance here
        let normal = chisq1_upper(36.0 / var);
        assert!((r.pvalue - normal).abs() > 1e-4);
    }

    #[test]
    fn test_non_finite_input() {
        let solver = SaddlePointSolver::default();
        let mu = vec![0.5; 3];
        let g = vec![1.0; 3];
        let r = solver.tail_probability(f64::NAN, 1.5, 0.75, &mu, &g, 2.0);
        assert!(!r.converged);
        assert!(r.pvalue.is_finite());
        let r = solver.tail_probability(2.0, 1.5, 0.0, &mu, &g, 2.0);
        assert!(!r.converged);
    }
}
