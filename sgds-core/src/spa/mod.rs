//! Tail-probability recalibration for binary score tests.
//!
//! The score tests only depend on the [`TailProbabilitySolver`] seam;
//! [`SaddlePointSolver`] is the production implementation. Tests can
//! substitute any deterministic solver honouring the same contract.

pub mod saddle;

pub use saddle::{SaddlePointSolver, SpaConfig};

/// Outcome of a tail-probability computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailProbability {
    /// Two-sided p-value.
    pub pvalue: f64,
    /// False when the solver could not converge; the p-value is then a
    /// fallback to be used with caution.
    pub converged: bool,
}

/// Two-sided tail probability of a score statistic `q` whose null
/// distribution is a weighted sum of Bernoulli(`mu[i]`) with weights `g[i]`.
///
/// `mean` and `variance` are the null mean and variance of `q`. `cutoff`
/// is the standardized distance below which the normal approximation is
/// used directly. Implementations must not panic on non-finite input:
/// they return `converged = false` with a finite placeholder instead.
pub trait TailProbabilitySolver {
    fn tail_probability(
        &self,
        q: f64,
        mean: f64,
        variance: f64,
        mu: &[f64],
        g: &[f64],
        cutoff: f64,
    ) -> TailProbability;
}

impl<T: TailProbabilitySolver + ?Sized> TailProbabilitySolver for &T {
    fn tail_probability(
        &self,
        q: f64,
        mean: f64,
        variance: f64,
        mu: &[f64],
        g: &[f64],
        cutoff: f64,
    ) -> TailProbability {
        (**self).tail_probability(q, mean, variance, mu, g, cutoff)
    }
}
