//! Elementary vector kernels over dosage and model vectors.
//!
//! Everything here works in place or on caller-provided buffers and
//! never allocates. Scaling by allele counts or variance ratios is left
//! to the caller.

/// Highest valid dosage for a diploid additive coding.
pub const MAX_DOSAGE: f64 = 2.0;

/// Allele frequency summary of one dosage vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleleSummary {
    /// Alt allele frequency, `ac / (2 * n_valid)`; 0 when nothing is observed.
    pub af: f64,
    /// Alt allele count over non-missing samples.
    pub ac: f64,
    /// Number of non-missing samples.
    pub n_valid: usize,
    /// Number of indices written to the non-zero index buffer.
    pub n_nonzero: usize,
}

/// Whether `d` is an observed dosage. NaN, infinities and values outside
/// `[0, 2]` all count as missing.
#[inline]
pub fn is_valid_dosage(d: f64) -> bool {
    (0.0..=MAX_DOSAGE).contains(&d)
}

/// Compute AF and AC, mean-impute missing entries in place, and record the
/// indices of the non-zero (post-imputation) entries in `nonzero`.
///
/// `nonzero` must be at least as long as `g`.
pub fn af_ac_impute(g: &mut [f64], nonzero: &mut [usize]) -> AlleleSummary {
    debug_assert!(nonzero.len() >= g.len());
    let mut ac = 0.0;
    let mut n_valid = 0usize;
    for &d in g.iter() {
        if is_valid_dosage(d) {
            ac += d;
            n_valid += 1;
        }
    }
    let af = if n_valid > 0 {
        ac / (2.0 * n_valid as f64)
    } else {
        0.0
    };

    let fill = 2.0 * af;
    let mut n_nonzero = 0;
    for (i, d) in g.iter_mut().enumerate() {
        if !is_valid_dosage(*d) {
            *d = fill;
        }
        if *d != 0.0 {
            nonzero[n_nonzero] = i;
            n_nonzero += 1;
        }
    }

    AlleleSummary {
        af,
        ac,
        n_valid,
        n_nonzero,
    }
}

/// `g[i] = k - g[i]`. With `k = 2` this swaps the allele coding.
pub fn negate_and_shift(k: f64, g: &mut [f64]) {
    for d in g.iter_mut() {
        *d = k - *d;
    }
}

/// Write the indices of non-zero entries of `g` into `out`, returning how many.
pub fn nonzero_index(g: &[f64], out: &mut [usize]) -> usize {
    debug_assert!(out.len() >= g.len());
    let mut n = 0;
    for (i, &d) in g.iter().enumerate() {
        if d != 0.0 {
            out[n] = i;
            n += 1;
        }
    }
    n
}

/// `sum(a .* b)`
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One pass returning `(sum(a .* b), sum(b .* b))`.
pub fn dot_pair(a: &[f64], b: &[f64]) -> (f64, f64) {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold((0.0, 0.0), |(s, v), (&x, &y)| {
        (s + x * y, v + y * y)
    })
}

/// One pass returning `(sum(a .* b), sum(w .* b .* b))`.
pub fn dot_pair_weighted(a: &[f64], w: &[f64], b: &[f64]) -> (f64, f64) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(w.len(), b.len());
    a.iter()
        .zip(w)
        .zip(b)
        .fold((0.0, 0.0), |(s, v), ((&x, &wi), &y)| {
            (s + x * y, v + wi * y * y)
        })
}

/// `g = s * g`
pub fn scale_in_place(s: f64, g: &mut [f64]) {
    for d in g.iter_mut() {
        *d *= s;
    }
}
