//! Property-based tests using proptest.
//!
//! These check invariants over randomly generated models and dosage
//! vectors rather than specific numerical values:
//!   - allele frequency bookkeeping and the minor-allele flip
//!   - agreement of the sparse and dense projections
//!   - the MAF/MAC gate for both trait types
//!   - allele swap symmetry and p-value bounds

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use sgds_core::model::{ModelBundle, ModelContext, TraitType};
use sgds_core::score_test::projection::BINARY_SPARSE_MAF;
use sgds_core::score_test::{
    binary, quantitative, ProjectionStrategy, ScoreBuffers, ScoreTester, VariantResult,
};
use sgds_linalg::vector::{af_ac_impute, negate_and_shift};
use sgds_linalg::DenseMatrix;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Intercept plus one continuous covariate, outcome drawn around `mu`.
fn random_model(rng: &mut ChaCha8Rng, n: usize, trait_type: TraitType) -> ModelContext {
    let mut xdata = vec![1.0; n];
    xdata.extend((0..n).map(|_| rng.gen::<f64>() * 2.0 - 1.0));
    let x = DenseMatrix::from_col_major(n, 2, &xdata).unwrap();

    let (y, mu, tau) = match trait_type {
        TraitType::Binary => {
            let mu: Vec<f64> = (0..n).map(|_| 0.05 + rng.gen::<f64>() * 0.4).collect();
            let y = mu
                .iter()
                .map(|&m| if rng.gen::<f64>() < m { 1.0 } else { 0.0 })
                .collect();
            (y, mu, [1.0, 0.3])
        }
        TraitType::Quantitative => {
            let y: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * 4.0 - 2.0).collect();
            let mean = y.iter().sum::<f64>() / n as f64;
            (y, vec![mean; n], [0.5 + rng.gen::<f64>(), 0.3])
        }
    };

    let bundle = ModelBundle::from_null_fit(
        trait_type,
        Vec::new(),
        &x,
        &y,
        &mu,
        tau,
        0.9 + rng.gen::<f64>() * 0.2,
        f64::NAN,
        f64::NAN,
    )
    .unwrap();
    ModelContext::new(bundle).unwrap()
}

/// Hard-call dosages with about `p_alt` alt alleles per haplotype.
fn random_hard_calls(rng: &mut ChaCha8Rng, n: usize, p_alt: f64) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let a = (rng.gen::<f64>() < p_alt) as u8 + (rng.gen::<f64>() < p_alt) as u8;
            a as f64
        })
        .collect()
}

/// Dosages on a quarter grid with some missing entries.
fn random_dosages(rng: &mut ChaCha8Rng, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| match rng.gen_range(0..10) {
            0 => f64::NAN,
            1 => -9.0,
            _ => rng.gen_range(0..=8) as f64 * 0.25,
        })
        .collect()
}

fn trait_type(binary: bool) -> TraitType {
    if binary {
        TraitType::Binary
    } else {
        TraitType::Quantitative
    }
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1e-12)
}

// ---------------------------------------------------------------------------
// 1. AF/AC of complete dosage vectors
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_af_ac_without_missing(
        n in 1usize..200,
        seed in 0u64..10_000,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut g: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() * 2.0).collect();
        let original = g.clone();
        let mut idx = vec![0; n];

        let s = af_ac_impute(&mut g, &mut idx);
        let sum: f64 = original.iter().sum();

        prop_assert_eq!(s.n_valid, n);
        prop_assert!(close(s.ac, sum, 1e-12));
        prop_assert!(close(s.af, sum / (2.0 * n as f64), 1e-12));
        prop_assert_eq!(g, original);
    }
}

// ---------------------------------------------------------------------------
// 2. Flipping twice is the identity
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_double_flip_is_identity(
        ticks in prop::collection::vec(0u32..=65_536, 1..100),
    ) {
        // dosages stored with 15 fractional bits, as in 16-bit probability encodings
        let g: Vec<f64> = ticks.iter().map(|&t| t as f64 / 32_768.0).collect();
        let mut h = g.clone();
        negate_and_shift(2.0, &mut h);
        negate_and_shift(2.0, &mut h);
        prop_assert_eq!(h, g);
    }
}

// ---------------------------------------------------------------------------
// 3. AF = 0.5 is never flipped
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_half_frequency_not_flipped(
        half in 5usize..40,
        binary_trait in any::<bool>(),
        seed in 0u64..10_000,
    ) {
        let n = 2 * half;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, trait_type(binary_trait));
        let mut tester = ScoreTester::new(&ctx);

        // half 0s and half 2s: AF = 0.5 exactly
        let g: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.0 } else { 2.0 }).collect();
        let mut dosage = g.clone();
        let r = tester.test(&mut dosage).unwrap();

        prop_assert!(r.is_some());
        prop_assert_eq!(dosage, g);
    }
}

// ---------------------------------------------------------------------------
// 4. Sparse and dense projections agree at the binary branch point
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_binary_sparse_dense_agree_at_boundary(
        seed in 0u64..10_000,
    ) {
        let n = 200;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, TraitType::Binary);
        let mut buf = ScoreBuffers::for_model(&ctx);

        // 20 heterozygous carriers: maf = 20 / 400 = 0.05
        let mut g = vec![0.0; n];
        let mut placed = 0;
        while placed < 20 {
            let i = rng.gen_range(0..n);
            if g[i] == 0.0 {
                g[i] = 1.0;
                placed += 1;
            }
        }
        let mut idx = vec![0; n];
        let s = af_ac_impute(&mut g, &mut idx);
        prop_assert_eq!(s.af, BINARY_SPARSE_MAF);
        prop_assert_eq!(ProjectionStrategy::for_binary(s.af), ProjectionStrategy::Dense);

        let sparse = binary::statistic(&ctx, &mut buf, &g, ProjectionStrategy::Sparse);
        let dense = binary::statistic(&ctx, &mut buf, &g, ProjectionStrategy::Dense);

        prop_assert!(close(sparse.variance, dense.variance, 1e-9));
        prop_assert!((sparse.score - dense.score).abs() <= 1e-9 * dense.variance.sqrt().max(1.0));
        let t_sparse = sparse.score * sparse.score / sparse.variance;
        let t_dense = dense.score * dense.score / dense.variance;
        prop_assert!((t_sparse - t_dense).abs() <= 1e-8 * t_dense.max(1.0));
        let beta_sparse = sparse.score / sparse.variance;
        let beta_dense = dense.score / dense.variance;
        prop_assert!((beta_sparse - beta_dense).abs() <= 1e-8 * beta_dense.abs().max(1.0));
    }

    #[test]
    fn prop_quantitative_variance_agrees_across_routes(
        seed in 0u64..10_000,
        p_alt in 0.01f64..0.5,
    ) {
        let n = 120;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, TraitType::Quantitative);
        let mut buf = ScoreBuffers::for_model(&ctx);
        let g = random_hard_calls(&mut rng, n, p_alt);
        prop_assume!(g.iter().any(|&d| d > 0.0));
        let mac = g.iter().sum::<f64>();

        let sparse = quantitative::statistic(&ctx, &mut buf, &g, mac, ProjectionStrategy::Sparse);
        let dense = quantitative::statistic(&ctx, &mut buf, &g, mac, ProjectionStrategy::Dense);
        prop_assert!(close(sparse.variance, dense.variance, 1e-9));
    }
}

// ---------------------------------------------------------------------------
// 5. Threshold exclusion
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_below_maf_threshold_excluded(
        binary_trait in any::<bool>(),
        carriers in 1usize..10,
        seed in 0u64..10_000,
    ) {
        let n = 100;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        // maf = carriers / 200 < 0.05
        let ctx = random_model(&mut rng, n, trait_type(binary_trait))
            .with_thresholds(0.05, f64::NAN);
        let mut tester = ScoreTester::new(&ctx);
        let mut g: Vec<f64> = (0..n).map(|i| if i < carriers { 1.0 } else { 0.0 }).collect();
        prop_assert!(tester.test(&mut g).unwrap().is_none());
    }

    #[test]
    fn prop_below_mac_threshold_excluded(
        binary_trait in any::<bool>(),
        carriers in 1usize..10,
        seed in 0u64..10_000,
    ) {
        let n = 100;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, trait_type(binary_trait))
            .with_thresholds(f64::NAN, carriers as f64 + 0.5);
        {
            let mut tester = ScoreTester::new(&ctx);
            let mut g: Vec<f64> = (0..n).map(|i| if i < carriers { 1.0 } else { 0.0 }).collect();
            prop_assert!(tester.test(&mut g).unwrap().is_none());
        }

        // the same variant passes once the bound is met
        let ctx = ctx.with_thresholds(f64::NAN, carriers as f64);
        let mut tester = ScoreTester::new(&ctx);
        let mut g: Vec<f64> = (0..n).map(|i| if i < carriers { 1.0 } else { 0.0 }).collect();
        prop_assert!(tester.test(&mut g).unwrap().is_some());
    }
}

// ---------------------------------------------------------------------------
// 6. Allele swap flips the effect and keeps the p-value
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_allele_swap_symmetry(
        binary_trait in any::<bool>(),
        p_alt in 0.005f64..0.45,
        seed in 0u64..10_000,
    ) {
        let n = 150;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, trait_type(binary_trait));
        let g = random_hard_calls(&mut rng, n, p_alt);
        let ac: f64 = g.iter().sum();
        prop_assume!(ac > 0.0 && ac < 2.0 * n as f64 && ac != n as f64);

        let mut tester = ScoreTester::new(&ctx);
        let mut a = g.clone();
        let mut b: Vec<f64> = g.iter().map(|&d| 2.0 - d).collect();
        let ra = tester.test(&mut a).unwrap().unwrap();
        let rb = tester.test(&mut b).unwrap().unwrap();

        let (beta_a, beta_b, af_a, af_b) = match (ra, rb) {
            (VariantResult::Quantitative(x), VariantResult::Quantitative(y)) => {
                (x.beta, y.beta, x.af, y.af)
            }
            (VariantResult::Binary(x), VariantResult::Binary(y)) => {
                prop_assert_eq!(x.pvalue_noadj, y.pvalue_noadj);
                prop_assert_eq!(x.converged, y.converged);
                (x.beta, y.beta, x.af, y.af)
            }
            _ => unreachable!("same model, same trait type"),
        };

        prop_assert_eq!(beta_b, -beta_a);
        prop_assert_eq!(ra.pvalue(), rb.pvalue());
        prop_assert!((af_b - (1.0 - af_a)).abs() < 1e-12);
    }
}

// ---------------------------------------------------------------------------
// 7. P-values are probabilities
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_pvalue_in_unit_interval(
        binary_trait in any::<bool>(),
        n in 30usize..120,
        seed in 0u64..10_000,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = random_model(&mut rng, n, trait_type(binary_trait));
        let mut tester = ScoreTester::new(&ctx);
        let mut g = random_dosages(&mut rng, n);

        if let Some(r) = tester.test(&mut g).unwrap() {
            let p = r.pvalue();
            prop_assert!((0.0..=1.0).contains(&p), "p-value out of range: {}", p);
            if let VariantResult::Binary(b) = r {
                prop_assert!((0.0..=1.0).contains(&b.pvalue_noadj));
            }
        }
        // imputed in place: nothing left outside [0, 2]
        prop_assert!(g.iter().all(|&d| (0.0..=2.0).contains(&d)));
    }
}
