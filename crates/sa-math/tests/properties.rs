//! Property-based tests for sa-math numerical functions.
//!
//! Uses proptest to check that the tails are proper probabilities and that
//! the tests behave the way their definitions demand across random inputs.

use proptest::prelude::*;
use sa_math::{
    chi2_contingency, chi_squared_sf, f_oneway, fisher_f_sf, gamma_p, gamma_q, log_gamma, mean,
    regularized_beta, students_t_two_sided, ttest_ind, variance,
};

const TOL: f64 = 1e-10;

fn in_unit_interval(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

// ============================================================================
// Special functions
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Γ(z+1) = z Γ(z) in log form.
    #[test]
    fn log_gamma_recurrence(z in 0.1..50.0f64) {
        let lhs = log_gamma(z + 1.0);
        let rhs = z.ln() + log_gamma(z);
        prop_assert!((lhs - rhs).abs() < 1e-8 * lhs.abs().max(1.0),
            "lgamma({})={} vs ln z + lgamma(z)={}", z + 1.0, lhs, rhs);
    }

    /// P and Q partition unity.
    #[test]
    fn incomplete_gamma_partition(a in 0.1..60.0f64, x in 0.0..120.0f64) {
        let sum = gamma_p(a, x) + gamma_q(a, x);
        prop_assert!((sum - 1.0).abs() < TOL, "P+Q={} at a={} x={}", sum, a, x);
    }

    /// I_x(a, b) is a CDF in x.
    #[test]
    fn incomplete_beta_monotone(a in 0.2..30.0f64, b in 0.2..30.0f64,
                                x1 in 0.0..1.0f64, x2 in 0.0..1.0f64) {
        let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let f_lo = regularized_beta(lo, a, b);
        let f_hi = regularized_beta(hi, a, b);
        prop_assert!(in_unit_interval(f_lo) && in_unit_interval(f_hi));
        prop_assert!(f_lo <= f_hi + 1e-9, "I({})={} > I({})={}", lo, f_lo, hi, f_hi);
    }
}

// ============================================================================
// Distribution tails
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn chi_squared_sf_is_decreasing(k in 1u32..40, x in 0.0..200.0f64, dx in 0.0..20.0f64) {
        let k = k as f64;
        let a = chi_squared_sf(x, k);
        let b = chi_squared_sf(x + dx, k);
        prop_assert!(in_unit_interval(a) && in_unit_interval(b));
        prop_assert!(b <= a + 1e-10);
    }

    #[test]
    fn t_two_sided_is_symmetric(t in -50.0..50.0f64, df in 1.0..200.0f64) {
        let p_pos = students_t_two_sided(t, df);
        let p_neg = students_t_two_sided(-t, df);
        prop_assert!(in_unit_interval(p_pos));
        prop_assert!((p_pos - p_neg).abs() < TOL);
    }

    #[test]
    fn f_sf_in_unit_interval(f in 0.0..100.0f64, d1 in 1.0..50.0f64, d2 in 1.0..500.0f64) {
        prop_assert!(in_unit_interval(fisher_f_sf(f, d1, d2)));
    }
}

// ============================================================================
// Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Shifting both samples by the same constant leaves the t statistic alone.
    #[test]
    fn ttest_shift_invariant(
        a in prop::collection::vec(-100.0..100.0f64, 3..30),
        b in prop::collection::vec(-100.0..100.0f64, 3..30),
        shift in -1000.0..1000.0f64,
    ) {
        prop_assume!(variance(&a) > 1e-6 && variance(&b) > 1e-6);
        let base = ttest_ind(&a, &b);
        let a2: Vec<f64> = a.iter().map(|v| v + shift).collect();
        let b2: Vec<f64> = b.iter().map(|v| v + shift).collect();
        let shifted = ttest_ind(&a2, &b2);
        prop_assert!((base.statistic - shifted.statistic).abs() < 1e-6 * base.statistic.abs().max(1.0));
        prop_assert!(in_unit_interval(base.p_value));
    }

    /// Chi-square statistics are non-negative and p-values are probabilities.
    #[test]
    fn chi2_outcome_is_valid(cells in prop::collection::vec(1u32..50, 6)) {
        let table = vec![
            cells[0..3].iter().map(|&c| c as f64).collect::<Vec<_>>(),
            cells[3..6].iter().map(|&c| c as f64).collect::<Vec<_>>(),
        ];
        let out = chi2_contingency(&table).unwrap();
        prop_assert!(out.statistic >= 0.0);
        prop_assert!(in_unit_interval(out.p_value));
    }

    /// ANOVA on groups with identical means gives F = 0.
    #[test]
    fn anova_equal_means(spread in 0.5..10.0f64, center in -50.0..50.0f64) {
        let g = vec![center - spread, center, center + spread];
        let out = f_oneway(&[g.clone(), g.clone(), g]).unwrap();
        prop_assert!(out.statistic.abs() < 1e-9);
        prop_assert!((out.p_value - 1.0).abs() < 1e-9);
        prop_assert!((mean(&[center - spread, center, center + spread]) - center).abs() < 1e-9);
    }
}
