//! Upper-tail probabilities of the test-statistic distributions.

use crate::special::beta::regularized_beta;
use crate::special::gamma::gamma_q;

/// Survival function of the chi-square distribution with `k` degrees of
/// freedom: `P(X > x) = Q(k/2, x/2)`.
pub fn chi_squared_sf(x: f64, k: f64) -> f64 {
    if x.is_nan() || k.is_nan() || k <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(k / 2.0, x / 2.0)
}

/// Two-sided p-value of a Student t statistic: `P(|T| ≥ |t|)`.
pub fn students_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    regularized_beta(df / (df + t * t), df / 2.0, 0.5)
}

/// Survival function of the F distribution with `(d1, d2)` degrees of
/// freedom.
pub fn fisher_f_sf(f: f64, d1: f64, d2: f64) -> f64 {
    if f.is_nan() || d1.is_nan() || d2.is_nan() || d1 <= 0.0 || d2 <= 0.0 {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }
    regularized_beta(d2 / (d2 + d1 * f), d2 / 2.0, d1 / 2.0)
}
