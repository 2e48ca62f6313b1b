//! Classical hypothesis tests.
//!
//! - [`chi2_contingency`]: Pearson chi-square test of independence, with the
//!   Yates continuity correction applied when the table has one degree of
//!   freedom.
//! - [`ttest_ind`]: independent two-sample t-test assuming equal variances
//!   (pooled estimate).
//! - [`f_oneway`]: one-way analysis of variance.
//!
//! Degenerate samples (too few observations, zero spread) follow IEEE
//! semantics and surface as NaN statistics rather than errors; only inputs
//! that make the test itself meaningless are rejected.

use serde::Serialize;

use crate::describe::{mean, sum_sq_dev};
use crate::dist::{chi_squared_sf, fisher_f_sf, students_t_two_sided};
use crate::error::{HypothesisError, Result};

/// Statistic, p-value and degrees of freedom of a completed test.
///
/// `df` is the denominator degrees of freedom for the F test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

/// Chi-square test of independence on an `r × c` table of observed counts.
pub fn chi2_contingency(observed: &[Vec<f64>]) -> Result<TestOutcome> {
    let rows = observed.len();
    let cols = observed.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(HypothesisError::EmptyTable);
    }
    for (i, row) in observed.iter().enumerate() {
        if row.len() != cols {
            return Err(HypothesisError::RaggedTable {
                row: i,
                expected: cols,
                found: row.len(),
            });
        }
    }

    let row_sums: Vec<f64> = observed.iter().map(|r| r.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..cols)
        .map(|j| observed.iter().map(|r| r[j]).sum())
        .collect();
    let total: f64 = row_sums.iter().sum();
    if total <= 0.0 {
        return Err(HypothesisError::EmptyTable);
    }

    let dof = ((rows - 1) * (cols - 1)) as f64;
    if dof == 0.0 {
        return Ok(TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
            df: 0.0,
        });
    }

    let yates = dof == 1.0;
    let mut statistic = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &obs) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / total;
            if expected == 0.0 {
                return Err(HypothesisError::ZeroExpected);
            }
            let mut diff = obs - expected;
            if yates {
                diff = diff.signum() * (diff.abs() - 0.5).max(0.0);
            }
            statistic += diff * diff / expected;
        }
    }

    Ok(TestOutcome {
        statistic,
        p_value: chi_squared_sf(statistic, dof),
        df: dof,
    })
}

/// Independent two-sample t-test with pooled variance.
pub fn ttest_ind(a: &[f64], b: &[f64]) -> TestOutcome {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let df = n1 + n2 - 2.0;
    if a.is_empty() || b.is_empty() || df <= 0.0 {
        return TestOutcome {
            statistic: f64::NAN,
            p_value: f64::NAN,
            df,
        };
    }

    let pooled = (sum_sq_dev(a) + sum_sq_dev(b)) / df;
    let denom = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let statistic = (mean(a) - mean(b)) / denom;

    TestOutcome {
        statistic,
        p_value: students_t_two_sided(statistic, df),
        df,
    }
}

/// One-way ANOVA across `groups`.
pub fn f_oneway(groups: &[Vec<f64>]) -> Result<TestOutcome> {
    if groups.len() < 2 {
        return Err(HypothesisError::TooFewGroups {
            needed: 2,
            got: groups.len(),
        });
    }

    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let grand_mean = groups.iter().flatten().sum::<f64>() / n;

    let ss_between: f64 = groups
        .iter()
        .map(|g| {
            let d = mean(g) - grand_mean;
            g.len() as f64 * d * d
        })
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_sq_dev(g)).sum();

    let df_between = k - 1.0;
    let df_within = n - k;
    if df_within <= 0.0 {
        return Ok(TestOutcome {
            statistic: f64::NAN,
            p_value: f64::NAN,
            df: df_within,
        });
    }

    let statistic = (ss_between / df_between) / (ss_within / df_within);
    Ok(TestOutcome {
        statistic,
        p_value: fisher_f_sf(statistic, df_between, df_within),
        df: df_within,
    })
}
