//! Survey analytics math utilities.
//!
//! Everything the analytics service computes over a column reduces to the
//! functions here: descriptive statistics on `&[f64]` samples, the chi-square,
//! Student t and Fisher F upper tails, and the three hypothesis tests exposed
//! over HTTP.

pub mod describe;
pub mod dist;
pub mod error;
pub mod hypothesis;
pub mod special;

pub use describe::{mean, median, std_dev, variance};
pub use dist::{chi_squared_sf, fisher_f_sf, students_t_two_sided};
pub use error::{HypothesisError, Result};
pub use hypothesis::{chi2_contingency, f_oneway, ttest_ind, TestOutcome};
pub use special::beta::regularized_beta;
pub use special::gamma::{gamma_p, gamma_q};
pub use special::stable::{log_beta, log_gamma};
