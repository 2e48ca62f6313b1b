//! Survey analytics HTTP service.
//!
//! Loads one CSV dataset at startup and serves descriptive statistics,
//! charts, hypothesis tests and a few fixed-text endpoints as JSON.
//!
//! - [`handlers`]: endpoint logic as plain functions of the dataset
//! - [`chart`]: PNG rendering for `/api/visualization`
//! - [`cors`]: cross-origin headers and preflight handling
//! - [`server`]: routing on the shared accept loop

pub mod chart;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, Result};
pub use sa_common::{Incoming, Reply, StartError};
pub use server::{dispatch, ApiServer, AppState};
