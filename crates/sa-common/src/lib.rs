//! Survey analytics shared types.
//!
//! - [`dataset`]: the immutable in-memory table and its CSV loader
//! - [`wire`]: JSON request/response bodies shared by both services
//! - [`config`] / [`resolve`]: service configuration and config-file discovery
//! - [`logging`]: tracing subscriber setup for the binaries
//! - [`http`]: the blocking accept loop both services run on

pub mod config;
pub mod dataset;
pub mod error;
pub mod http;
pub mod logging;
pub mod resolve;
pub mod wire;

pub use config::{AnalyticsConfig, CorsConfig, PageLimits, PresentationConfig};
pub use dataset::{Cell, Column, ColumnKind, Dataset};
pub use error::{ConfigError, DatasetError, Result, StartError};
pub use http::{HttpServer, Incoming, Reply};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use resolve::{load_analytics_config, load_presentation_config, ConfigSource};
pub use wire::{Record, TestKind};
