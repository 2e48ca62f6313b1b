//! Configuration file discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths →
//! system config → defaults.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{AnalyticsConfig, PresentationConfig};
use crate::error::ConfigError;

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--config`.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Found in /etc/survey-analytics/.
    SystemConfig,

    /// No file; built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

pub const ENV_API_CONFIG: &str = "SA_API_CONFIG";
pub const ENV_WEB_CONFIG: &str = "SA_WEB_CONFIG";
pub const ENV_CONFIG_DIR: &str = "SA_CONFIG_DIR";

pub const API_CONFIG_FILENAME: &str = "sa-api.toml";
pub const WEB_CONFIG_FILENAME: &str = "sa-web.toml";

/// Application name for XDG and system directories.
const APP_NAME: &str = "survey-analytics";

/// Locate a config file.
///
/// An explicit CLI path is returned even when it does not exist, so that the
/// caller reports the missing file instead of silently using defaults.
pub fn resolve_config_file(
    cli_path: Option<&Path>,
    env_var: &str,
    filename: &str,
) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(env_var) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(filename);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(filename);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    let system_path = system_config_dir().join(filename);
    if system_path.exists() {
        return (Some(system_path), ConfigSource::SystemConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Resolve and load the analytics service config.
pub fn load_analytics_config(
    cli_path: Option<&Path>,
) -> Result<(AnalyticsConfig, ConfigSource), ConfigError> {
    match resolve_config_file(cli_path, ENV_API_CONFIG, API_CONFIG_FILENAME) {
        (Some(path), source) => {
            debug!(path = %path.display(), %source, "loading analytics config");
            Ok((AnalyticsConfig::from_file(&path)?, source))
        }
        (None, source) => Ok((AnalyticsConfig::default(), source)),
    }
}

/// Resolve and load the presentation service config.
pub fn load_presentation_config(
    cli_path: Option<&Path>,
) -> Result<(PresentationConfig, ConfigSource), ConfigError> {
    match resolve_config_file(cli_path, ENV_WEB_CONFIG, WEB_CONFIG_FILENAME) {
        (Some(path), source) => {
            debug!(path = %path.display(), %source, "loading presentation config");
            Ok((PresentationConfig::from_file(&path)?, source))
        }
        (None, source) => Ok((PresentationConfig::default(), source)),
    }
}

/// XDG config directory for survey-analytics.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
