//! Service configuration types.
//!
//! Every field has a serde default, so an empty TOML file (or none at all)
//! yields a working local setup: analytics on `127.0.0.1:8000`, presentation
//! on `127.0.0.1:7000` pointing at it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_web_port() -> u16 {
    7000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./cleaned-data-set.csv")
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://127.0.0.1:7000".to_string()]
}

fn default_upstream() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_visualization_file() -> String {
    "images/visualization.jpg".to_string()
}

fn default_max_table_rows() -> usize {
    500
}

/// Cross-origin policy of the analytics service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins allowed to call the API with credentials.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

/// Analytics service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// CSV file loaded at startup.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_api_port(),
            dataset_path: default_dataset_path(),
            cors: CorsConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = read_config(path)?;
        Self::from_toml_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("bind address is empty".into()));
        }
        if self.cors.allowed_origins.iter().any(|o| o.ends_with('/')) {
            return Err(ConfigError::Invalid(
                "CORS origins must not end with '/'".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` to listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors.allowed_origins = origins;
        self
    }
}

/// Rendering limits for the HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    /// Rows shown per record table before truncation.
    #[serde(default = "default_max_table_rows")]
    pub max_table_rows: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_table_rows: default_max_table_rows(),
        }
    }
}

/// Presentation service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Base URL of the analytics service, without trailing slash.
    #[serde(default = "default_upstream")]
    pub upstream_base_url: String,
    /// Per-call upstream timeout; unset blocks indefinitely.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,
    /// Directory served under `/static/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Visualization JPEG, relative to `static_dir`.
    #[serde(default = "default_visualization_file")]
    pub visualization_file: String,
    #[serde(default)]
    pub limits: PageLimits,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_web_port(),
            upstream_base_url: default_upstream(),
            upstream_timeout_secs: None,
            static_dir: default_static_dir(),
            visualization_file: default_visualization_file(),
            limits: PageLimits::default(),
        }
    }
}

impl PresentationConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = read_config(path)?;
        Self::from_toml_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("bind address is empty".into()));
        }
        if !(self.upstream_base_url.starts_with("http://")
            || self.upstream_base_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "upstream_base_url must be an http(s) URL: {}",
                self.upstream_base_url
            )));
        }
        if self.visualization_file.contains("..") || self.visualization_file.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "visualization_file must be relative to static_dir: {}",
                self.visualization_file
            )));
        }
        if self.limits.max_table_rows == 0 {
            return Err(ConfigError::Invalid("limits.max_table_rows must be > 0".into()));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        while self.upstream_base_url.ends_with('/') {
            self.upstream_base_url.pop();
        }
    }

    /// `host:port` to listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Filesystem location of the visualization JPEG.
    pub fn visualization_path(&self) -> PathBuf {
        self.static_dir.join(&self.visualization_file)
    }

    /// URL path the page uses for the visualization JPEG.
    pub fn visualization_url(&self) -> String {
        format!("/static/{}", self.visualization_file)
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_upstream(mut self, url: impl Into<String>) -> Self {
        self.upstream_base_url = url.into();
        self.normalize();
        self
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.upstream_timeout_secs = secs;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_max_table_rows(mut self, rows: usize) -> Self {
        self.limits.max_table_rows = rows;
        self
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
