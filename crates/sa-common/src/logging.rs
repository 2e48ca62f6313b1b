//! Logging setup shared by both binaries.
//!
//! Two output modes, both on stderr:
//! - human-readable console lines (ANSI colours when stderr is a terminal)
//! - JSON lines for log shippers
//!
//! Level resolution: CLI flag → `SA_LOG` → `RUST_LOG` directives → `info`.
//! Format resolution: CLI flag → `SA_LOG_FORMAT` → `human`.

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG: &str = "SA_LOG";
pub const ENV_LOG_FORMAT: &str = "SA_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `RUST_LOG` directives, used only when no explicit level was given.
    pub directives: Option<String>,
}

impl LogConfig {
    /// Build from environment with CLI overrides on top.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let sa_log = std::env::var(ENV_LOG).ok();
        let rust_log = std::env::var("RUST_LOG").ok();
        let sa_format = std::env::var(ENV_LOG_FORMAT).ok();
        Self::resolve(
            cli_level,
            cli_format,
            sa_log.as_deref(),
            rust_log.as_deref(),
            sa_format.as_deref(),
        )
    }

    fn resolve(
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
        sa_log: Option<&str>,
        rust_log: Option<&str>,
        sa_format: Option<&str>,
    ) -> Self {
        let mut config = LogConfig::default();

        let env_level = sa_log.and_then(|v| v.parse::<LogLevel>().ok());
        match (cli_level, env_level) {
            (Some(level), _) | (None, Some(level)) => config.level = level,
            (None, None) => {
                config.directives = rust_log
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string);
            }
        }

        if let Some(format) = sa_format.and_then(|v| v.parse::<LogFormat>().ok()) {
            config.format = format;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }
        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self.directives = None;
        self
    }

    fn filter(&self) -> EnvFilter {
        self.directives
            .as_deref()
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| EnvFilter::new(self.level.to_string()))
    }
}

/// Install the global subscriber.
///
/// Later calls are no-ops, so tests and embedding code may call it freely.
pub fn init_logging(config: &LogConfig) {
    let filter = config.filter();

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Jsonl => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };
    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
