//! `sa-api`: the survey analytics HTTP service.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sa_api::ApiServer;
use sa_common::{init_logging, load_analytics_config, Dataset, LogConfig, LogFormat, LogLevel};
use tracing::{error, info};

/// Survey analytics API - statistics, charts and hypothesis tests over a CSV dataset
#[derive(Parser, Debug)]
#[command(name = "sa-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SA_API_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p', env = "SA_API_PORT")]
    port: Option<u16>,

    /// CSV dataset to serve
    #[arg(long, env = "SA_DATASET")]
    dataset: Option<PathBuf>,

    /// Allowed CORS origin (repeatable; replaces the configured list)
    #[arg(long = "allow-origin", value_delimiter = ',')]
    allow_origin: Vec<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Log output format (human, jsonl)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn log_level(&self) -> Option<LogLevel> {
        if self.quiet {
            return Some(LogLevel::Error);
        }
        match self.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(cli.log_level(), cli.log_format));

    let (mut config, source) = match load_analytics_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            eprintln!("sa-api: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config = config.with_bind(bind);
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(dataset) = cli.dataset {
        config = config.with_dataset_path(dataset);
    }
    if !cli.allow_origin.is_empty() {
        config = config.with_allowed_origins(cli.allow_origin);
    }
    if let Err(e) = config.validate() {
        eprintln!("sa-api: {}", e);
        return ExitCode::FAILURE;
    }
    info!(%source, addr = %config.addr(), dataset = %config.dataset_path.display(), "configuration resolved");

    let dataset = match Dataset::from_path(&config.dataset_path) {
        Ok(ds) => Arc::new(ds),
        Err(e) => {
            error!(error = %e, "failed to load dataset");
            eprintln!("sa-api: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match ApiServer::start(&config, dataset) {
        Ok(server) => {
            info!(addr = %server.addr(), "listening");
            server.wait();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to start server");
            eprintln!("sa-api: {}", e);
            ExitCode::FAILURE
        }
    }
}
