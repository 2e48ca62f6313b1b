//! `sa-web`: the survey analytics presentation service.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sa_common::{init_logging, load_presentation_config, LogConfig, LogFormat, LogLevel};
use sa_web::WebServer;
use tracing::{error, info};

/// Survey analytics web UI - renders the analytics API into one HTML page
#[derive(Parser, Debug)]
#[command(name = "sa-web")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SA_WEB_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p', env = "SA_WEB_PORT")]
    port: Option<u16>,

    /// Base URL of the analytics service
    #[arg(long, env = "SA_UPSTREAM")]
    upstream: Option<String>,

    /// Directory served under /static/
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Per-call upstream timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

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

    let (mut config, source) = match load_presentation_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            eprintln!("sa-web: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config = config.with_bind(bind);
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(upstream) = cli.upstream {
        config = config.with_upstream(upstream);
    }
    if let Some(dir) = cli.static_dir {
        config = config.with_static_dir(dir);
    }
    if cli.timeout_secs.is_some() {
        config = config.with_timeout_secs(cli.timeout_secs);
    }
    if let Err(e) = config.validate() {
        eprintln!("sa-web: {}", e);
        return ExitCode::FAILURE;
    }
    info!(
        %source,
        addr = %config.addr(),
        upstream = %config.upstream_base_url,
        static_dir = %config.static_dir.display(),
        "configuration resolved"
    );

    match WebServer::start(config) {
        Ok(server) => {
            info!(addr = %server.addr(), "listening");
            server.wait();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to start server");
            eprintln!("sa-web: {}", e);
            ExitCode::FAILURE
        }
    }
}
