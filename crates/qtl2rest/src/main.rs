//! qtl2rest - entry point
//!
//! Loads configuration, initializes logging, loads the dataset snapshot and
//! serves the API until SIGTERM or SIGINT.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use qtl2rest::config::{ConfigLoader, Qtl2RestConfig};
use qtl2rest::server::Server;
use qtl2rest::telemetry::{init_logging, LogConfig};

const ENV_PREFIX: &str = "QTL2REST";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("qtl2rest {}", qtl2rest::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"qtl2rest - read-only HTTP API over a QTL genetic-analysis store

USAGE:
    qtl2rest [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    QTL2REST__SERVER__HTTP_ADDR            Listen address (default: 0.0.0.0:8001)
    QTL2REST__SERVER__WORKERS              Runtime worker threads (default: 0, tokio default)
    QTL2REST__SERVER__REQUEST_TIMEOUT_MS   Per-request timeout, 0 disables (default: 0)
    QTL2REST__LOGGING__LEVEL               Log level (default: info)
    QTL2REST__LOGGING__FORMAT              pipe, json or pretty (default: pipe)
    QTL2REST__COMPRESSION__ENABLED         Gzip responses on request (default: true)
    QTL2REST__DATA__SNAPSHOT_PATH          Dataset snapshot (JSON)

    A .env file in the working directory is read first.

EXAMPLES:
    qtl2rest --config /etc/qtl2rest/qtl2rest.toml
    QTL2REST__DATA__SNAPSHOT_PATH=data/snapshot.json qtl2rest
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<Qtl2RestConfig> {
    let mut loader = ConfigLoader::new().with_defaults().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }
    Ok(loader.with_env_prefix(ENV_PREFIX).load()?)
}

fn build_runtime(workers: usize) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if workers > 0 {
        builder.worker_threads(workers);
    }
    builder.enable_all().build()
}

fn run(config: &Qtl2RestConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let backend = qtl2rest::load_backend(config).context("failed to load dataset snapshot")?;
    info!("Registered {} datasets", backend.dataset_count());

    let app = qtl2rest::build_app(Arc::new(backend), config)?;
    let server = Server::builder(app)
        .request_timeout(config.request_timeout())
        .shutdown_timeout(config.shutdown_timeout())
        .build();

    let runtime = build_runtime(config.server.workers).context("failed to start runtime")?;
    info!("Starting qtl2rest v{} on {}", qtl2rest::VERSION, addr);
    runtime.block_on(server.run(addr))?;
    info!("Server stopped");
    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            if init_logging(&LogConfig::default()).is_err() {
                eprintln!("Failed to load configuration: {e:#}");
            }
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
