//! Climate API - Main Server
//!
//! Opens the climate dataset read-only, derives the "last year" cutoff from
//! the newest measurement, and serves the JSON API.
//!
//! Usage:
//!   cargo run --release                               # climate.toml, port 5000
//!   cargo run --release -- --port 8080                # override the port
//!   cargo run --release -- --config other.toml        # alternate config file
//!
//! Environment:
//!   DATABASE_PATH - path to the SQLite dataset (overrides climate.toml)
//!   CLIMATE_PORT  - listen port (overrides climate.toml)
//!   RUST_LOG      - log filter (default: climate_service=info)
//!
//! All three may also be set in a `.env` file in the working directory.

use climate_service::config::{self, DEFAULT_CONFIG_PATH, DEFAULT_ENV_PATH, ServiceConfig};
use climate_service::db;
use climate_service::endpoint::{self, Endpoint};
use climate_service::error::Result;
use climate_service::service::ClimateService;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line options
#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    port: Option<u16>,
}

fn usage(program: &str) -> String {
    format!("Usage: {} [--config PATH] [--port PORT]", program)
}

fn parse_args(args: &[String]) -> std::result::Result<Args, String> {
    let program = args.first().map(String::as_str).unwrap_or("climate_service");
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("--port requires a port number\n{}", usage(program)))?;
                parsed.port = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid port: {}\n{}", value, usage(program)))?,
                );
                i += 2;
            }
            "--config" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("--config requires a path\n{}", usage(program)))?;
                parsed.config_path = Some(PathBuf::from(value));
                i += 2;
            }
            other => {
                return Err(format!("Unknown argument: {}\n{}", other, usage(program)));
            }
        }
    }

    Ok(parsed)
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("climate_service=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(args: Args) -> Result<()> {
    let config_path = args
        .config_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = ServiceConfig::load_with_env(&config_path)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(config = %config_path.display(), "Configuration loaded");

    let pool = db::connect_and_verify(&config.database)?;
    let service = ClimateService::initialize(pool)?;
    let landing_page = endpoint::load_landing_page(Path::new(&config.server.landing_page));

    endpoint::start_endpoint_server(
        &config.server.bind_address(),
        Endpoint::new(service, landing_page),
        config.server.workers,
    )
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    // RUST_LOG may come from .env, so it has to be loaded before the filter
    let env_loaded = config::load_env_file(Path::new(DEFAULT_ENV_PATH));
    setup_logging();
    info!(env_file = env_loaded, "Climate API starting");

    if let Err(e) = run(args) {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}
