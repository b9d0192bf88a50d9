//! Nutriscan — screening service entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Load config
//!   4. Init logger once (CLI `-v` flags > `RUST_LOG` > config)
//!   5. Load the graph and model artifacts (fatal on failure)
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Serve HTTP until shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use nutriscan::error::AppError;
use nutriscan::http::{AppState, HttpServer, build_router};
use nutriscan::runtime::{Component, run_components};
use nutriscan::{config, logger};

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    log_file: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(
        effective_log_level,
        args.log_level.is_some(),
        args.log_file.as_deref().map(std::path::Path::new),
    )?;

    info!(
        service = %config.service_name,
        data_dir = %config.data_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let state = AppState::load(&config)?;

    info!(
        nodes = state.info.graph_nodes,
        edges = state.info.graph_edges,
        backend = %state.classifier.backend_type(),
        "artifacts ready — starting http server"
    );

    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let router = build_router(state, &config.http);
    let components: Vec<Box<dyn Component>> =
        vec![Box::new(HttpServer::new("http", config.http.bind.clone(), router))];

    run_components(components, shutdown.clone()).await?;

    shutdown.cancel();
    Ok(())
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut log_file = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: nutriscan [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("      --log-file <PATH>      Append logs to a file instead of stderr");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "--log-file" => match iter.next() {
                Some(path) => log_file = Some(path),
                None => {
                    eprintln!("error: --log-file requires a path argument");
                    std::process::exit(1);
                }
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a => {
                if let Some(n) = short_verbosity(a) {
                    verbosity = verbosity.saturating_add(n);
                }
            }
        }
    }

    CliArgs {
        log_level: logger::level_from_verbosity(verbosity),
        config_path,
        log_file,
    }
}

/// Count of `v`s in a `-v`, `-vv`, … flag, saturating at `u8::MAX`.
fn short_verbosity(arg: &str) -> Option<u8> {
    let vs = arg.strip_prefix('-')?;
    if vs.is_empty() || !vs.chars().all(|c| c == 'v') {
        return None;
    }
    Some(u8::try_from(vs.len()).unwrap_or(u8::MAX))
}
