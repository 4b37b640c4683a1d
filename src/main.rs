//! Browser GBA launcher server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  ROM LAUNCHER                     │
//!                     │                                                   │
//!   Browser           │  ┌──────────┐   ┌───────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│  http    │──▶│ security  │──▶│  handlers   │  │
//!                     │  │ server   │   │rate limit │   │             │  │
//!                     │  └────┬─────┘   └───────────┘   └──┬───────┬──┘  │
//!                     │       │                            │       │     │
//!                     │       ▼                            ▼       ▼     │
//!                     │  ┌──────────┐              ┌────────┐ ┌───────┐  │
//!                     │  │  assets  │              │  roms  │ │ store │  │
//!                     │  │ ServeDir │              │validate│ │SQLite │  │
//!                     │  └──────────┘              │ + list │ └───────┘  │
//!                     │                            └────────┘            │
//!                     │  ┌────────────────────────────────────────────┐  │
//!                     │  │ config · observability · lifecycle · audit │  │
//!                     │  └────────────────────────────────────────────┘  │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rom_launcher::config::load_config;
use rom_launcher::http::HttpServer;
use rom_launcher::lifecycle::{signals, startup, Shutdown};
use rom_launcher::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rom-launcher")]
#[command(about = "Serve GBA ROMs to a browser emulator and log plays", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability, config.is_production());
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rom-launcher starting");
    tracing::info!(
        environment = %config.server.environment,
        roms_dir = %config.paths.roms_dir.display(),
        db_path = %config.paths.db_path.display(),
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let bind_address = config.server.bind_address();
    let state = startup::bootstrap(config)?;
    let events = state.events.clone();

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(state);
    let result = server.run(listener, server_shutdown).await;

    match events.close().await {
        Ok(()) => tracing::info!("Event store closed"),
        Err(e) => tracing::error!(error = %e, "Failed to close event store"),
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
