use std::path::{Path, PathBuf};

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use pet_ledger::config::{ConfigOverrides, ServerConfig};
use pet_ledger::{AppState, Ledger, create_router};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Path to a YAML or JSON configuration file")]
    config: Option<String>,
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "Keep JSON files in this directory")]
    data_dir: Option<String>,
    #[arrrg(optional, "Store documents in this PostgreSQL database")]
    database_url: Option<String>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"pet-ledgerd - Pet Ledger server

USAGE:
    pet-ledgerd [OPTIONS]

OPTIONS:
    --config <PATH>          YAML or JSON configuration file
    --host <HOST>            Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>            Port to bind the HTTP server [default: 8080]
    --data-dir <PATH>        Keep JSON files in this directory [default: data]
    --database-url <URL>     Store documents in PostgreSQL instead of JSON files
    --verbose                Enable verbose logging

DESCRIPTION:
    Serves animal records, timelines, settings, and dashboard statistics
    under /api/v1/. Every request except /api/v1/health needs an
    `Authorization: Bearer <token>` header.

    The server supports graceful shutdown via Ctrl+C."#;

fn print_api_endpoints() {
    println!();
    println!("📋 Available API endpoints:");
    println!();
    println!("  Animals:");
    println!("    GET    /api/v1/animal                    List animals (search, species, status)");
    println!("    POST   /api/v1/animal                    Create an animal");
    println!("    GET    /api/v1/animal/{{id}}               Get an animal");
    println!("    PUT    /api/v1/animal/{{id}}               Update an animal");
    println!("    DELETE /api/v1/animal/{{id}}               Delete an animal");
    println!("    POST   /api/v1/animal/{{id}}/weight        Record a weight");
    println!("    POST   /api/v1/animal/{{id}}/height        Record a height");
    println!();
    println!("  Timeline:");
    println!("    GET    /api/v1/animal/{{id}}/event         List events (type)");
    println!("    POST   /api/v1/animal/{{id}}/event         Add an event");
    println!("    PUT    /api/v1/animal/{{id}}/event/{{eid}}   Update an event");
    println!("    DELETE /api/v1/animal/{{id}}/event/{{eid}}   Delete an event");
    println!();
    println!("  Settings:");
    println!("    GET    /api/v1/settings                  Get settings");
    println!("    PUT    /api/v1/settings                  Update settings");
    println!("    DELETE /api/v1/settings                  Reset settings");
    println!("    GET    /api/v1/settings/currencies       List currencies");
    println!();
    println!("  Dashboard:");
    println!("    GET    /api/v1/stats                     Dashboard statistics");
    println!("    GET    /api/v1/health                    Liveness check");
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: pet-ledgerd [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ServerConfig::load(Path::new(path))?,
        None => ServerConfig::default(),
    };
    let config = config.with_overrides(ConfigOverrides {
        host: args.host,
        port: args.port,
        data_dir: args.data_dir.map(PathBuf::from),
        database_url: args.database_url,
    });

    let store = config.build_store().await?;
    let state = AppState::new(Ledger::new(store), config.build_authenticator());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("🚀 Pet Ledger server started successfully!");
    println!("📡 Server listening on: http://{}", addr);
    println!("💾 Storage: {}", config.storage);
    tracing::info!(%addr, storage = %config.storage, "listening");

    if args.verbose {
        print_api_endpoints();
    }

    println!("💡 Use Ctrl+C for graceful shutdown");
    println!();

    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("server error: {}", e);
                eprintln!("❌ Server error: {}", e);
                std::process::exit(1);
            }
        }
        () = shutdown_signal => {
            println!();
            println!("🛑 Shutdown signal received, stopping server gracefully...");
            tracing::info!("shutdown requested");
            println!("👋 Pet Ledger server stopped");
        }
    }

    Ok(())
}
