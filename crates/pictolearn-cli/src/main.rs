//! Pictolearn exercises server
//!
//! Main entry point for serving the exercises API.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pictolearn_exercises::{
    create_router, load_seed_file, seed_store, AppState, Config, ExerciseService, ExerciseStore,
    HttpAuthenticator, InMemoryExerciseStore, MongoExerciseStore,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Pictolearn - Exercises Service
///
/// Serves pictogram exercises to teachers and learners. Teacher identity is
/// checked against the users service.
#[derive(Parser, Debug)]
#[command(name = "pictolearn")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: pictolearn.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, value_name = "ADDR")]
    host: Option<String>,

    /// Port for the HTTP API server
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the users service
    #[arg(long, env = "USERS_SERVICE_URL", value_name = "URL")]
    users_service_url: Option<String>,

    /// MongoDB connection string (exercises are kept in memory without one)
    #[arg(long, env = "MONGO_URI", value_name = "URI")]
    mongo_uri: Option<String>,

    /// JSON file of exercises to load at startup
    #[arg(short, long, value_name = "FILE")]
    seed: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Pictolearn exercises service starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, seeds the catalog and serves the API until Ctrl+C.
async fn run_server(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.users_service_url {
        config.users_service_url = url;
    }
    if let Some(uri) = args.mongo_uri {
        config.mongo_uri = Some(uri);
    }
    if let Some(seed) = args.seed {
        config.seed_file = Some(seed);
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let store = open_store(&config).await?;
    if let Some(ref seed_file) = config.seed_file {
        tracing::info!(seed_file = %seed_file, "Loading seed exercises");
        let exercises = load_seed_file(seed_file)?;
        let count = seed_store(store.as_ref(), exercises).await?;
        println!("Seeded {count} exercises from {seed_file}");
    }

    let authenticator = Arc::new(HttpAuthenticator::from_config(&config)?);
    let service = ExerciseService::new(store, authenticator);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!(
                "Invalid bind address '{}:{}': {e}\n\nSuggestion: Use an IP address for --host",
                config.host,
                config.port
            )
        })?;

    let router = create_router(AppState::new(config, service));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the configured exercise store.
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn ExerciseStore>> {
    match config.mongo_uri {
        Some(ref uri) => {
            let store = MongoExerciseStore::connect(uri, &config.mongo_database)
                .await
                .map_err(|e| {
                    anyhow::anyhow!(
                        "{e}\n\nSuggestion: Check that MongoDB is running and --mongo-uri is correct"
                    )
                })?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No mongoUri configured, exercises will be lost on restart");
            Ok(Arc::new(InMemoryExerciseStore::new()))
        }
    }
}

/// Resolves when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Listen address: {}:{}", config.host, config.port);
    println!("  Check-login URL: {}", config.check_login_url());
    println!("  Auth timeout: {}s", config.auth_timeout_seconds);
    println!("  Default language: {}", config.default_language);
    if let Some(ref seed_file) = config.seed_file {
        println!("  Seed file: {seed_file}");
    }
    if config.mongo_uri.is_some() {
        println!("  Store: MongoDB database '{}'", config.mongo_database);
    } else {
        println!("  Store: in memory");
    }
}
