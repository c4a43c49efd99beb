//! herakles-disk-check - version 0.1.0
//!
//! Disk space, inode and I/O latency exporter with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use herakles_disk_check::{detect_source, DiscoverySource, PrometheusSink};
use prometheus::{Gauge, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal, sync::Mutex};
use tracing::{error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_collect, command_config};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use handlers::{config_handler, metrics_handler, root_handler, run_pass};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Self-telemetry gauges registered next to the disk gauges.
fn telemetry_gauges(
    registry: &Registry,
    prefix: &str,
) -> Result<(Gauge, Gauge, Gauge), prometheus::Error> {
    let pass_duration = Gauge::new(
        format!("{}disk_check_pass_duration_seconds", prefix),
        "Duration of the last collection pass in seconds",
    )?;
    let pass_success = Gauge::new(
        format!("{}disk_check_pass_success", prefix),
        "Whether the last collection pass succeeded (1) or failed (0)",
    )?;
    let devices = Gauge::new(
        format!("{}disk_check_devices", prefix),
        "Number of devices reported by the last collection pass",
    )?;

    registry.register(Box::new(pass_duration.clone()))?;
    registry.register(Box::new(pass_success.clone()))?;
    registry.register(Box::new(devices.clone()))?;

    Ok((pass_duration, pass_success, devices))
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        match command {
            Commands::Config {
                output,
                format,
                commented,
            } => return command_config(output.clone(), format.clone(), *commented),

            Commands::CheckRequirements => {
                setup_logging(&args);
                let config = resolve_config(&args)?;

                println!("🔍 Checking Runtime Requirements");
                println!("================================\n");

                match startup_checks::validate_requirements(config.source) {
                    Ok(()) => {
                        println!("\n✅ All requirements met - ready for production!");
                        return Ok(());
                    }
                    Err(e) => {
                        eprintln!("\n❌ Requirements check failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }

            Commands::Collect { iterations, format } => {
                let config = load_validated_config(&args)?;
                return command_collect(*iterations, format.clone(), &config);
            }
        }
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&args);

    info!("Starting herakles-disk-check");

    if let Err(e) = startup_checks::validate_requirements(config.source) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but collection passes will fail!");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let prefix = config.metric_prefix();

    let registry = Registry::new();
    let sink = PrometheusSink::new(&registry, prefix)?;
    let (pass_duration, pass_success, devices) = telemetry_gauges(&registry, prefix)?;

    let source: Arc<dyn DiscoverySource + Send + Sync> = Arc::from(detect_source(config.source));
    info!("Discovery source: {}", source.name());

    let state: SharedState = Arc::new(AppState {
        registry,
        check: config.disk_check()?,
        source,
        sink: Arc::new(Mutex::new(sink)),
        pass_duration,
        pass_success,
        devices,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    // Initial pass so the first scrape is not the first time errors surface
    info!("Performing initial collection pass");
    match run_pass(&state).await {
        Some(summary) => info!(
            "Initial pass completed: {} gauges for {} devices",
            summary.gauges, summary.devices
        ),
        None => warn!("Initial collection pass failed"),
    }

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(
        "herakles-disk-check listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("herakles-disk-check stopped gracefully");
    Ok(())
}
