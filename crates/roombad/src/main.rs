//! roombad - Robot Vacuum Accessory Bridge Daemon
//!
//! Exposes a networked robot vacuum to a home-automation frontend and logs
//! the status updates it would deliver there.
//!
//! Usage:
//!   roombad [config.toml]
//!
//! The config file is an `AccessoryConfig` in TOML: connection credentials
//! (`blid`, `robotpwd`, `ipaddress`), the refresh policy flags
//! (`keep_alive_enabled`, `auto_refresh_enabled`), cache/poll intervals,
//! and the transport selection.
//!
//! If no config file is provided, uses the mock transport for demo purposes.

use anyhow::Context;
use roomba_core::VacuumAccessory;
use roomba_local::{AccessoryConfig, Credentials, MockConfig, RoombaAccessory, TransportConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command-line arguments
struct Args {
    /// Accessory config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut result = Args { config_path: None };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"roombad - Robot Vacuum Accessory Bridge Daemon

Usage: roombad [OPTIONS] [config.toml]

Options:
  -h, --help    Print this help message

Examples:
  # Run against a simulated robot
  roombad

  # Run with a config file
  roombad accessory.toml
"#
    );
}

fn load_config(path: &str) -> anyhow::Result<AccessoryConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {path}"))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {path}"))
}

/// Config used when no file is given: a simulated robot with background
/// refresh on a short interval so the demo produces visible updates.
fn demo_config() -> AccessoryConfig {
    AccessoryConfig {
        name: "Demo Vacuum".to_string(),
        model: "980".to_string(),
        credentials: Credentials {
            blid: "demo".to_string(),
            robotpwd: "demo".to_string(),
            ipaddress: "127.0.0.1".to_string(),
        },
        keep_alive_enabled: false,
        auto_refresh_enabled: true,
        cache_ttl_secs: Some(5),
        polling_interval_secs: 10,
        fetch_timeout_secs: 5,
        start_grace_secs: 2,
        dock_poll_interval_secs: 3,
        dock_poll_max_attempts: 100,
        status_wait_interval_ms: 100,
        status_wait_max: 50,
        transport: TransportConfig::Mock(MockConfig { latency_ms: 50 }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roombad=info,roomba_local=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();
    let config = match args.config_path {
        Some(path) => load_config(&path)?,
        None => {
            tracing::info!("No config file provided, using mock transport for demo");
            demo_config()
        }
    };

    tracing::info!(name = %config.name, model = %config.model, "Starting roombad");

    let accessory = RoombaAccessory::from_config(config)?;
    for service in accessory.get_services() {
        tracing::info!(?service, "Exposing service");
    }

    let mut updates = accessory.subscribe_updates();
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(status) => tracing::info!(?status, "Status update"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status update stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
