//! Bridge - protocol version translator
//!
//! Reads tagged packet payloads from stdin, one per line, and writes the
//! translated packets to stdout. Logs go to stderr.
//!
//! Usage: `bridge [config-file]`

mod relay;

use anyhow::Context;
use bridge_config::BridgeConfig;
use bridge_engine::ProtocolManager;
use relay::{parse_line, Relay};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn load_config() -> BridgeConfig {
    let result = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}...", path);
            BridgeConfig::load_from_file(&path)
        }
        None => {
            info!("Loading configuration from {}...", bridge_config::DEFAULT_CONFIG_PATH);
            BridgeConfig::load_default()
        }
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}", e);
            warn!("Using default configuration");
            BridgeConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Bridge starting up...");
    let config = load_config();
    config.display();

    let manager = ProtocolManager::from_config(&config).context("failed to load protocols")?;
    info!(
        "Supported versions: {}",
        manager
            .supported_versions()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut relay = Relay::new(&manager, &config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = parse_line(&line).and_then(|(direction, raw)| relay.handle(direction, raw, Instant::now()));
        match result {
            Ok(outputs) => {
                let disconnect = outputs.iter().any(|output| matches!(output, relay::Line::Disconnect(_)));
                for output in outputs {
                    stdout.write_all(output.render().as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                }
                stdout.flush().await?;
                if disconnect {
                    info!("Connection closed by the translator");
                    break;
                }
            }
            Err(e) => {
                error!("Connection failed: {:#}", e);
                stdout.write_all(format!("disconnect {}\n", e).as_bytes()).await?;
                stdout.flush().await?;
                break;
            }
        }
    }

    info!("Bridge shutting down");
    Ok(())
}
