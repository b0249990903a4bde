//! Engine binary for the PIT trading simulation.
//!
//! Sets up one table of players on the in-process network, deals a hand to
//! each, and takes a series of consistent snapshots while they trade. Every
//! snapshot is checked for card conservation. The session ends with HALT and
//! CLEAR for all players.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `pit-config.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Create the network and spawn one task per player
//! 4. Deal
//! 5. Run the snapshot rounds
//! 6. HALT, CLEAR, and stop the player tasks

mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use pit_core::config::{LogFormat, LoggingConfig, SimulationConfig};
use pit_core::{ConservationResult, Coordinator, LocalNetwork, spawn_players, verify_snapshot};
use pit_types::{PeerId, ResetAction};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "pit-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or the session fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("pit-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        players = config.game.players,
        commodities = config.game.commodities.len(),
        cards_per_commodity = config.game.cards_per_commodity,
        seed = config.game.seed,
        max_trades = config.trading.max_trades,
        rounds = config.snapshot.rounds,
        "Session configured"
    );

    run_session(&config).await?;

    info!("pit-engine shutdown complete");
    Ok(())
}

/// Play one full session against `config`.
async fn run_session(config: &SimulationConfig) -> Result<(), EngineError> {
    // 3. Network and players.
    let (network, inboxes) = LocalNetwork::new(config.game.players);
    let tasks = spawn_players(
        &network,
        inboxes.players,
        &config.trading,
        config.game.seed,
    );
    let mut coordinator = Coordinator::new(
        network,
        inboxes.coordinator,
        Duration::from_millis(config.snapshot.timeout_ms),
    );
    info!(players = tasks.len(), "Player tasks spawned");

    // 4. Deal.
    coordinator.deal(&config.game)?;

    // 5. Snapshots, each started by the next player in turn.
    let interval = Duration::from_millis(config.snapshot.interval_ms);
    let mut anomalies = 0_u32;
    for (round, initiator) in (0..config.snapshot.rounds).zip((0..config.game.players).cycle()) {
        tokio::time::sleep(interval).await;
        coordinator.trigger_snapshot(PeerId(initiator))?;
        let reports = coordinator.collect_epoch().await?;

        match verify_snapshot(&reports, coordinator.dealt()) {
            ConservationResult::Balanced => {
                info!(round, initiator, "Snapshot balanced");
            }
            ConservationResult::Anomaly(anomaly) => {
                anomalies = anomalies.saturating_add(1);
                warn!(
                    round,
                    initiator,
                    imbalances = ?anomaly.imbalances,
                    duplicates = ?anomaly.duplicate_reports,
                    "{}",
                    anomaly.message
                );
            }
        }
    }

    // 6. Wind down.
    coordinator.reset_all(ResetAction::Halt).await?;
    coordinator.reset_all(ResetAction::Clear).await?;
    let players = tasks.shutdown().await?;

    info!(
        rounds = config.snapshot.rounds,
        anomalies,
        players = players.len(),
        "Session finished"
    );
    Ok(())
}

/// Load the simulation configuration from `path`.
///
/// A missing file is not an error: defaults are used and the second value
/// of the pair is `false`.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_env| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
