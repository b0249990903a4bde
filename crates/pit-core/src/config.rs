//! Configuration loading and typed config structures for the PIT simulation.
//!
//! The canonical configuration lives in `pit-config.yaml` at the project
//! root. Every section and field is optional; anything left out takes the
//! default shown on the field. [`SimulationConfig::validate`] rejects
//! settings under which no game can be dealt.

use std::path::Path;

use pit_player::PlayerConfig;
use pit_types::{Commodity, DEFAULT_COMMODITIES};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unplayable game.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `pit-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Table setup: players, commodities, deck size, seed.
    #[serde(default)]
    pub game: GameConfig,

    /// Per-player trading limits.
    #[serde(default)]
    pub trading: PlayerConfig,

    /// Snapshot rounds driven by the engine.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a game can be dealt from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero players, an empty
    /// commodity list, or zero cards per commodity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.players == 0 {
            return Err(invalid("game.players must be at least 1"));
        }
        if self.game.commodities.is_empty() {
            return Err(invalid("game.commodities must not be empty"));
        }
        if self.game.cards_per_commodity == 0 {
            return Err(invalid("game.cards_per_commodity must be at least 1"));
        }
        if self.game.players > self.trading.max_players {
            return Err(invalid("game.players must not exceed trading.max_players"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Table setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Number of players in the ring (default: 5).
    #[serde(default = "default_players")]
    pub players: u32,

    /// Commodities in the deck (default: Barley, Corn, Oats, Rye, Wheat).
    #[serde(default = "default_commodities")]
    pub commodities: Vec<Commodity>,

    /// Copies of each commodity in the deck (default: 9).
    #[serde(default = "default_cards_per_commodity")]
    pub cards_per_commodity: u32,

    /// Seed for the shuffle and for each player's offer selection
    /// (default: 42).
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            commodities: default_commodities(),
            cards_per_commodity: default_cards_per_commodity(),
            seed: default_seed(),
        }
    }
}

/// Snapshot rounds run by the engine after dealing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotConfig {
    /// How many snapshots to take (default: 3).
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Pause between the end of one snapshot and the next trigger, in
    /// milliseconds (default: 50).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// How long the coordinator waits for reports or acks, in
    /// milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_players() -> u32 {
    5
}

fn default_commodities() -> Vec<Commodity> {
    DEFAULT_COMMODITIES.iter().map(|c| Commodity::from(*c)).collect()
}

const fn default_cards_per_commodity() -> u32 {
    9
}

const fn default_seed() -> u64 {
    42
}

const fn default_rounds() -> u32 {
    3
}

const fn default_interval_ms() -> u64 {
    50
}

const fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.game.players, 5);
        assert_eq!(config.game.commodities.len(), 5);
        assert_eq!(config.game.cards_per_commodity, 9);
        assert_eq!(config.game.seed, 42);
        assert_eq!(config.trading.max_trades, 20_000);
        assert_eq!(config.snapshot.rounds, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
game:
  players: 3
  commodities: [Coffee, Sugar, Cocoa]
  cards_per_commodity: 4
  seed: 7

trading:
  max_trades: 500

snapshot:
  rounds: 10
  interval_ms: 5
  timeout_ms: 1000

logging:
  level: debug
  format: json
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.game.players, 3);
        assert_eq!(
            config.game.commodities,
            vec![
                Commodity::from("Coffee"),
                Commodity::from("Sugar"),
                Commodity::from("Cocoa")
            ]
        );
        assert_eq!(config.game.cards_per_commodity, 4);
        assert_eq!(config.game.seed, 7);
        assert_eq!(config.trading.max_trades, 500);
        assert_eq!(config.snapshot.rounds, 10);
        assert_eq!(config.snapshot.interval_ms, 5);
        assert_eq!(config.snapshot.timeout_ms, 1000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_partial_yaml_uses_defaults() {
        let config = SimulationConfig::parse("game:\n  players: 4\n").unwrap();
        assert_eq!(config.game.players, 4);
        assert_eq!(config.game.cards_per_commodity, 9);
        assert_eq!(config.trading, PlayerConfig::default());
        assert_eq!(config.snapshot, SnapshotConfig::default());
    }

    #[test]
    fn parse_empty_document_gives_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn zero_players_rejected() {
        let err = SimulationConfig::parse("game:\n  players: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn empty_commodities_rejected() {
        let err = SimulationConfig::parse("game:\n  commodities: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_cards_rejected() {
        let err = SimulationConfig::parse("game:\n  cards_per_commodity: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn ring_larger_than_max_players_rejected() {
        let yaml = "game:\n  players: 6\ntrading:\n  max_players: 5\n";
        let err = SimulationConfig::parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = SimulationConfig::parse("game: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/pit-config.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
