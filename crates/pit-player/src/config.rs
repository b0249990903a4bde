//! Tunables for a single player.
//!
//! The simulation config (`pit-config.yaml`, `trading` section) is mapped
//! onto [`PlayerConfig`] when players are spawned.

use serde::Deserialize;

/// Default cap on trade attempts per player between two clears.
pub const DEFAULT_MAX_TRADES: u64 = 20_000;

/// Default upper bound on the ring size a player will accept.
pub const DEFAULT_MAX_PLAYERS: u32 = 1024;

/// Configuration for one player's trading behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Trade attempts (offers, accepts, rejects) allowed before the player
    /// goes quiet (default: 20000).
    #[serde(default = "default_max_trades")]
    pub max_trades: u64,

    /// Largest ring a player will join, and the bound on player ids it
    /// accepts in markers before its hand arrives (default: 1024).
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_trades: DEFAULT_MAX_TRADES,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

const fn default_max_trades() -> u64 {
    DEFAULT_MAX_TRADES
}

const fn default_max_players() -> u32 {
    DEFAULT_MAX_PLAYERS
}
