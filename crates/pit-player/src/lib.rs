//! Per-player state machines for the PIT trading simulation.
//!
//! This crate is the logic layer of a player: everything that operates on a
//! player's state without touching I/O. Messages come in through
//! [`Player::dispatch`]; replies go out through an [`Outbox`] supplied by the
//! caller.
//!
//! # Modules
//!
//! - [`config`] -- Player tunables ([`PlayerConfig`])
//! - [`error`] -- Handler errors ([`PlayerError`])
//! - [`hand`] -- Cards held and their per-commodity counts ([`Hand`])
//! - [`outbox`] -- The sending half of the channel abstraction ([`Outbox`])
//! - [`player`] -- Player state and the message dispatcher ([`Player`])
//! - [`selection`] -- Card and destination choice for offers ([`Selector`])
//! - [`snapshot`] -- Marker bookkeeping for consistent snapshots
//! - [`trade`] -- Offer, accept, reject and the trade budget

pub mod config;
pub mod error;
pub mod hand;
pub mod outbox;
pub mod player;
pub mod selection;
pub mod snapshot;
pub mod trade;

// Re-export primary types at crate root for convenience.
pub use config::{DEFAULT_MAX_PLAYERS, DEFAULT_MAX_TRADES, PlayerConfig};
pub use error::PlayerError;
pub use hand::Hand;
pub use outbox::{Outbox, RecordingOutbox, TransportError};
pub use player::Player;
pub use selection::{RandomSelector, ScriptedSelector, Selector};
pub use snapshot::SnapshotRecorder;
pub use trade::TradeBudget;
