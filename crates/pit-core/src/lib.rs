//! Simulation harness for the PIT trading game.
//!
//! Wires the per-player state machines from `pit-player` into a running
//! table: configuration, an in-process transport, one async task per
//! player, and a coordinator that deals, takes snapshots and resets.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `pit-config.yaml` into
//!   strongly-typed structs.
//! - [`conservation`] -- Card conservation check over a collected snapshot.
//! - [`coordinator`] -- [`Coordinator`]: deal, trigger markers, reset,
//!   collect reports.
//! - [`network`] -- [`LocalNetwork`] of mpsc inboxes and the per-player
//!   [`PeerOutbox`].
//! - [`runner`] -- [`run_player`] task loop and [`spawn_players`].

pub mod config;
pub mod conservation;
pub mod coordinator;
pub mod network;
pub mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use conservation::{ConservationResult, SnapshotAnomaly, verify_snapshot};
pub use coordinator::{Coordinator, CoordinatorError, MAX_PENDING_REPORTS};
pub use network::{Inboxes, LocalNetwork, PeerOutbox};
pub use runner::{PlayerTasks, RunnerError, run_player, spawn_players};
