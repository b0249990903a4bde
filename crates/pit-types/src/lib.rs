//! Shared type definitions for the PIT trading simulation.
//!
//! Every crate in the workspace speaks in these types: player identifiers,
//! commodity cards, the six player-bound message kinds, and what players
//! report back to the coordinator.
//!
//! # Modules
//!
//! - [`ids`] -- Player identifiers and marker sources
//! - [`commodity`] -- Commodity card names
//! - [`messages`] -- Player-bound and coordinator-bound messages
//! - [`wire`] -- JSON framing used by the transport

pub mod commodity;
pub mod ids;
pub mod messages;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use commodity::{Commodity, DEFAULT_COMMODITIES};
pub use ids::{COORDINATOR_SENTINEL, InvalidMarkerSource, MarkerSource, PeerId};
pub use messages::{CoordinatorMessage, Message, PeerReport, ResetAction, SnapshotReport};
pub use wire::WireError;
