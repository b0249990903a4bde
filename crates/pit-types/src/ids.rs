//! Identifiers for players and marker sources.
//!
//! Players are addressed by a stable integer in `0..N`. Markers additionally
//! need a way to say "sent by the coordinator", which on the wire is the
//! sentinel `-1`.

use serde::{Deserialize, Serialize};

/// Wire value used for a marker injected directly by the coordinator.
pub const COORDINATOR_SENTINEL: i64 = -1;

/// Stable identifier of one player in the trading ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u32);

impl PeerId {
    /// Create a player identifier from its number.
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Return the raw player number.
    pub const fn into_inner(self) -> u32 {
        self.0
    }

    /// Position of this player in per-player tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for PeerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PeerId {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

/// Origin of a marker message.
///
/// Serialized as a single integer: the player number, or
/// [`COORDINATOR_SENTINEL`] when the coordinator started the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MarkerSource {
    /// The coordinator asked this player to start a snapshot.
    Coordinator,
    /// Another player forwarded its marker on the channel to us.
    Player(PeerId),
}

impl MarkerSource {
    /// The sending player, or `None` for a coordinator trigger.
    pub const fn player(self) -> Option<PeerId> {
        match self {
            Self::Coordinator => None,
            Self::Player(id) => Some(id),
        }
    }
}

impl core::fmt::Display for MarkerSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Coordinator => write!(f, "coordinator"),
            Self::Player(id) => write!(f, "player{id}"),
        }
    }
}

/// A marker source integer that is neither a player number nor the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid marker source {0}")]
pub struct InvalidMarkerSource(pub i64);

impl TryFrom<i64> for MarkerSource {
    type Error = InvalidMarkerSource;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == COORDINATOR_SENTINEL {
            return Ok(Self::Coordinator);
        }
        u32::try_from(value)
            .map(|n| Self::Player(PeerId(n)))
            .map_err(|_out_of_range| InvalidMarkerSource(value))
    }
}

impl From<MarkerSource> for i64 {
    fn from(source: MarkerSource) -> Self {
        match source {
            MarkerSource::Coordinator => COORDINATOR_SENTINEL,
            MarkerSource::Player(id) => Self::from(id.0),
        }
    }
}
