//! Messages exchanged between players and with the coordinator.
//!
//! Player-bound traffic is the closed [`Message`] sum type. Everything a
//! player sends back to the coordinator is a [`CoordinatorMessage`], wrapped
//! by the transport in a [`PeerReport`] so the coordinator knows who sent it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::commodity::Commodity;
use crate::ids::{MarkerSource, PeerId};

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// The two phases of a coordinator reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResetAction {
    /// Stop reacting to trades; the hand is kept.
    Halt,
    /// Drop the hand and all trading state.
    Clear,
}

impl core::fmt::Display for ResetAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Halt => f.write_str("HALT"),
            Self::Clear => f.write_str("CLEAR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player-bound messages
// ---------------------------------------------------------------------------

/// A message delivered to a player's inbox.
///
/// On the wire the variant is carried in a `kind` field. Kinds this build
/// does not know decode to [`Message::Unknown`] rather than failing, so a
/// player can log and skip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    /// Coordinator reset (halt or clear).
    Reset {
        /// Which reset phase to apply.
        action: ResetAction,
    },
    /// A fresh set of cards from the coordinator.
    NewHand {
        /// Cards to add to the hand.
        cards: Vec<Commodity>,
        /// Size of the trading ring.
        num_players: u32,
    },
    /// Another player offers us a card.
    TenderOffer {
        /// The offered card.
        card: Commodity,
        /// The offering player.
        source: PeerId,
    },
    /// Our earlier offer was accepted; `card` is the payment.
    AcceptOffer {
        /// The card paid in exchange.
        card: Commodity,
        /// The accepting player.
        source: PeerId,
    },
    /// Our earlier offer was rejected; `card` is our card coming back.
    RejectOffer {
        /// The returned card.
        card: Commodity,
        /// The rejecting player.
        source: PeerId,
    },
    /// Chandy-Lamport marker.
    Marker {
        /// Who sent the marker.
        source: MarkerSource,
    },
    /// Any message kind not listed above.
    #[serde(other)]
    Unknown,
}

impl Message {
    /// Short name of the message kind, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "Reset",
            Self::NewHand { .. } => "NewHand",
            Self::TenderOffer { .. } => "TenderOffer",
            Self::AcceptOffer { .. } => "AcceptOffer",
            Self::RejectOffer { .. } => "RejectOffer",
            Self::Marker { .. } => "Marker",
            Self::Unknown => "Unknown",
        }
    }

    /// The card and sender of a trade message, if this is one.
    pub const fn trade(&self) -> Option<(&Commodity, PeerId)> {
        match self {
            Self::TenderOffer { card, source }
            | Self::AcceptOffer { card, source }
            | Self::RejectOffer { card, source } => Some((card, *source)),
            Self::Reset { .. } | Self::NewHand { .. } | Self::Marker { .. } | Self::Unknown => {
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator-bound messages
// ---------------------------------------------------------------------------

/// The holdings one player recorded for one snapshot epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// The reporting player.
    pub player: PeerId,
    /// Epoch number on this player, starting at 0.
    pub epoch: u64,
    /// Recorded card counts: own hand plus cards caught in flight.
    pub holdings: BTreeMap<Commodity, u32>,
}

impl SnapshotReport {
    /// Total number of cards in the report.
    pub fn total_cards(&self) -> u64 {
        self.holdings
            .values()
            .fold(0_u64, |acc, &n| acc.saturating_add(u64::from(n)))
    }
}

/// A message a player sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoordinatorMessage {
    /// Acknowledgement of a reset, echoing the action.
    ResetAck {
        /// The acknowledged reset phase.
        action: ResetAction,
    },
    /// A completed snapshot record.
    Snapshot(SnapshotReport),
}

/// A coordinator-bound message tagged with its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReport {
    /// The player that sent the message.
    pub from: PeerId,
    /// The message body.
    pub message: CoordinatorMessage,
}
