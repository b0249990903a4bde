//! In-process transport between players and the coordinator.
//!
//! Every participant owns one unbounded mpsc inbox of encoded frames.
//! [`LocalNetwork`] holds the sending halves and is cheap to clone; each
//! player gets a [`PeerOutbox`] over its own clone. Sends never block.
//!
//! A single mpsc queue delivers the messages of any one sender in the order
//! they were sent, so every player-to-player channel is FIFO.

use pit_player::{Outbox, TransportError};
use pit_types::{CoordinatorMessage, Message, PeerId, PeerReport, wire};
use tokio::sync::mpsc;

/// One encoded message.
pub type Frame = Vec<u8>;

/// The receiving half of an inbox.
pub type Inbox = mpsc::UnboundedReceiver<Frame>;

/// Sending halves of every inbox in the simulation.
#[derive(Debug, Clone)]
pub struct LocalNetwork {
    players: Vec<mpsc::UnboundedSender<Frame>>,
    coordinator: mpsc::UnboundedSender<Frame>,
}

/// The receiving halves created alongside a [`LocalNetwork`].
#[derive(Debug)]
pub struct Inboxes {
    /// One inbox per player, indexed by player id.
    pub players: Vec<Inbox>,
    /// The coordinator's inbox.
    pub coordinator: Inbox,
}

impl LocalNetwork {
    /// Create inboxes for `num_players` players and the coordinator.
    pub fn new(num_players: u32) -> (Self, Inboxes) {
        let (players, player_inboxes): (Vec<_>, Vec<_>) =
            (0..num_players).map(|_| mpsc::unbounded_channel()).unzip();
        let (coordinator, coordinator_inbox) = mpsc::unbounded_channel();
        (
            Self {
                players,
                coordinator,
            },
            Inboxes {
                players: player_inboxes,
                coordinator: coordinator_inbox,
            },
        )
    }

    /// Number of player inboxes.
    pub fn num_players(&self) -> u32 {
        u32::try_from(self.players.len()).unwrap_or(u32::MAX)
    }

    /// Encode `message` and queue it for player `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unreachable`] if `to` has no inbox or the
    /// inbox has been dropped, or [`TransportError::Wire`] if encoding fails.
    pub fn send_to_player(&self, to: PeerId, message: &Message) -> Result<(), TransportError> {
        let frame = wire::encode(message)?;
        let no_route = || TransportError::Unreachable {
            destination: format!("player{to}"),
        };
        self.players
            .get(to.index())
            .ok_or_else(no_route)?
            .send(frame)
            .map_err(|_closed| no_route())
    }

    /// Encode `report` and queue it for the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unreachable`] if the coordinator inbox has
    /// been dropped, or [`TransportError::Wire`] if encoding fails.
    pub fn send_to_coordinator(&self, report: &PeerReport) -> Result<(), TransportError> {
        let frame = wire::encode(report)?;
        self.coordinator
            .send(frame)
            .map_err(|_closed| TransportError::Unreachable {
                destination: String::from("coordinator"),
            })
    }

    /// An outbox that sends on behalf of player `me`.
    pub fn outbox(&self, me: PeerId) -> PeerOutbox {
        PeerOutbox {
            me,
            network: self.clone(),
        }
    }
}

/// [`Outbox`] for one player over a [`LocalNetwork`].
///
/// Coordinator-bound messages are stamped with the sender's id.
#[derive(Debug, Clone)]
pub struct PeerOutbox {
    me: PeerId,
    network: LocalNetwork,
}

impl PeerOutbox {
    /// The player this outbox sends for.
    pub const fn owner(&self) -> PeerId {
        self.me
    }
}

impl Outbox for PeerOutbox {
    fn send_to_player(&mut self, to: PeerId, message: &Message) -> Result<(), TransportError> {
        self.network.send_to_player(to, message)
    }

    fn send_to_coordinator(&mut self, message: &CoordinatorMessage) -> Result<(), TransportError> {
        self.network.send_to_coordinator(&PeerReport {
            from: self.me,
            message: message.clone(),
        })
    }
}
