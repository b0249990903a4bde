//! The sending half of the channel abstraction.
//!
//! A player never knows how its messages travel. It hands them to an
//! [`Outbox`], addressed either to another player by number or to the
//! coordinator. Sends are fire-and-forget: an `Ok` means the message was
//! handed to the transport, not that it arrived.

use pit_types::{CoordinatorMessage, Message, PeerId, WireError};

/// Errors that can occur while handing a message to the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The destination has no live inbox.
    #[error("no route to {destination}")]
    Unreachable {
        /// Human-readable destination, e.g. `player3` or `coordinator`.
        destination: String,
    },

    /// The message could not be framed.
    #[error("wire error: {source}")]
    Wire {
        /// The underlying framing error.
        #[from]
        source: WireError,
    },
}

/// Where a player's outbound messages go.
pub trait Outbox {
    /// Send a message to another player.
    fn send_to_player(&mut self, to: PeerId, message: &Message) -> Result<(), TransportError>;

    /// Send a message to the coordinator.
    fn send_to_coordinator(&mut self, message: &CoordinatorMessage) -> Result<(), TransportError>;
}

/// An outbox that keeps everything it is given, in order.
///
/// Useful wherever the caller wants to inspect a player's output instead of
/// delivering it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingOutbox {
    /// Messages sent to players, with their destination.
    pub to_players: Vec<(PeerId, Message)>,
    /// Messages sent to the coordinator.
    pub to_coordinator: Vec<CoordinatorMessage>,
}

impl RecordingOutbox {
    /// Create an empty outbox.
    pub const fn new() -> Self {
        Self {
            to_players: Vec::new(),
            to_coordinator: Vec::new(),
        }
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.to_players.clear();
        self.to_coordinator.clear();
    }
}

impl Outbox for RecordingOutbox {
    fn send_to_player(&mut self, to: PeerId, message: &Message) -> Result<(), TransportError> {
        self.to_players.push((to, message.clone()));
        Ok(())
    }

    fn send_to_coordinator(&mut self, message: &CoordinatorMessage) -> Result<(), TransportError> {
        self.to_coordinator.push(message.clone());
        Ok(())
    }
}
