//! Error types for the pit-player crate.
//!
//! None of these are fatal. The dispatcher logs them with the player's
//! identity and the offending message, then drops the message.

use pit_types::PeerId;

use crate::outbox::TransportError;

/// Errors that can occur while a player handles one message.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// A marker or selection named a player outside the ring.
    #[error("player {peer} is outside the ring of {num_players} players")]
    UnknownPeer {
        /// The out-of-range player.
        peer: PeerId,
        /// Ring size at the time of the check.
        num_players: u32,
    },

    /// A hand announced a ring larger than this player accepts.
    #[error("ring of {num_players} players exceeds the limit of {max_players}")]
    RingTooLarge {
        /// The announced ring size.
        num_players: u32,
        /// The configured limit.
        max_players: u32,
    },

    /// A marker claimed to come from the receiving player itself.
    #[error("received a marker carrying our own id {0}")]
    OwnMarker(PeerId),

    /// The selection strategy returned an index outside the hand.
    #[error("selected card index {index} but the hand holds {len} cards")]
    InvalidCardIndex {
        /// The returned index.
        index: usize,
        /// Current hand size.
        len: usize,
    },

    /// Sending a reply failed.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: TransportError,
    },
}
