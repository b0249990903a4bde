//! The player process: one owned state struct behind a serial dispatcher.
//!
//! [`Player::dispatch`] is the only entry point. It handles one message to
//! completion before the caller hands it the next, so all state below is
//! single-writer. Handler errors stop at this boundary: they are logged with
//! the player's id and the message, and the message is dropped.

use pit_types::{CoordinatorMessage, Message, PeerId, ResetAction};
use tracing::{info, warn};

use crate::config::PlayerConfig;
use crate::error::PlayerError;
use crate::hand::Hand;
use crate::outbox::Outbox;
use crate::selection::Selector;
use crate::snapshot::SnapshotRecorder;
use crate::trade::TradeBudget;

/// All mutable state of one player.
pub struct Player {
    pub(crate) id: PeerId,
    pub(crate) hand: Hand,
    pub(crate) budget: TradeBudget,
    /// Ring size, 0 until the first hand arrives.
    pub(crate) num_players: u32,
    /// Upper bound on `num_players` and on ids seen before it is known.
    pub(crate) max_players: u32,
    pub(crate) halted: bool,
    pub(crate) snapshot: SnapshotRecorder,
    pub(crate) selector: Box<dyn Selector>,
}

impl Player {
    /// Create a player with no hand.
    pub fn new(id: PeerId, config: &PlayerConfig, selector: Box<dyn Selector>) -> Self {
        Self {
            id,
            hand: Hand::new(),
            budget: TradeBudget::new(config.max_trades),
            num_players: 0,
            max_players: config.max_players,
            halted: false,
            snapshot: SnapshotRecorder::new(),
            selector,
        }
    }

    /// This player's identifier.
    pub const fn id(&self) -> PeerId {
        self.id
    }

    /// The cards currently held.
    pub const fn hand(&self) -> &Hand {
        &self.hand
    }

    /// Ring size learned from the last hand, or 0.
    pub const fn num_players(&self) -> u32 {
        self.num_players
    }

    /// Whether a HALT is in effect.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Trade attempts made since the last CLEAR.
    pub const fn trade_attempts(&self) -> u64 {
        self.budget.attempts()
    }

    /// Snapshot bookkeeping for the current epoch.
    pub const fn snapshot(&self) -> &SnapshotRecorder {
        &self.snapshot
    }

    /// Handle one inbound message.
    ///
    /// Never fails: errors are logged and the message is dropped.
    pub fn dispatch(&mut self, message: Message, outbox: &mut dyn Outbox) {
        if let Err(e) = self.handle(&message, outbox) {
            warn!(
                player = %self.id,
                kind = message.kind(),
                message = ?message,
                error = %e,
                "handler failed, message dropped"
            );
        }
    }

    fn handle(&mut self, message: &Message, outbox: &mut dyn Outbox) -> Result<(), PlayerError> {
        match message {
            Message::Reset { action } => self.on_reset(*action, outbox),
            Message::NewHand { cards, num_players } => {
                self.on_new_hand(cards, *num_players, outbox)
            }
            Message::TenderOffer { card, source } => self.on_tender_offer(card, *source, outbox),
            Message::AcceptOffer { card, source } => self.on_accept_offer(card, *source, outbox),
            Message::RejectOffer { card, source } => self.on_reject_offer(card, *source, outbox),
            Message::Marker { source } => self.on_marker(*source, outbox),
            Message::Unknown => {
                info!(player = %self.id, "received unknown message kind, ignoring");
                Ok(())
            }
        }
    }

    fn on_reset(
        &mut self,
        action: ResetAction,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        match action {
            ResetAction::Halt => {
                self.halted = true;
            }
            ResetAction::Clear => {
                self.hand.clear();
                self.budget.reset();
                self.num_players = 0;
                self.halted = false;
                // Epoch bookkeeping is left alone; see the snapshot module.
            }
        }
        info!(player = %self.id, action = %action, "reset");
        outbox.send_to_coordinator(&CoordinatorMessage::ResetAck { action })?;
        Ok(())
    }
}

impl core::fmt::Debug for Player {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("hand", &self.hand)
            .field("budget", &self.budget)
            .field("num_players", &self.num_players)
            .field("max_players", &self.max_players)
            .field("halted", &self.halted)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pit_types::{Commodity, MarkerSource};

    use super::*;
    use crate::outbox::{RecordingOutbox, TransportError};
    use crate::selection::ScriptedSelector;

    fn player(id: u32) -> Player {
        Player::new(
            PeerId(id),
            &PlayerConfig::default(),
            Box::new(ScriptedSelector::default()),
        )
    }

    fn deal(p: &mut Player, out: &mut dyn Outbox) {
        p.dispatch(
            Message::NewHand {
                cards: ["Corn", "Corn", "Rye", "Oats"]
                    .iter()
                    .map(|n| Commodity::from(*n))
                    .collect(),
                num_players: 4,
            },
            out,
        );
    }

    #[test]
    fn halt_is_acknowledged_and_keeps_the_hand() {
        let mut p = player(0);
        let mut out = RecordingOutbox::new();
        deal(&mut p, &mut out);
        let held = p.hand().len();

        p.dispatch(
            Message::Reset {
                action: ResetAction::Halt,
            },
            &mut out,
        );

        assert!(p.is_halted());
        assert_eq!(p.hand().len(), held);
        assert_eq!(
            out.to_coordinator,
            vec![CoordinatorMessage::ResetAck {
                action: ResetAction::Halt
            }]
        );
    }

    #[test]
    fn clear_resets_from_any_state() {
        let mut p = player(1);
        let mut out = RecordingOutbox::new();
        deal(&mut p, &mut out);
        p.dispatch(
            Message::Reset {
                action: ResetAction::Halt,
            },
            &mut out,
        );

        for _ in 0..2 {
            p.dispatch(
                Message::Reset {
                    action: ResetAction::Clear,
                },
                &mut out,
            );
            assert!(p.hand().is_empty());
            assert!(p.hand().counts().is_empty());
            assert_eq!(p.trade_attempts(), 0);
            assert_eq!(p.num_players(), 0);
            assert!(!p.is_halted());
        }
        assert_eq!(out.to_coordinator.len(), 3);
    }

    #[test]
    fn clear_leaves_a_running_epoch_in_place() {
        let mut p = player(2);
        let mut out = RecordingOutbox::new();
        deal(&mut p, &mut out);
        p.dispatch(
            Message::Marker {
                source: MarkerSource::Coordinator,
            },
            &mut out,
        );
        p.dispatch(
            Message::Reset {
                action: ResetAction::Clear,
            },
            &mut out,
        );
        assert!(p.snapshot().is_recording());
    }

    #[test]
    fn unknown_message_changes_nothing() {
        let mut p = player(0);
        let mut out = RecordingOutbox::new();
        deal(&mut p, &mut out);
        out.clear();
        let before = p.hand().clone();

        p.dispatch(Message::Unknown, &mut out);

        assert_eq!(*p.hand(), before);
        assert!(out.to_players.is_empty());
        assert!(out.to_coordinator.is_empty());
    }

    /// Outbox whose every send fails.
    struct BrokenOutbox;

    impl Outbox for BrokenOutbox {
        fn send_to_player(&mut self, to: PeerId, _: &Message) -> Result<(), TransportError> {
            Err(TransportError::Unreachable {
                destination: format!("player{to}"),
            })
        }

        fn send_to_coordinator(&mut self, _: &CoordinatorMessage) -> Result<(), TransportError> {
            Err(TransportError::Unreachable {
                destination: String::from("coordinator"),
            })
        }
    }

    #[test]
    fn transport_failure_is_contained() {
        let mut p = player(3);
        let mut broken = BrokenOutbox;
        deal(&mut p, &mut broken);
        p.dispatch(
            Message::Reset {
                action: ResetAction::Halt,
            },
            &mut broken,
        );

        // State changes made before the failed send stick; the player keeps
        // serving afterwards.
        assert!(p.is_halted());
        assert_eq!(p.num_players(), 4);

        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::Reset {
                action: ResetAction::Clear,
            },
            &mut out,
        );
        assert_eq!(out.to_coordinator.len(), 1);
    }
}
