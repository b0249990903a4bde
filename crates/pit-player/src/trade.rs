//! Trading protocol for a single player.
//!
//! Implements the three-message handshake:
//!
//! 1. `tender` -- offer a random card to a random other player.
//! 2. On a received offer, accept it if it is the commodity we already hold
//!    the most of, paying with one card of the commodity we hold the least;
//!    otherwise reject it and send the card back.
//! 3. On an accept or reject coming back, take the card and tender again.
//!
//! # Trade budget
//!
//! Every outbound attempt (tender, accept-reply, reject-reply) first checks
//! the budget and then consumes one slot, whether or not the check passed.
//! Once the cap is reached all three become no-ops. The attempt counter is
//! only reset by a CLEAR.

use pit_types::{Commodity, Message, PeerId};
use tracing::{debug, info, trace};

use crate::error::PlayerError;
use crate::outbox::Outbox;
use crate::player::Player;

/// Attempt counter with a cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeBudget {
    attempts: u64,
    cap: u64,
}

impl TradeBudget {
    /// Create a budget allowing `cap` attempts.
    pub const fn new(cap: u64) -> Self {
        Self { attempts: 0, cap }
    }

    /// Check the cap and consume one slot.
    ///
    /// Returns `true` if the attempt may proceed. The counter advances
    /// either way.
    pub fn try_spend(&mut self) -> bool {
        let allowed = self.attempts < self.cap;
        self.attempts = self.attempts.saturating_add(1);
        allowed
    }

    /// Attempts made so far.
    pub const fn attempts(&self) -> u64 {
        self.attempts
    }

    /// The configured cap.
    pub const fn cap(&self) -> u64 {
        self.cap
    }

    /// Whether further attempts will be refused.
    pub const fn is_exhausted(&self) -> bool {
        self.attempts >= self.cap
    }

    /// Start counting from zero again.
    pub const fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Player {
    /// Check and consume one budget slot, logging progress periodically.
    fn spend_trade(&mut self) -> bool {
        if self.budget.attempts().checked_rem(100) == Some(0) {
            debug!(
                player = %self.id,
                attempts = self.budget.attempts(),
                cap = self.budget.cap(),
                "trade budget progress"
            );
        }
        let allowed = self.budget.try_spend();
        if !allowed {
            trace!(player = %self.id, "trade budget exhausted, not sending");
        }
        allowed
    }

    pub(crate) fn on_new_hand(
        &mut self,
        cards: &[Commodity],
        num_players: u32,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        if num_players > self.max_players {
            return Err(PlayerError::RingTooLarge {
                num_players,
                max_players: self.max_players,
            });
        }

        // An offer may already have been accepted before the hand arrived;
        // those cards stay and the new ones are added on top.
        self.hand.extend(cards.iter().cloned());
        self.num_players = num_players;
        self.snapshot.set_capacity(num_players);
        let folded = self.snapshot.fold_dealt(cards);

        info!(
            player = %self.id,
            num_players,
            hand_size = self.hand.len(),
            counts = ?self.hand.counts(),
            folded,
            "new hand"
        );

        // Our marker has to precede the opening offer on every channel.
        let resumed = self.resume_snapshot(outbox);
        self.tender(outbox)?;
        resumed
    }

    pub(crate) fn on_tender_offer(
        &mut self,
        card: &Commodity,
        source: PeerId,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        if self.halted {
            return Ok(());
        }
        debug!(player = %self.id, card = %card, source = %source, "received offer");

        self.snapshot.fold(source, card);

        let wanted = self.hand.max_commodity().is_some_and(|max| max == card);
        if wanted {
            self.reply_accept(card.clone(), source, outbox)
        } else {
            self.reply_reject(card, source, outbox)
        }
    }

    /// Keep the offered card and pay with our scarcest commodity.
    fn reply_accept(
        &mut self,
        card: Commodity,
        to: PeerId,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        self.hand.add(card);

        if !self.spend_trade() {
            return Ok(());
        }

        let Some(scarcest) = self.hand.min_commodity().cloned() else {
            return Ok(());
        };
        let Some(payment) = self.hand.take_first(&scarcest) else {
            return Ok(());
        };

        debug!(
            player = %self.id,
            payment = %payment,
            to = %to,
            hand_size = self.hand.len(),
            "accepting offer"
        );
        outbox.send_to_player(
            to,
            &Message::AcceptOffer {
                card: payment,
                source: self.id,
            },
        )?;
        Ok(())
    }

    /// Send the offered card back untouched.
    fn reply_reject(
        &mut self,
        card: &Commodity,
        to: PeerId,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        if !self.spend_trade() {
            return Ok(());
        }

        debug!(player = %self.id, card = %card, to = %to, "rejecting offer");
        outbox.send_to_player(
            to,
            &Message::RejectOffer {
                card: card.clone(),
                source: self.id,
            },
        )?;
        Ok(())
    }

    pub(crate) fn on_accept_offer(
        &mut self,
        card: &Commodity,
        source: PeerId,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        if self.halted {
            return Ok(());
        }
        self.hand.add(card.clone());
        self.snapshot.fold(source, card);

        debug!(
            player = %self.id,
            card = %card,
            source = %source,
            "offer accepted, received payment"
        );
        self.tender(outbox)
    }

    pub(crate) fn on_reject_offer(
        &mut self,
        card: &Commodity,
        source: PeerId,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        if self.halted {
            return Ok(());
        }
        self.hand.add(card.clone());
        self.snapshot.fold(source, card);

        debug!(
            player = %self.id,
            card = %card,
            source = %source,
            "offer rejected, card returned"
        );
        self.tender(outbox)
    }

    /// Offer one card to another player.
    pub(crate) fn tender(&mut self, outbox: &mut dyn Outbox) -> Result<(), PlayerError> {
        if !self.spend_trade() {
            return Ok(());
        }
        // Without a hand we do not know the ring yet.
        if self.num_players == 0 {
            return Ok(());
        }

        let Some(to) = self.selector.pick_peer(self.id, self.num_players) else {
            debug!(player = %self.id, "no other player to trade with");
            return Ok(());
        };
        if to == self.id || to.into_inner() >= self.num_players {
            return Err(PlayerError::UnknownPeer {
                peer: to,
                num_players: self.num_players,
            });
        }

        let Some(index) = self.selector.pick_card(self.hand.cards()) else {
            debug!(player = %self.id, "hand is empty, nothing to offer");
            return Ok(());
        };
        let len = self.hand.len();
        let card = self
            .hand
            .take_at(index)
            .ok_or(PlayerError::InvalidCardIndex { index, len })?;

        debug!(player = %self.id, card = %card, to = %to, "tendering offer");
        outbox.send_to_player(
            to,
            &Message::TenderOffer {
                card,
                source: self.id,
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pit_types::{Message, PeerId};

    use super::*;
    use crate::config::PlayerConfig;
    use crate::outbox::RecordingOutbox;
    use crate::selection::ScriptedSelector;

    fn c(name: &str) -> Commodity {
        Commodity::from(name)
    }

    fn player(id: u32, max_trades: u64) -> Player {
        Player::new(
            PeerId(id),
            &PlayerConfig {
                max_trades,
                ..PlayerConfig::default()
            },
            Box::new(ScriptedSelector::default()),
        )
    }

    fn dealt(id: u32, cards: &[&str], num_players: u32) -> (Player, RecordingOutbox) {
        let mut p = player(id, 100);
        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::NewHand {
                cards: cards.iter().map(|n| c(n)).collect(),
                num_players,
            },
            &mut out,
        );
        out.clear();
        (p, out)
    }

    #[test]
    fn budget_counts_every_attempt() {
        let mut budget = TradeBudget::new(2);
        assert!(budget.try_spend());
        assert!(budget.try_spend());
        assert!(!budget.try_spend());
        assert!(!budget.try_spend());
        assert_eq!(budget.attempts(), 4);
        assert!(budget.is_exhausted());
        budget.reset();
        assert_eq!(budget.attempts(), 0);
        assert!(budget.try_spend());
    }

    #[test]
    fn new_hand_builds_counts_and_tenders_once() {
        let mut p = Player::new(
            PeerId(0),
            &PlayerConfig::default(),
            Box::new(ScriptedSelector::new([0], [PeerId(3)])),
        );
        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::NewHand {
                cards: ["A", "A", "B", "B", "B", "C"].iter().map(|n| c(n)).collect(),
                num_players: 5,
            },
            &mut out,
        );

        assert_eq!(out.to_players.len(), 1);
        let (to, msg) = &out.to_players[0];
        assert_eq!(*to, PeerId(3));
        assert_eq!(
            *msg,
            Message::TenderOffer {
                card: c("A"),
                source: PeerId(0)
            }
        );
        // Counts before the offer were A:2 B:3 C:1; one A has left.
        assert_eq!(p.hand().count(&c("A")), 1);
        assert_eq!(p.hand().count(&c("B")), 3);
        assert_eq!(p.hand().count(&c("C")), 1);
        assert_eq!(p.num_players(), 5);
    }

    #[test]
    fn offer_of_non_max_commodity_is_rejected() {
        let (mut p, mut out) = dealt(1, &["A", "B", "C", "C", "C"], 5);
        // Dealing tendered one card (the first, A) away.
        p.dispatch(
            Message::AcceptOffer {
                card: c("A"),
                source: PeerId(4),
            },
            &mut out,
        );
        out.clear();
        let before = p.hand().clone();

        p.dispatch(
            Message::TenderOffer {
                card: c("A"),
                source: PeerId(0),
            },
            &mut out,
        );

        assert_eq!(
            out.to_players,
            vec![(
                PeerId(0),
                Message::RejectOffer {
                    card: c("A"),
                    source: PeerId(1)
                }
            )]
        );
        assert_eq!(*p.hand(), before);
    }

    #[test]
    fn offer_of_max_commodity_is_accepted_and_paid_with_min() {
        let (mut p, mut out) = dealt(2, &["D", "B", "B", "B", "A", "A"], 5);
        // D went out on the initial tender; hand is B:3 A:2.
        assert_eq!(p.hand().count(&c("D")), 0);

        p.dispatch(
            Message::TenderOffer {
                card: c("B"),
                source: PeerId(4),
            },
            &mut out,
        );

        assert_eq!(
            out.to_players,
            vec![(
                PeerId(4),
                Message::AcceptOffer {
                    card: c("A"),
                    source: PeerId(2)
                }
            )]
        );
        assert_eq!(p.hand().count(&c("B")), 4);
        assert_eq!(p.hand().count(&c("A")), 1);
        assert_eq!(p.hand().len(), 5);
    }

    #[test]
    fn offer_before_any_hand_is_returned() {
        let mut p = player(3, 100);
        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::TenderOffer {
                card: c("Corn"),
                source: PeerId(1),
            },
            &mut out,
        );
        assert_eq!(
            out.to_players,
            vec![(
                PeerId(1),
                Message::RejectOffer {
                    card: c("Corn"),
                    source: PeerId(3)
                }
            )]
        );
        assert!(p.hand().is_empty());
    }

    #[test]
    fn accept_and_reject_replies_trigger_a_new_tender() {
        let (mut p, mut out) = dealt(0, &["A", "B"], 3);
        p.dispatch(
            Message::RejectOffer {
                card: c("A"),
                source: PeerId(1),
            },
            &mut out,
        );
        assert_eq!(out.to_players.len(), 1);
        assert!(matches!(out.to_players[0].1, Message::TenderOffer { .. }));

        out.clear();
        p.dispatch(
            Message::AcceptOffer {
                card: c("C"),
                source: PeerId(2),
            },
            &mut out,
        );
        assert_eq!(out.to_players.len(), 1);
        assert!(matches!(out.to_players[0].1, Message::TenderOffer { .. }));
        // Two cards dealt, one returned, one received as payment, and
        // three offered out.
        assert_eq!(p.hand().len(), 1);
    }

    #[test]
    fn tender_without_known_ring_sends_nothing_but_spends() {
        let mut p = player(0, 10);
        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::AcceptOffer {
                card: c("A"),
                source: PeerId(1),
            },
            &mut out,
        );
        assert!(out.to_players.is_empty());
        assert_eq!(p.hand().len(), 1);
        assert_eq!(p.trade_attempts(), 1);
    }

    #[test]
    fn lone_player_never_offers() {
        let (p, out) = dealt(0, &["A", "B"], 1);
        assert!(out.to_players.is_empty());
        assert_eq!(p.hand().len(), 2);
    }

    #[test]
    fn budget_cap_silences_tender_accept_and_reject() {
        // Cap of 1: the tender on NewHand uses it up.
        let mut p = player(1, 1);
        let mut out = RecordingOutbox::new();
        p.dispatch(
            Message::NewHand {
                cards: vec![c("B"), c("B"), c("B"), c("A")],
                num_players: 3,
            },
            &mut out,
        );
        assert_eq!(out.to_players.len(), 1);
        out.clear();

        // Reject path: budget exhausted, nothing sent.
        p.dispatch(
            Message::TenderOffer {
                card: c("A"),
                source: PeerId(2),
            },
            &mut out,
        );
        assert!(out.to_players.is_empty());

        // Accept path: the card is kept, no payment goes out.
        let before = p.hand().len();
        p.dispatch(
            Message::TenderOffer {
                card: c("B"),
                source: PeerId(2),
            },
            &mut out,
        );
        assert!(out.to_players.is_empty());
        assert_eq!(p.hand().len(), before + 1);

        // Reply path: card returns, no new tender.
        p.dispatch(
            Message::RejectOffer {
                card: c("B"),
                source: PeerId(0),
            },
            &mut out,
        );
        assert!(out.to_players.is_empty());
        assert_eq!(p.trade_attempts(), 4);
    }

    #[test]
    fn halted_player_drops_trade_messages() {
        let (mut p, mut out) = dealt(0, &["A", "B", "C"], 3);
        p.dispatch(
            Message::Reset {
                action: pit_types::ResetAction::Halt,
            },
            &mut out,
        );
        out.clear();
        let before = p.hand().clone();

        for msg in [
            Message::TenderOffer {
                card: c("A"),
                source: PeerId(1),
            },
            Message::AcceptOffer {
                card: c("A"),
                source: PeerId(1),
            },
            Message::RejectOffer {
                card: c("A"),
                source: PeerId(1),
            },
        ] {
            p.dispatch(msg, &mut out);
        }

        assert!(out.to_players.is_empty());
        assert_eq!(*p.hand(), before);
    }
}
