//! Card and destination selection for outbound offers.
//!
//! A player offers a random card to a random other player. The choice is
//! made through the [`Selector`] trait so that tests can script it.
//! [`RandomSelector`] draws uniformly from a seeded RNG;
//! [`ScriptedSelector`] replays fixed choices.

use std::collections::VecDeque;

use pit_types::{Commodity, PeerId};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

/// Chooses which card to offer and to whom.
pub trait Selector: Send {
    /// Index into `hand` of the card to offer, or `None` if there is nothing
    /// to offer.
    fn pick_card(&mut self, hand: &[Commodity]) -> Option<usize>;

    /// The player to send an offer to. Must not be `me` and must be below
    /// `num_players`. Returns `None` when there is no other player.
    fn pick_peer(&mut self, me: PeerId, num_players: u32) -> Option<PeerId>;
}

/// Uniform random selection from a seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a selector whose choices are reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Selector for RandomSelector {
    fn pick_card(&mut self, hand: &[Commodity]) -> Option<usize> {
        if hand.is_empty() {
            return None;
        }
        Some(self.rng.random_range(0..hand.len()))
    }

    fn pick_peer(&mut self, me: PeerId, num_players: u32) -> Option<PeerId> {
        if num_players < 2 {
            return None;
        }
        // Draw from the N-1 other players, then step over ourselves.
        let draw = self.rng.random_range(0..num_players.saturating_sub(1));
        let peer = if draw >= me.into_inner() {
            draw.saturating_add(1)
        } else {
            draw
        };
        Some(PeerId(peer))
    }
}

/// Replays a fixed script of choices.
///
/// When a queue runs dry, or a scripted choice is not valid for the current
/// hand or ring, the selector falls back to the first card and the lowest
/// numbered other player.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    cards: VecDeque<usize>,
    peers: VecDeque<PeerId>,
}

impl ScriptedSelector {
    /// Create a selector with the given card indices and destinations.
    pub fn new(
        cards: impl IntoIterator<Item = usize>,
        peers: impl IntoIterator<Item = PeerId>,
    ) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            peers: peers.into_iter().collect(),
        }
    }
}

impl Selector for ScriptedSelector {
    fn pick_card(&mut self, hand: &[Commodity]) -> Option<usize> {
        if hand.is_empty() {
            return None;
        }
        match self.cards.pop_front() {
            Some(index) if index < hand.len() => Some(index),
            _ => Some(0),
        }
    }

    fn pick_peer(&mut self, me: PeerId, num_players: u32) -> Option<PeerId> {
        if num_players < 2 {
            return None;
        }
        match self.peers.pop_front() {
            Some(peer) if peer != me && peer.into_inner() < num_players => Some(peer),
            _ => (0..num_players).map(PeerId).find(|&p| p != me),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Commodity> {
        (0..n).map(|i| Commodity::new(format!("C{i}"))).collect()
    }

    #[test]
    fn random_never_picks_self() {
        let mut selector = RandomSelector::seeded(7);
        for _ in 0..500 {
            let peer = selector.pick_peer(PeerId(2), 5);
            assert!(matches!(peer, Some(p) if p != PeerId(2) && p.into_inner() < 5));
        }
    }

    #[test]
    fn random_reaches_every_other_peer() {
        let mut selector = RandomSelector::seeded(11);
        let mut seen = [false; 4];
        for _ in 0..500 {
            if let Some(p) = selector.pick_peer(PeerId(0), 4) {
                if let Some(slot) = seen.get_mut(p.index()) {
                    *slot = true;
                }
            }
        }
        assert_eq!(seen, [false, true, true, true]);
    }

    #[test]
    fn random_card_index_in_range() {
        let mut selector = RandomSelector::seeded(3);
        let hand = cards(6);
        for _ in 0..200 {
            assert!(matches!(selector.pick_card(&hand), Some(i) if i < 6));
        }
        assert!(selector.pick_card(&[]).is_none());
    }

    #[test]
    fn same_seed_same_choices() {
        let hand = cards(9);
        let mut a = RandomSelector::seeded(42);
        let mut b = RandomSelector::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.pick_card(&hand), b.pick_card(&hand));
            assert_eq!(a.pick_peer(PeerId(1), 5), b.pick_peer(PeerId(1), 5));
        }
    }

    #[test]
    fn lone_player_has_nobody_to_trade_with() {
        let mut random = RandomSelector::seeded(1);
        let mut scripted = ScriptedSelector::default();
        assert!(random.pick_peer(PeerId(0), 1).is_none());
        assert!(scripted.pick_peer(PeerId(0), 0).is_none());
    }

    #[test]
    fn scripted_replays_then_falls_back() {
        let mut selector = ScriptedSelector::new([2, 9], [PeerId(3), PeerId(1), PeerId(8)]);
        let hand = cards(4);
        assert_eq!(selector.pick_card(&hand), Some(2));
        // 9 is out of range for a 4-card hand.
        assert_eq!(selector.pick_card(&hand), Some(0));
        assert_eq!(selector.pick_card(&hand), Some(0));

        assert_eq!(selector.pick_peer(PeerId(1), 5), Some(PeerId(3)));
        // Scripted self is replaced by the lowest other player.
        assert_eq!(selector.pick_peer(PeerId(1), 5), Some(PeerId(0)));
        // Out of range as well.
        assert_eq!(selector.pick_peer(PeerId(0), 5), Some(PeerId(1)));
    }
}
