//! A player's hand of commodity cards.
//!
//! The hand keeps the cards in arrival order together with a per-commodity
//! count that is rebuilt after every change, so the two never disagree:
//! the counts always sum to the number of cards held.
//!
//! Max/min selection walks the counts in commodity order and keeps the first
//! strict winner, which makes ties resolve to the lexicographically smallest
//! commodity.

use std::collections::BTreeMap;

use pit_types::Commodity;

/// The cards one player holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Commodity>,
    counts: BTreeMap<Commodity, u32>,
}

impl Hand {
    /// Create an empty hand.
    pub const fn new() -> Self {
        Self {
            cards: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Cards in the order they were received.
    pub fn cards(&self) -> &[Commodity] {
        &self.cards
    }

    /// Number of cards of each commodity held.
    pub const fn counts(&self) -> &BTreeMap<Commodity, u32> {
        &self.counts
    }

    /// Count of a single commodity.
    pub fn count(&self, commodity: &Commodity) -> u32 {
        self.counts.get(commodity).copied().unwrap_or(0)
    }

    /// Total number of cards held.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the hand holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Add one card.
    pub fn add(&mut self, card: Commodity) {
        self.cards.push(card);
        self.rebuild();
    }

    /// Add several cards at once.
    pub fn extend(&mut self, cards: impl IntoIterator<Item = Commodity>) {
        self.cards.extend(cards);
        self.rebuild();
    }

    /// Remove and return the card at `index`, if there is one.
    pub fn take_at(&mut self, index: usize) -> Option<Commodity> {
        if index >= self.cards.len() {
            return None;
        }
        let card = self.cards.remove(index);
        self.rebuild();
        Some(card)
    }

    /// Remove and return the first card of the given commodity.
    pub fn take_first(&mut self, commodity: &Commodity) -> Option<Commodity> {
        let index = self.cards.iter().position(|c| c == commodity)?;
        self.take_at(index)
    }

    /// Drop every card.
    pub fn clear(&mut self) {
        self.cards.clear();
        self.counts.clear();
    }

    /// The commodity held in the largest number, first on ties.
    pub fn max_commodity(&self) -> Option<&Commodity> {
        let mut best: Option<(&Commodity, u32)> = None;
        for (commodity, &count) in &self.counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((commodity, count)),
            }
        }
        best.map(|(commodity, _)| commodity)
    }

    /// The commodity held in the smallest number, first on ties.
    pub fn min_commodity(&self) -> Option<&Commodity> {
        let mut best: Option<(&Commodity, u32)> = None;
        for (commodity, &count) in &self.counts {
            match best {
                Some((_, best_count)) if count >= best_count => {}
                _ => best = Some((commodity, count)),
            }
        }
        best.map(|(commodity, _)| commodity)
    }

    fn rebuild(&mut self) {
        self.counts.clear();
        for card in &self.cards {
            let count = self.counts.entry(card.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
}
