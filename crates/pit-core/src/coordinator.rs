//! The coordinator: deals hands, triggers snapshots, and issues resets.
//!
//! The coordinator is not a player. It talks to players through the same
//! [`LocalNetwork`] they use and reads their reports from its own inbox.
//! Reports that arrive while it is waiting for something else (an ack
//! during a snapshot, say) are kept and served to the next wait that wants
//! them. Snapshot reports for epochs already collected are dropped, and at
//! most [`MAX_PENDING_REPORTS`] are kept.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use pit_player::TransportError;
use pit_types::{
    Commodity, CoordinatorMessage, MarkerSource, Message, PeerId, PeerReport, ResetAction,
    SnapshotReport, wire,
};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::conservation;
use crate::network::{Inbox, LocalNetwork};

/// Upper bound on reports buffered for later waits.
pub const MAX_PENDING_REPORTS: usize = 4096;

/// Errors that can occur while driving the players.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A message could not be sent to a player.
    #[error("transport error: {source}")]
    Transport {
        /// The underlying transport error.
        #[from]
        source: TransportError,
    },

    /// Not every player answered in time.
    #[error("timed out after {timeout:?} waiting for {expected} {waiting_for}")]
    Timeout {
        /// What was being collected.
        waiting_for: &'static str,
        /// How many answers were needed.
        expected: usize,
        /// The configured wait.
        timeout: Duration,
    },

    /// Every player outbox has been dropped.
    #[error("coordinator inbox closed")]
    Closed,

    /// There is nobody to deal to.
    #[error("no players on the network")]
    NoPlayers,
}

/// Drives one table of players.
#[derive(Debug)]
pub struct Coordinator {
    network: LocalNetwork,
    inbox: Inbox,
    timeout: Duration,
    pending: VecDeque<PeerReport>,
    next_epoch: u64,
    dealt: BTreeMap<Commodity, u64>,
}

impl Coordinator {
    /// Create a coordinator that waits at most `timeout` for each
    /// collection.
    pub const fn new(network: LocalNetwork, inbox: Inbox, timeout: Duration) -> Self {
        Self {
            network,
            inbox,
            timeout,
            pending: VecDeque::new(),
            next_epoch: 0,
            dealt: BTreeMap::new(),
        }
    }

    /// Number of players on the table.
    pub fn num_players(&self) -> u32 {
        self.network.num_players()
    }

    /// Cards dealt so far, per commodity.
    pub const fn dealt(&self) -> &BTreeMap<Commodity, u64> {
        &self.dealt
    }

    /// Epoch the next [`collect_epoch`](Self::collect_epoch) will gather.
    pub const fn next_epoch(&self) -> u64 {
        self.next_epoch
    }

    /// Shuffle a fresh deck and deal it round-robin, one `NewHand` per
    /// player.
    ///
    /// The deck holds `cards_per_commodity` copies of every configured
    /// commodity and is shuffled with a generator seeded from `game.seed`.
    /// Dealt totals are added to [`dealt`](Self::dealt).
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NoPlayers`] on an empty network, or
    /// [`CoordinatorError::Transport`] if a hand cannot be sent.
    pub fn deal(&mut self, game: &GameConfig) -> Result<(), CoordinatorError> {
        let num_players = self.num_players();
        if num_players == 0 {
            return Err(CoordinatorError::NoPlayers);
        }

        let mut deck: Vec<Commodity> = game
            .commodities
            .iter()
            .flat_map(|c| (0..game.cards_per_commodity).map(move |_| c.clone()))
            .collect();
        let mut rng = StdRng::seed_from_u64(game.seed);
        deck.shuffle(&mut rng);

        for (commodity, count) in conservation::tally(&deck) {
            let total = self.dealt.entry(commodity).or_insert(0);
            *total = total.saturating_add(count);
        }

        let mut hands: Vec<Vec<Commodity>> = (0..num_players).map(|_| Vec::new()).collect();
        for (card, seat) in deck.into_iter().zip((0..hands.len()).cycle()) {
            if let Some(hand) = hands.get_mut(seat) {
                hand.push(card);
            }
        }

        for (cards, raw) in hands.into_iter().zip(0_u32..) {
            debug!(player = raw, hand_size = cards.len(), "dealing hand");
            self.network.send_to_player(
                PeerId(raw),
                &Message::NewHand { cards, num_players },
            )?;
        }
        info!(num_players, dealt = ?self.dealt, "hands dealt");
        Ok(())
    }

    /// Start a snapshot by sending a coordinator marker to `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Transport`] if the marker cannot be sent.
    pub fn trigger_snapshot(&self, peer: PeerId) -> Result<(), CoordinatorError> {
        info!(player = %peer, epoch = self.next_epoch, "triggering snapshot");
        self.network.send_to_player(
            peer,
            &Message::Marker {
                source: MarkerSource::Coordinator,
            },
        )?;
        Ok(())
    }

    /// Send `action` to every player and wait until all have acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Transport`] if a reset cannot be sent,
    /// or [`CoordinatorError::Timeout`] / [`CoordinatorError::Closed`] if
    /// the acks do not all arrive.
    pub async fn reset_all(&mut self, action: ResetAction) -> Result<(), CoordinatorError> {
        let num_players = self.num_players();
        for raw in 0..num_players {
            self.network
                .send_to_player(PeerId(raw), &Message::Reset { action })?;
        }

        let acked = self
            .gather("reset acks", num_players, |report| match &report.message {
                CoordinatorMessage::ResetAck { action: got } if *got == action => {
                    Some(report.from)
                }
                _ => None,
            })
            .await?;
        info!(action = %action, acked = acked.len(), "reset complete");

        if action == ResetAction::Clear {
            self.dealt.clear();
        }
        Ok(())
    }

    /// Wait for every player's report of the next epoch, sorted by player.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Timeout`] or [`CoordinatorError::Closed`]
    /// if not every report arrives.
    pub async fn collect_epoch(&mut self) -> Result<Vec<SnapshotReport>, CoordinatorError> {
        let epoch = self.next_epoch;
        let mut reports = self
            .gather("snapshot reports", self.num_players(), |report| {
                match &report.message {
                    CoordinatorMessage::Snapshot(snapshot) if snapshot.epoch == epoch => {
                        Some(snapshot.clone())
                    }
                    _ => None,
                }
            })
            .await?;
        reports.sort_by_key(|r| r.player);
        self.next_epoch = self.next_epoch.saturating_add(1);

        let total: u64 = reports.iter().map(SnapshotReport::total_cards).sum();
        info!(epoch, reports = reports.len(), total_cards = total, "snapshot collected");
        Ok(reports)
    }

    /// Collect `expected` reports accepted by `take`, buffering the rest.
    async fn gather<T>(
        &mut self,
        waiting_for: &'static str,
        expected: u32,
        take: impl Fn(&PeerReport) -> Option<T>,
    ) -> Result<Vec<T>, CoordinatorError> {
        let expected = usize::try_from(expected).unwrap_or(usize::MAX);
        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.gather_unbounded(expected, take))
            .await
            .map_err(|_elapsed| CoordinatorError::Timeout {
                waiting_for,
                expected,
                timeout,
            })?
    }

    async fn gather_unbounded<T>(
        &mut self,
        expected: usize,
        take: impl Fn(&PeerReport) -> Option<T>,
    ) -> Result<Vec<T>, CoordinatorError> {
        let mut found = Vec::with_capacity(expected);

        let mut kept = VecDeque::with_capacity(self.pending.len());
        while found.len() < expected {
            let Some(report) = self.pending.pop_front() else {
                break;
            };
            match take(&report) {
                Some(item) => found.push(item),
                None if self.is_stale(&report) => {}
                None => kept.push_back(report),
            }
        }
        kept.append(&mut self.pending);
        self.pending = kept;

        while found.len() < expected {
            let frame = self.inbox.recv().await.ok_or(CoordinatorError::Closed)?;
            let report = match wire::decode_report(&frame) {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, "undecodable report dropped");
                    continue;
                }
            };
            match take(&report) {
                Some(item) => found.push(item),
                None => self.buffer(report),
            }
        }
        Ok(found)
    }

    /// Whether `report` belongs to an epoch that was already collected.
    const fn is_stale(&self, report: &PeerReport) -> bool {
        matches!(
            &report.message,
            CoordinatorMessage::Snapshot(snapshot) if snapshot.epoch < self.next_epoch
        )
    }

    /// Keep `report` for a later wait, unless nobody will ever want it.
    fn buffer(&mut self, report: PeerReport) {
        if self.is_stale(&report) {
            debug!(from = %report.from, message = ?report.message, "stale report dropped");
            return;
        }
        if self.pending.len() >= MAX_PENDING_REPORTS {
            if let Some(oldest) = self.pending.pop_front() {
                warn!(
                    from = %oldest.from,
                    message = ?oldest.message,
                    "pending reports full, oldest dropped"
                );
            }
        }
        self.pending.push_back(report);
    }
}
