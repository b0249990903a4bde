//! Chandy-Lamport snapshot recording for a single player.
//!
//! An epoch runs `Idle -> Recording -> Reporting -> Idle`:
//!
//! - The first marker of an epoch (from the coordinator or any player)
//!   seeds the record with the current hand, starts recording, notes the
//!   sender as a participant and broadcasts our own marker to every other
//!   player, once.
//! - While recording, each trade message from a player whose marker has not
//!   arrived yet adds its card to the record. Those cards were in flight on
//!   that channel when the snapshot was cut.
//! - When markers from all N-1 other players have arrived, the record goes to
//!   the coordinator and the epoch state is reset in place.
//!
//! A marker can arrive before the player's hand, while the ring size is
//! still unknown. Sender ids are then bounded by the configured maximum ring
//! size, the broadcast is held back, and the dealt cards are added to the
//! record when the hand arrives. The broadcast goes out at that point.
//!
//! A halted player does not broadcast markers but keeps its bookkeeping.
//! If a halt lands mid-epoch, other players may wait forever for our marker.

use std::collections::BTreeMap;

use pit_types::{Commodity, CoordinatorMessage, MarkerSource, Message, PeerId, SnapshotReport};
use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::hand::Hand;
use crate::outbox::Outbox;
use crate::player::Player;

/// Per-epoch marker bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRecorder {
    recording: bool,
    record: BTreeMap<Commodity, u32>,
    /// Indexed by player number: has that player's marker arrived?
    seen: Vec<bool>,
    participants: usize,
    epoch: u64,
    /// Recording started before the ring size was known.
    broadcast_owed: bool,
}

impl SnapshotRecorder {
    /// Create an idle recorder.
    pub const fn new() -> Self {
        Self {
            recording: false,
            record: BTreeMap::new(),
            seen: Vec::new(),
            participants: 0,
            epoch: 0,
            broadcast_owed: false,
        }
    }

    /// Size the participant table for a ring of `num_players`.
    ///
    /// Markers from players at or beyond `num_players` are forgotten.
    pub fn set_capacity(&mut self, num_players: u32) {
        self.seen.resize(num_players as usize, false);
        self.participants = self.seen.iter().filter(|&&s| s).count();
    }

    /// Whether an epoch is in progress.
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    /// Number of epochs completed so far.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The record of the current epoch.
    pub const fn record(&self) -> &BTreeMap<Commodity, u32> {
        &self.record
    }

    /// Number of players whose marker arrived this epoch.
    pub const fn participant_count(&self) -> usize {
        self.participants
    }

    /// Whether `peer`'s marker arrived this epoch.
    pub fn has_seen(&self, peer: PeerId) -> bool {
        self.seen.get(peer.index()).copied().unwrap_or(false)
    }

    /// Whether our own marker still has to go out for this epoch.
    pub const fn broadcast_owed(&self) -> bool {
        self.broadcast_owed
    }

    /// Start an epoch, seeding the record from `hand`.
    pub fn start(&mut self, hand: &Hand) {
        self.record.clear();
        self.record
            .extend(hand.counts().iter().map(|(c, &n)| (c.clone(), n)));
        self.recording = true;
    }

    /// Record cards dealt while an epoch is in progress.
    ///
    /// The coordinator never sends markers, so its channel stays open for
    /// the whole epoch. Returns the number of cards added.
    pub fn fold_dealt(&mut self, cards: &[Commodity]) -> usize {
        if !self.recording {
            return 0;
        }
        for card in cards {
            let count = self.record.entry(card.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
        cards.len()
    }

    /// Record `card` if it arrived on a channel that is still open.
    ///
    /// Returns `true` if the card was added to the record.
    pub fn fold(&mut self, source: PeerId, card: &Commodity) -> bool {
        if !self.recording || self.has_seen(source) {
            return false;
        }
        let count = self.record.entry(card.clone()).or_insert(0);
        *count = count.saturating_add(1);
        true
    }

    /// Note that `peer`'s marker arrived.
    ///
    /// Returns `false` if it had already arrived this epoch, or if `peer`
    /// is beyond the table sized by [`Self::set_capacity`].
    pub fn admit(&mut self, peer: PeerId) -> bool {
        match self.seen.get_mut(peer.index()) {
            Some(slot) if !*slot => {
                *slot = true;
                self.participants = self.participants.saturating_add(1);
                true
            }
            _ => false,
        }
    }

    /// Whether every other player's marker has arrived.
    pub const fn is_complete(&self, num_players: u32) -> bool {
        self.recording
            && num_players > 0
            && self.participants == num_players.saturating_sub(1) as usize
    }

    /// Close the epoch: hand out the report and reset in place.
    pub fn finish(&mut self, player: PeerId) -> SnapshotReport {
        let report = SnapshotReport {
            player,
            epoch: self.epoch,
            holdings: self.record.clone(),
        };
        self.record.clear();
        self.seen.fill(false);
        self.participants = 0;
        self.recording = false;
        self.broadcast_owed = false;
        self.epoch = self.epoch.saturating_add(1);
        report
    }
}

impl Player {
    pub(crate) fn on_marker(
        &mut self,
        source: MarkerSource,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        debug!(player = %self.id, source = %source, "received marker");

        if let Some(peer) = source.player() {
            if peer == self.id {
                return Err(PlayerError::OwnMarker(peer));
            }
            // Before the hand arrives, ids are bounded by the largest ring
            // we would join.
            let bound = if self.num_players > 0 {
                self.num_players
            } else {
                self.max_players
            };
            if peer.into_inner() >= bound {
                return Err(PlayerError::UnknownPeer {
                    peer,
                    num_players: bound,
                });
            }
            if self.num_players == 0 {
                self.snapshot.set_capacity(self.max_players);
            }
        }

        let mut broadcast = Ok(());
        if self.snapshot.is_recording() {
            match source.player() {
                None => debug!(
                    player = %self.id,
                    "already recording, ignoring coordinator marker"
                ),
                Some(peer) => {
                    if !self.snapshot.admit(peer) {
                        warn!(player = %self.id, peer = %peer, "duplicate marker ignored");
                    }
                }
            }
        } else {
            self.snapshot.start(&self.hand);
            if let Some(peer) = source.player() {
                self.snapshot.admit(peer);
            }
            info!(
                player = %self.id,
                epoch = self.snapshot.epoch(),
                trigger = %source,
                recorded = ?self.snapshot.record(),
                "snapshot started"
            );
            if self.num_players == 0 {
                debug!(player = %self.id, "ring size unknown, marker broadcast deferred");
                self.snapshot.broadcast_owed = true;
            } else {
                broadcast = self.broadcast_marker(outbox);
            }
        }

        // A failed broadcast must not hold back a finished epoch.
        self.report_if_complete(outbox)?;
        broadcast
    }

    /// Catch up on an epoch that started before the hand arrived.
    ///
    /// Called once the ring size is known: sends the deferred broadcast and
    /// reports if every marker is already in.
    pub(crate) fn resume_snapshot(
        &mut self,
        outbox: &mut dyn Outbox,
    ) -> Result<(), PlayerError> {
        let mut broadcast = Ok(());
        if self.snapshot.broadcast_owed {
            self.snapshot.broadcast_owed = false;
            broadcast = self.broadcast_marker(outbox);
        }
        self.report_if_complete(outbox)?;
        broadcast
    }

    /// Send the record to the coordinator if the epoch is complete.
    fn report_if_complete(&mut self, outbox: &mut dyn Outbox) -> Result<(), PlayerError> {
        if self.snapshot.is_complete(self.num_players) {
            let report = self.snapshot.finish(self.id);
            info!(
                player = %self.id,
                epoch = report.epoch,
                total_cards = report.total_cards(),
                holdings = ?report.holdings,
                "all markers received, reporting snapshot"
            );
            outbox.send_to_coordinator(&CoordinatorMessage::Snapshot(report))?;
        }
        Ok(())
    }

    /// Send our marker on every outgoing channel.
    fn broadcast_marker(&self, outbox: &mut dyn Outbox) -> Result<(), PlayerError> {
        if self.halted {
            debug!(player = %self.id, "halted, not forwarding markers");
            return Ok(());
        }

        let marker = Message::Marker {
            source: MarkerSource::Player(self.id),
        };
        let mut first_error = None;
        for peer in (0..self.num_players).map(PeerId).filter(|&p| p != self.id) {
            if let Err(e) = outbox.send_to_player(peer, &marker) {
                warn!(player = %self.id, to = %peer, error = %e, "failed to send marker");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }
}
