//! Async peer runner.
//!
//! [`run_player`] is the single consumer of one player's inbox. It decodes
//! each frame and hands the message to [`Player::dispatch`], one at a time,
//! until the inbox closes or shutdown is signalled. [`spawn_players`] starts
//! one such task per player over a [`LocalNetwork`].

use pit_player::{Outbox, Player, PlayerConfig, RandomSelector};
use pit_types::{PeerId, wire};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::network::{Inbox, LocalNetwork};

/// Errors that can occur while stopping player tasks.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A player task panicked or was cancelled.
    #[error("player task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Serve one player until its inbox closes or `shutdown` fires.
///
/// Frames that fail to decode are logged with the player's id and dropped.
/// Returns the player so its final state can be inspected.
pub async fn run_player<O: Outbox + Send>(
    mut player: Player,
    mut inbox: Inbox,
    mut outbox: O,
    mut shutdown: watch::Receiver<bool>,
) -> Player {
    info!(player = %player.id(), "player started");
    loop {
        tokio::select! {
            biased;

            // Only `true` is ever sent; a dropped sender also means stop.
            _ = shutdown.changed() => break,
            frame = inbox.recv() => {
                let Some(frame) = frame else {
                    debug!(player = %player.id(), "inbox closed");
                    break;
                };
                match wire::decode_message(&frame) {
                    Ok(message) => player.dispatch(message, &mut outbox),
                    Err(e) => warn!(
                        player = %player.id(),
                        error = %e,
                        frame = %String::from_utf8_lossy(&frame),
                        "undecodable frame dropped"
                    ),
                }
            }
        }
    }
    info!(
        player = %player.id(),
        hand_size = player.hand().len(),
        trade_attempts = player.trade_attempts(),
        "player stopped"
    );
    player
}

/// Handles to a set of running player tasks.
#[derive(Debug)]
pub struct PlayerTasks {
    handles: Vec<JoinHandle<Player>>,
    shutdown: watch::Sender<bool>,
}

impl PlayerTasks {
    /// Number of running tasks.
    pub const fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no tasks were spawned.
    pub const fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every task to stop and wait for them, returning the players
    /// in id order.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Join`] if any task panicked.
    pub async fn shutdown(self) -> Result<Vec<Player>, RunnerError> {
        // Receivers only go away when their task has already finished.
        let _ = self.shutdown.send(true);
        let mut players = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            players.push(handle.await?);
        }
        Ok(players)
    }
}

/// Spawn one task per inbox, player `i` owning `inboxes[i]`.
///
/// Each player's [`RandomSelector`] is seeded from `seed` plus its id so
/// runs are reproducible.
pub fn spawn_players(
    network: &LocalNetwork,
    inboxes: Vec<Inbox>,
    config: &PlayerConfig,
    seed: u64,
) -> PlayerTasks {
    let (shutdown, watcher) = watch::channel(false);
    let handles = inboxes
        .into_iter()
        .zip(0_u32..)
        .map(|(inbox, raw)| {
            let id = PeerId(raw);
            let selector = RandomSelector::seeded(seed.wrapping_add(u64::from(raw)));
            let player = Player::new(id, config, Box::new(selector));
            tokio::spawn(run_player(
                player,
                inbox,
                network.outbox(id),
                watcher.clone(),
            ))
        })
        .collect();
    PlayerTasks { handles, shutdown }
}
