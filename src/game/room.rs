//! Room task and registry
//!
//! Each room runs as one tokio task that owns its `Simulation`. Commands and
//! ticks are handled in the same `select!` loop, so they never interleave.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{unix_millis, TickClock};

use super::command::{Command, CommandResult};
use super::simulation::Simulation;
use super::snapshot::{Snapshot, SnapshotStats};
use super::tuning::Tuning;
use super::PlayerId;

pub type RoomId = Uuid;

/// Per-room runtime parameters
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub tuning: Tuning,
    pub seed: u64,
    pub tick_interval: Duration,
    /// Upper bound on a single tick's `dt`
    pub max_tick_delta: Duration,
    /// Shut down after this long without any connection
    pub idle_timeout: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            seed: rand::random(),
            tick_interval: Duration::from_millis(50),
            max_tick_delta: Duration::from_millis(250),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Messages into a room task
#[derive(Debug)]
pub enum RoomInput {
    /// A socket for `player` opened; replies with the current snapshot
    Connect {
        player: PlayerId,
        reply: oneshot::Sender<Snapshot>,
    },
    Command {
        player: PlayerId,
        command: Command,
        received_at: u64,
        reply: oneshot::Sender<CommandResult>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Disconnect {
        player: PlayerId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room is closed")]
    Closed,
}

/// Handle to a running room
#[derive(Clone)]
pub struct RoomHandle {
    pub id: RoomId,
    input_tx: mpsc::Sender<RoomInput>,
    snapshot_tx: broadcast::Sender<Snapshot>,
    connections: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    /// Snapshots broadcast after every modified command or tick
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn connect(&self, player: PlayerId) -> Result<Snapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomInput::Connect { player, reply }).await?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    pub async fn command(
        &self,
        player: PlayerId,
        command: Command,
        received_at: u64,
    ) -> Result<CommandResult, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomInput::Command {
            player,
            command,
            received_at,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomInput::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    pub async fn disconnect(&self, player: PlayerId) {
        let _ = self.send(RoomInput::Disconnect { player }).await;
    }

    async fn send(&self, input: RoomInput) -> Result<(), RoomError> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| RoomError::Closed)
    }
}

/// Registry of all active rooms
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Start a room task; it removes itself from the registry when it stops
    pub fn spawn(self: &Arc<Self>, settings: RoomSettings) -> RoomHandle {
        let (room, handle) = Room::new(Uuid::new_v4(), settings);
        self.rooms.insert(handle.id, handle.clone());

        let registry = Arc::clone(self);
        let id = handle.id;
        tokio::spawn(async move {
            room.run().await;
            registry.rooms.remove(&id);
        });

        handle
    }

    pub fn get(&self, id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(id).map(|r| r.value().clone())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_connections(&self) -> usize {
        self.rooms
            .iter()
            .map(|r| r.value().connection_count())
            .sum()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative room task
pub struct Room {
    id: RoomId,
    sim: Simulation,
    settings: RoomSettings,
    input_rx: mpsc::Receiver<RoomInput>,
    snapshot_tx: broadcast::Sender<Snapshot>,
    /// Open sockets per player
    sockets: HashMap<PlayerId, usize>,
    connections: Arc<AtomicUsize>,
    stats: SnapshotStats,
}

impl Room {
    pub fn new(id: RoomId, settings: RoomSettings) -> (Self, RoomHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let connections = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            id,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            connections: connections.clone(),
        };

        let room = Self {
            id,
            sim: Simulation::new(settings.tuning, settings.seed, unix_millis()),
            settings,
            input_rx,
            snapshot_tx,
            sockets: HashMap::new(),
            connections,
            stats: SnapshotStats::default(),
        };

        (room, handle)
    }

    /// Run the authoritative tick loop
    pub async fn run(mut self) {
        info!(room_id = %self.id, "Room started");

        let mut ticker = interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = TickClock::new(self.settings.max_tick_delta);
        let mut idle_since = Some(Instant::now());

        loop {
            tokio::select! {
                input = self.input_rx.recv() => {
                    let Some(input) = input else {
                        break;
                    };
                    self.handle_input(input);
                    idle_since = match (self.sockets.is_empty(), idle_since) {
                        (true, None) => Some(Instant::now()),
                        (true, since) => since,
                        (false, _) => None,
                    };
                }
                _ = ticker.tick() => {
                    let dt = clock.delta();
                    if self.sim.tick(dt, unix_millis()).is_modified() {
                        self.broadcast();
                    }

                    if idle_since.is_some_and(|since| since.elapsed() >= self.settings.idle_timeout) {
                        info!(room_id = %self.id, "No connections left, closing room");
                        break;
                    }
                }
            }
        }

        info!(
            room_id = %self.id,
            snapshots = self.stats.total_snapshots,
            avg_ships = self.stats.avg_ships_per_snapshot,
            "Room stopped"
        );
    }

    fn handle_input(&mut self, input: RoomInput) {
        match input {
            RoomInput::Connect { player, reply } => {
                *self.sockets.entry(player.clone()).or_default() += 1;
                self.update_connection_count();
                info!(room_id = %self.id, player = %player, "Player connected");
                let _ = reply.send(self.sim.snapshot(Some(&player)));
            }
            RoomInput::Command {
                player,
                command,
                received_at,
                reply,
            } => {
                let result = self.sim.apply(&player, command, received_at);
                let _ = reply.send(result);
                if matches!(result, Ok(change) if change.is_modified()) {
                    self.broadcast();
                }
            }
            RoomInput::Snapshot { reply } => {
                let _ = reply.send(self.sim.snapshot(None));
            }
            RoomInput::Disconnect { player } => {
                if let Some(count) = self.sockets.get_mut(&player) {
                    *count -= 1;
                    if *count == 0 {
                        self.sockets.remove(&player);
                    }
                }
                self.update_connection_count();
                info!(room_id = %self.id, player = %player, "Player disconnected");
            }
        }
    }

    fn update_connection_count(&self) {
        let total: usize = self.sockets.values().sum();
        self.connections.store(total, Ordering::Relaxed);
    }

    fn broadcast(&mut self) {
        let snapshot = self.sim.snapshot(None);
        self.stats.record(snapshot.ships.len());
        if self.snapshot_tx.send(snapshot).is_err() {
            debug!(room_id = %self.id, "No subscribers for snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::command::{Change, CommandError, Orientation};
    use tokio_test::{assert_err, assert_ok};

    fn settings() -> RoomSettings {
        RoomSettings {
            seed: 11,
            tick_interval: Duration::from_millis(10),
            idle_timeout: Duration::from_millis(100),
            ..RoomSettings::default()
        }
    }

    #[tokio::test]
    async fn join_is_broadcast_to_subscribers() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.spawn(settings());
        let mut snapshots = room.subscribe();
        let ana = PlayerId::from("ana");

        let initial = assert_ok!(room.connect(ana.clone()).await);
        assert!(initial.ships.is_empty());
        assert_eq!(room.connection_count(), 1);

        let result = assert_ok!(room.command(ana.clone(), Command::Join, unix_millis()).await);
        assert_eq!(result, Ok(Change::Modified));

        let snapshot = assert_ok!(snapshots.recv().await);
        assert_eq!(snapshot.ships.len(), 1);
        assert_eq!(snapshot.ships[0].player, ana);
    }

    #[tokio::test]
    async fn rejections_come_back_as_values() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.spawn(settings());
        let ben = PlayerId::from("ben");
        assert_ok!(room.connect(ben.clone()).await);

        let result = assert_ok!(
            room.command(
                ben.clone(),
                Command::SetOrientation {
                    orientation: Orientation::Left,
                    accelerating: true,
                },
                unix_millis(),
            )
            .await
        );
        assert_eq!(result, Err(CommandError::NotJoined));

        let now = unix_millis();
        assert_ok!(room.command(ben.clone(), Command::Join, now).await).unwrap();
        assert_ok!(room.command(ben.clone(), Command::FireCannon, now).await).unwrap();
        let second = assert_ok!(room.command(ben.clone(), Command::FireCannon, now + 1).await);
        assert_eq!(second, Err(CommandError::Reloading));

        let snapshot = assert_ok!(room.snapshot().await);
        assert_eq!(snapshot.ships.len(), 1);
    }

    #[tokio::test]
    async fn idle_room_closes_and_leaves_registry() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.spawn(settings());
        let cid = PlayerId::from("cid");

        assert_ok!(room.connect(cid.clone()).await);
        assert_eq!(registry.active_rooms(), 1);
        assert_eq!(registry.total_connections(), 1);
        room.disconnect(cid).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(registry.active_rooms(), 0);
        assert!(registry.get(&room.id).is_none());
        assert_err!(room.snapshot().await);
    }
}
