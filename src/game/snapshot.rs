//! Snapshot wire types and broadcast bookkeeping

use serde::{Deserialize, Serialize};

use super::cannon_ball::CannonBallId;
use super::PlayerId;

/// Full view of a room at `updated_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ships: Vec<ShipView>,
    pub cannon_balls: Vec<CannonBallView>,
    /// Server time (unix ms) of the last visible change
    pub updated_at: u64,
}

impl Snapshot {
    pub fn empty(updated_at: u64) -> Self {
        Self {
            ships: Vec::new(),
            cannon_balls: Vec::new(),
            updated_at,
        }
    }

    pub fn ship(&self, player: &PlayerId) -> Option<&ShipView> {
        self.ships.iter().find(|s| &s.player == player)
    }

    pub fn cannon_ball(&self, id: CannonBallId) -> Option<&CannonBallView> {
        self.cannon_balls.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipView {
    pub player: PlayerId,
    pub x: f32,
    pub y: f32,
    /// Heading in radians
    pub angle: f32,
    pub hit_count: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannonBallView {
    pub id: CannonBallId,
    pub x: f32,
    pub y: f32,
}

/// Broadcast statistics for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub avg_ships_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, ship_count: usize) {
        self.total_snapshots += 1;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_ships_per_snapshot =
            self.avg_ships_per_snapshot * ((n - 1.0) / n) + (ship_count as f32 / n);
    }
}
