//! Game simulation modules

pub mod cannon_ball;
pub mod command;
pub mod geometry;
pub mod room;
pub mod ship;
pub mod simulation;
pub mod snapshot;
pub mod tuning;

pub use cannon_ball::{CannonBall, CannonBallId};
pub use command::{Change, Command, CommandError, CommandResult, Orientation};
pub use room::{RoomError, RoomHandle, RoomId, RoomRegistry, RoomSettings};
pub use ship::Ship;
pub use simulation::Simulation;
pub use snapshot::{CannonBallView, ShipView, Snapshot};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque player key handed to us by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
