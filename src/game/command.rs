//! Player commands accepted by a room and their outcomes

use serde::{Deserialize, Serialize};

/// Steering command held by a ship until the next one arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    Left,
    Right,
    #[default]
    Forward,
}

/// A request from one player against the room simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Join,
    SetOrientation {
        orientation: Orientation,
        accelerating: bool,
    },
    FireCannon,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join => "join",
            Command::SetOrientation { .. } => "set_orientation",
            Command::FireCannon => "fire_cannon",
        }
    }
}

/// Whether a command or tick changed anything clients can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Modified,
    Unmodified,
}

impl Change {
    pub fn is_modified(self) -> bool {
        self == Change::Modified
    }
}

impl From<bool> for Change {
    fn from(modified: bool) -> Self {
        if modified {
            Change::Modified
        } else {
            Change::Unmodified
        }
    }
}

impl std::ops::BitOr for Change {
    type Output = Change;

    fn bitor(self, rhs: Change) -> Change {
        Change::from(self.is_modified() || rhs.is_modified())
    }
}

impl std::ops::BitOrAssign for Change {
    fn bitor_assign(&mut self, rhs: Change) {
        *self = *self | rhs;
    }
}

/// Why a command was refused. A rejected command never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Already joined")]
    AlreadyJoined,

    #[error("Room is full")]
    RoomFull,

    #[error("Not joined game")]
    NotJoined,

    /// The ship has been destroyed
    #[error("Invalid action")]
    InvalidAction,

    #[error("Reloading")]
    Reloading,
}

pub type CommandResult = Result<Change, CommandError>;
