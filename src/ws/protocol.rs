//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{Command, Orientation, PlayerId, Snapshot};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Take a ship in the room
    Join,

    /// Steering input, held until replaced
    SetOrientation {
        orientation: Orientation,
        accelerating: bool,
    },

    /// Fire both side batteries
    FireCannon,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

impl ClientMsg {
    /// The room command this message carries, if any
    pub fn command(&self) -> Option<Command> {
        match *self {
            ClientMsg::Join => Some(Command::Join),
            ClientMsg::SetOrientation {
                orientation,
                accelerating,
            } => Some(Command::SetOrientation {
                orientation,
                accelerating,
            }),
            ClientMsg::FireCannon => Some(Command::FireCannon),
            ClientMsg::Ping { .. } => None,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        player: PlayerId,
        room_id: Uuid,
        server_time: u64,
    },

    /// Room state, sent on connect and whenever it changes
    Snapshot { state: Snapshot },

    /// Command accepted
    Ok,

    /// Command refused; nothing changed
    Rejected { reason: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_commands() {
        let msg: ClientMsg = serde_json::from_value(json!({
            "type": "set_orientation",
            "orientation": "RIGHT",
            "accelerating": true
        }))
        .unwrap();
        assert_eq!(
            msg.command(),
            Some(Command::SetOrientation {
                orientation: Orientation::Right,
                accelerating: true
            })
        );

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"fire_cannon"}"#).unwrap();
        assert_eq!(msg.command(), Some(Command::FireCannon));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"ping","t":9}"#).unwrap();
        assert_eq!(msg.command(), None);
    }

    #[test]
    fn rejection_shape() {
        let msg = ServerMsg::Rejected {
            reason: "Reloading".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "rejected", "reason": "Reloading" })
        );
    }

    #[test]
    fn snapshot_is_nested_under_state() {
        let msg = ServerMsg::Snapshot {
            state: Snapshot::empty(77),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "snapshot",
                "state": { "ships": [], "cannonBalls": [], "updatedAt": 77 }
            })
        );
    }
}
