//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{RoomRegistry, RoomSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            rooms: Arc::new(RoomRegistry::new()),
        }
    }

    /// Settings for a freshly created room, with a random seed
    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            tick_interval: self.config.tick_interval(),
            max_tick_delta: self.config.max_tick_delta,
            ..RoomSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn room_settings_follow_config() {
        let config = Config::from_lookup(|key| match key {
            "TICK_RATE_HZ" => Some("10".to_string()),
            "MAX_TICK_DELTA_MS" => Some("400".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::new(config);

        let settings = state.room_settings();
        assert_eq!(settings.tick_interval, Duration::from_millis(100));
        assert_eq!(settings.max_tick_delta, Duration::from_millis(400));
        assert_eq!(state.rooms.active_rooms(), 0);
    }
}
