//! Gameplay constants shared by server simulation and client interpolation

/// Arena width in world units
pub const ARENA_WIDTH: f32 = 1200.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f32 = 900.0;
/// Maximum ships per room
pub const ROOM_CAPACITY: usize = 6;
/// Delay applied to snapshot timestamps on the client before they are shown (ms)
pub const CLIENT_BUFFER_DELAY_MS: u64 = 100;

/// Ship movement and durability constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipStats {
    /// Hull length along the heading
    pub width: f32,
    /// Hull beam
    pub height: f32,
    /// Linear acceleration (units/s²), also used for coasting deceleration
    pub acceleration: f32,
    /// Velocity cap
    pub max_velocity: f32,
    /// Turn rate in radians per second
    pub angular_speed: f32,
    /// Minimum time between broadsides (ms)
    pub reload_time_ms: u64,
    /// Hits it takes to disable the ship
    pub max_hits: u8,
}

impl ShipStats {
    pub const STANDARD: Self = Self {
        width: 113.0,
        height: 66.0,
        acceleration: 5.0,
        max_velocity: 100.0,
        angular_speed: 0.5,
        reload_time_ms: 5000,
        max_hits: 3,
    };
}

impl Default for ShipStats {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Cannon ball ballistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannonStats {
    pub speed: f32,
    pub radius: f32,
}

impl CannonStats {
    pub const STANDARD: Self = Self {
        speed: 400.0,
        radius: 5.0,
    };
}

impl Default for CannonStats {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Playable rectangle `[0, width) x [0, height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub const STANDARD: Self = Self {
        width: ARENA_WIDTH,
        height: ARENA_HEIGHT,
    };

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width && y < self.height
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Everything a room needs to agree on with its clients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub arena: Arena,
    pub ship: ShipStats,
    pub cannon: CannonStats,
    pub room_capacity: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena: Arena::STANDARD,
            ship: ShipStats::STANDARD,
            cannon: CannonStats::STANDARD,
            room_capacity: ROOM_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_is_half_open() {
        let arena = Arena::STANDARD;
        assert!(arena.contains(0.0, 0.0));
        assert!(arena.contains(1199.9, 899.9));
        assert!(!arena.contains(1200.0, 10.0));
        assert!(!arena.contains(10.0, 900.0));
        assert!(!arena.contains(-0.1, 10.0));
    }
}
