//! Player ship: steering, arcade motion, reload clock and damage

use super::command::{CommandError, Orientation};
use super::geometry::OrientedRect;
use super::snapshot::ShipView;
use super::tuning::ShipStats;
use super::PlayerId;

/// Authoritative ship state
#[derive(Debug, Clone)]
pub struct Ship {
    pub player: PlayerId,
    pub x: f32,
    pub y: f32,
    /// Heading in radians, not normalised
    pub angle: f32,
    pub orientation: Orientation,
    pub accelerating: bool,
    /// Scalar speed along the heading, within [0, max_velocity]
    pub velocity: f32,
    pub hit_count: u8,
    /// Server time (ms) of the last accepted broadside
    pub last_fired_at: Option<u64>,
    stats: ShipStats,
}

impl Ship {
    pub fn new(player: PlayerId, x: f32, y: f32, stats: ShipStats) -> Self {
        Self {
            player,
            x,
            y,
            angle: 0.0,
            orientation: Orientation::Forward,
            accelerating: false,
            velocity: 0.0,
            hit_count: 0,
            last_fired_at: None,
            stats,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_count >= self.stats.max_hits
    }

    pub fn set_orientation(
        &mut self,
        orientation: Orientation,
        accelerating: bool,
    ) -> Result<(), CommandError> {
        if self.is_destroyed() {
            return Err(CommandError::InvalidAction);
        }
        self.orientation = orientation;
        self.accelerating = accelerating;
        Ok(())
    }

    /// Start a broadside at `now` (ms). The reload clock only moves on success.
    pub fn fire(&mut self, now: u64) -> Result<(), CommandError> {
        if self.is_destroyed() {
            return Err(CommandError::InvalidAction);
        }
        if let Some(last) = self.last_fired_at {
            if now.saturating_sub(last) < self.stats.reload_time_ms {
                return Err(CommandError::Reloading);
            }
        }
        self.last_fired_at = Some(now);
        Ok(())
    }

    /// Advance by `dt` seconds. Returns true if the ship turned or moved.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.is_destroyed() {
            return false;
        }

        let turn = self.stats.angular_speed * dt;
        match self.orientation {
            Orientation::Left => self.angle -= turn,
            Orientation::Right => self.angle += turn,
            Orientation::Forward => {}
        }

        let dv = self.stats.acceleration * dt;
        self.velocity = if self.accelerating {
            (self.velocity + dv).min(self.stats.max_velocity)
        } else {
            (self.velocity - dv).max(0.0)
        };

        if self.velocity > 0.0 {
            let (sin, cos) = self.angle.sin_cos();
            self.x += cos * self.velocity * dt;
            self.y += sin * self.velocity * dt;
        }

        let turned = self.orientation != Orientation::Forward && turn != 0.0;
        turned || self.velocity > 0.0
    }

    /// Take one hit. Reaching the cap leaves the ship adrift.
    pub fn handle_collision(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.hit_count += 1;
        if self.is_destroyed() {
            self.become_wreck();
        }
    }

    /// Force the terminal state regardless of remaining hits
    pub fn destroy(&mut self) {
        self.hit_count = self.stats.max_hits;
        self.become_wreck();
    }

    fn become_wreck(&mut self) {
        self.orientation = Orientation::Forward;
        self.accelerating = false;
        self.velocity = 0.0;
    }

    pub fn hull(&self) -> OrientedRect {
        OrientedRect::new(
            self.x,
            self.y,
            self.stats.width,
            self.stats.height,
            self.angle,
        )
    }

    pub fn view(&self) -> ShipView {
        ShipView {
            player: self.player.clone(),
            x: self.x,
            y: self.y,
            angle: self.angle,
            hit_count: self.hit_count,
        }
    }
}
