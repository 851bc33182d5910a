//! Cannon balls fired in broadside pairs

use super::geometry::Circle;
use super::snapshot::CannonBallView;
use super::tuning::CannonStats;
use super::PlayerId;

pub type CannonBallId = u32;

/// Straight-line projectile. Heading and speed never change after launch.
#[derive(Debug, Clone)]
pub struct CannonBall {
    pub id: CannonBallId,
    /// Ship that fired it; never damaged by its own shot
    pub fired_by: PlayerId,
    pub x: f32,
    pub y: f32,
    angle: f32,
    stats: CannonStats,
}

impl CannonBall {
    pub fn new(
        id: CannonBallId,
        fired_by: PlayerId,
        x: f32,
        y: f32,
        angle: f32,
        stats: CannonStats,
    ) -> Self {
        Self {
            id,
            fired_by,
            x,
            y,
            angle,
            stats,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn tick(&mut self, dt: f32) {
        let (sin, cos) = self.angle.sin_cos();
        self.x += cos * self.stats.speed * dt;
        self.y += sin * self.stats.speed * dt;
    }

    pub fn body(&self) -> Circle {
        Circle::new(self.x, self.y, self.stats.radius)
    }

    pub fn view(&self) -> CannonBallView {
        CannonBallView {
            id: self.id,
            x: self.x,
            y: self.y,
        }
    }
}
