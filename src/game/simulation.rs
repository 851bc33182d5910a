//! Authoritative room simulation
//!
//! A `Simulation` is owned by exactly one room task. Commands and ticks take
//! `&mut self`, so a command can never observe a half-applied tick.

use std::collections::{HashMap, HashSet};
use std::f32::consts::FRAC_PI_2;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::cannon_ball::{CannonBall, CannonBallId};
use super::command::{Change, Command, CommandError, CommandResult, Orientation};
use super::geometry::{intersects, Shape};
use super::ship::Ship;
use super::snapshot::Snapshot;
use super::tuning::Tuning;
use super::PlayerId;

/// Upper bound (inclusive) of generated cannon ball ids
const MAX_CANNON_BALL_ID: CannonBallId = 1_000_000;

pub struct Simulation {
    tuning: Tuning,
    /// Ships in join order
    ships: Vec<Ship>,
    /// Player -> index into `ships`
    ship_index: HashMap<PlayerId, usize>,
    cannon_balls: Vec<CannonBall>,
    rng: ChaCha8Rng,
    updated_at: u64,
}

impl Simulation {
    pub fn new(tuning: Tuning, seed: u64, now: u64) -> Self {
        Self {
            tuning,
            ships: Vec::new(),
            ship_index: HashMap::new(),
            cannon_balls: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            updated_at: now,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    pub fn ship(&self, player: &PlayerId) -> Option<&Ship> {
        self.ship_index.get(player).map(|&i| &self.ships[i])
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn cannon_balls(&self) -> &[CannonBall] {
        &self.cannon_balls
    }

    /// Dispatch a player command issued at `now` (ms)
    pub fn apply(&mut self, player: &PlayerId, command: Command, now: u64) -> CommandResult {
        let result = match command {
            Command::Join => self.join(player),
            Command::SetOrientation {
                orientation,
                accelerating,
            } => self.set_orientation(player, orientation, accelerating),
            Command::FireCannon => self.fire_cannon(player, now),
        };

        match result {
            Ok(change) => {
                if change.is_modified() {
                    self.touch(now);
                }
            }
            Err(err) => {
                debug!(player = %player, command = command.name(), reason = %err, "Command rejected");
            }
        }
        result
    }

    pub fn join(&mut self, player: &PlayerId) -> CommandResult {
        if self.ship_index.contains_key(player) {
            return Err(CommandError::AlreadyJoined);
        }
        if self.ships.len() >= self.tuning.room_capacity {
            return Err(CommandError::RoomFull);
        }

        let (x, y) = self.spawn_point();
        self.ship_index.insert(player.clone(), self.ships.len());
        self.ships
            .push(Ship::new(player.clone(), x, y, self.tuning.ship));

        info!(player = %player, x, y, ships = self.ships.len(), "Ship joined");
        Ok(Change::Modified)
    }

    pub fn set_orientation(
        &mut self,
        player: &PlayerId,
        orientation: Orientation,
        accelerating: bool,
    ) -> CommandResult {
        let ship = self.ship_mut(player)?;
        ship.set_orientation(orientation, accelerating)?;
        Ok(Change::Modified)
    }

    pub fn fire_cannon(&mut self, player: &PlayerId, now: u64) -> CommandResult {
        let ship = self.ship_mut(player)?;
        ship.fire(now)?;
        let (x, y, angle) = (ship.x, ship.y, ship.angle);

        for offset in [FRAC_PI_2, -FRAC_PI_2] {
            let id = self.next_cannon_ball_id();
            self.cannon_balls.push(CannonBall::new(
                id,
                player.clone(),
                x,
                y,
                angle + offset,
                self.tuning.cannon,
            ));
        }

        debug!(player = %player, x, y, "Broadside fired");
        Ok(Change::Modified)
    }

    /// Advance the room by `dt` seconds, stamping `now` (ms) if anything changed
    pub fn tick(&mut self, dt: f32, now: u64) -> Change {
        let mut change = self.move_ships(dt);
        change |= self.move_cannon_balls(dt);
        change |= self.resolve_hits();

        if change.is_modified() {
            self.touch(now);
        }
        change
    }

    /// `updated_at` never moves backwards
    fn touch(&mut self, now: u64) {
        self.updated_at = self.updated_at.max(now);
    }

    /// Every player sees the whole room
    pub fn snapshot(&self, _for_player: Option<&PlayerId>) -> Snapshot {
        Snapshot {
            ships: self.ships.iter().map(Ship::view).collect(),
            cannon_balls: self.cannon_balls.iter().map(CannonBall::view).collect(),
            updated_at: self.updated_at,
        }
    }

    fn ship_mut(&mut self, player: &PlayerId) -> Result<&mut Ship, CommandError> {
        let index = *self.ship_index.get(player).ok_or(CommandError::NotJoined)?;
        Ok(&mut self.ships[index])
    }

    fn spawn_point(&mut self) -> (f32, f32) {
        let arena = self.tuning.arena;
        let x = self.rng.gen_range(0..arena.width as u32) as f32;
        let y = self.rng.gen_range(0..arena.height as u32) as f32;
        (x, y)
    }

    /// Random id not used by any live cannon ball
    fn next_cannon_ball_id(&mut self) -> CannonBallId {
        loop {
            let id = self.rng.gen_range(0..=MAX_CANNON_BALL_ID);
            if !self.cannon_balls.iter().any(|c| c.id == id) {
                return id;
            }
        }
    }

    /// Ships that sail off the map are wrecked on the spot
    fn move_ships(&mut self, dt: f32) -> Change {
        let arena = self.tuning.arena;
        let mut change = Change::Unmodified;

        for ship in &mut self.ships {
            change |= Change::from(ship.tick(dt));

            if !ship.is_destroyed() && !arena.contains(ship.x, ship.y) {
                ship.destroy();
                info!(player = %ship.player, x = ship.x, y = ship.y, "Ship left the map");
                change = Change::Modified;
            }
        }
        change
    }

    fn move_cannon_balls(&mut self, dt: f32) -> Change {
        if self.cannon_balls.is_empty() {
            return Change::Unmodified;
        }

        let arena = self.tuning.arena;
        for ball in &mut self.cannon_balls {
            ball.tick(dt);
        }
        self.cannon_balls.retain(|c| arena.contains(c.x, c.y));
        Change::Modified
    }

    /// Pairwise sweep after all movement. Each ball hits at most one ship and
    /// wrecks still stop shots; spent balls are removed once the sweep is done.
    fn resolve_hits(&mut self) -> Change {
        let mut spent: HashSet<CannonBallId> = HashSet::new();

        for ball in &self.cannon_balls {
            let body = Shape::from(ball.body());
            let target = self.ships.iter_mut().find(|ship| {
                ship.player != ball.fired_by
                    && intersects(&Shape::from(ship.hull()), &body)
            });

            if let Some(ship) = target {
                ship.handle_collision();
                spent.insert(ball.id);
                info!(
                    target = %ship.player,
                    shooter = %ball.fired_by,
                    cannon_ball = ball.id,
                    hit_count = ship.hit_count,
                    "Ship hit"
                );
            }
        }

        if spent.is_empty() {
            return Change::Unmodified;
        }
        self.cannon_balls.retain(|c| !spent.contains(&c.id));
        Change::Modified
    }
}
