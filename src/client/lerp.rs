//! Per-entity blending of room snapshots

use crate::game::{CannonBallView, ShipView, Snapshot};

use super::buffer::Interpolate;

/// Entities are matched by identity. Anything only in `to` pops in as is,
/// anything only in `from` is gone. Headings are blended linearly without
/// wrapping, so a turn across ±π sweeps the long way round.
impl Interpolate for Snapshot {
    fn interpolate(from: &Self, to: &Self, pct: f64, now: u64) -> Self {
        if pct >= 1.0 {
            return Snapshot {
                updated_at: now,
                ..to.clone()
            };
        }

        let pct = pct as f32;
        Snapshot {
            ships: to
                .ships
                .iter()
                .map(|to_ship| match from.ship(&to_ship.player) {
                    Some(from_ship) => lerp_ship(from_ship, to_ship, pct),
                    None => to_ship.clone(),
                })
                .collect(),
            cannon_balls: to
                .cannon_balls
                .iter()
                .map(|to_ball| match from.cannon_ball(to_ball.id) {
                    Some(from_ball) => lerp_cannon_ball(from_ball, to_ball, pct),
                    None => to_ball.clone(),
                })
                .collect(),
            updated_at: now,
        }
    }
}

fn lerp(from: f32, to: f32, pct: f32) -> f32 {
    from + (to - from) * pct
}

fn lerp_ship(from: &ShipView, to: &ShipView, pct: f32) -> ShipView {
    ShipView {
        player: to.player.clone(),
        x: lerp(from.x, to.x, pct),
        y: lerp(from.y, to.y, pct),
        angle: lerp(from.angle, to.angle, pct),
        // Damage shows as soon as we start moving toward the hit
        hit_count: if pct > 0.0 { to.hit_count } else { from.hit_count },
    }
}

fn lerp_cannon_ball(from: &CannonBallView, to: &CannonBallView, pct: f32) -> CannonBallView {
    CannonBallView {
        id: to.id,
        x: lerp(from.x, to.x, pct),
        y: lerp(from.y, to.y, pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::buffer::InterpolationBuffer;
    use crate::game::PlayerId;

    fn ship(name: &str, x: f32, angle: f32, hit_count: u8) -> ShipView {
        ShipView {
            player: PlayerId::from(name),
            x,
            y: 100.0,
            angle,
            hit_count,
        }
    }

    fn ball(id: u32, x: f32) -> CannonBallView {
        CannonBallView { id, x, y: 50.0 }
    }

    fn snapshot(ships: Vec<ShipView>, cannon_balls: Vec<CannonBallView>, at: u64) -> Snapshot {
        Snapshot {
            ships,
            cannon_balls,
            updated_at: at,
        }
    }

    #[test]
    fn halfway_blend() {
        let from = snapshot(vec![ship("a", 0.0, 0.0, 0)], vec![ball(1, 10.0)], 0);
        let to = snapshot(vec![ship("a", 100.0, 1.0, 1)], vec![ball(1, 30.0)], 100);

        let mid = Snapshot::interpolate(&from, &to, 0.5, 50);
        assert_eq!(mid.ships[0].x, 50.0);
        assert_eq!(mid.ships[0].y, 100.0);
        assert_eq!(mid.ships[0].angle, 0.5);
        assert_eq!(mid.ships[0].hit_count, 1);
        assert_eq!(mid.cannon_balls[0].x, 20.0);
        assert_eq!(mid.updated_at, 50);
    }

    #[test]
    fn endpoints_are_exact() {
        let from = snapshot(vec![ship("a", 3.3, 0.7, 1)], vec![], 0);
        let to = snapshot(vec![ship("a", 9.1, -2.9, 2)], vec![], 100);

        let start = Snapshot::interpolate(&from, &to, 0.0, 0);
        assert_eq!(start.ships, from.ships);
        let end = Snapshot::interpolate(&from, &to, 1.0, 100);
        assert_eq!(end.ships, to.ships);
    }

    #[test]
    fn spawned_entities_pop_in_and_despawned_vanish() {
        let from = snapshot(vec![ship("a", 0.0, 0.0, 0)], vec![ball(1, 10.0)], 0);
        let to = snapshot(
            vec![ship("a", 10.0, 0.0, 0), ship("b", 500.0, 2.0, 0)],
            vec![ball(2, 70.0)],
            100,
        );

        let mid = Snapshot::interpolate(&from, &to, 0.25, 25);
        assert_eq!(mid.ships.len(), 2);
        assert_eq!(mid.ships[1], to.ships[1]);
        assert_eq!(mid.cannon_balls, vec![ball(2, 70.0)]);
    }

    #[test]
    fn heading_takes_the_long_way_across_pi() {
        let from = snapshot(vec![ship("a", 0.0, 3.0, 0)], vec![], 0);
        let to = snapshot(vec![ship("a", 0.0, -3.0, 0)], vec![], 100);

        let mid = Snapshot::interpolate(&from, &to, 0.5, 50);
        assert!(mid.ships[0].angle.abs() < 1e-6);
    }

    #[test]
    fn buffered_room_snapshots() {
        let resting = snapshot(vec![ship("a", 0.0, 0.0, 0)], vec![], 0);
        let mut buf = InterpolationBuffer::new(resting, 0);
        buf.enqueue(snapshot(vec![ship("a", 10.0, 0.0, 0)], vec![], 100), 100);

        assert_eq!(buf.query(0).ships[0].x, 0.0);
        let mid = buf.query(50);
        assert_eq!(mid.ships[0].x, 5.0);
        assert_eq!(mid.updated_at, 50);

        let done = buf.query(100);
        assert_eq!(done.ships[0].x, 10.0);
        assert_eq!(done.updated_at, 100);
    }
}
