//! Pure movement logic: input shaping, velocity smoothing, wall-sliding.
//!
//! Algorithm: "advance, clamp, reject per axis"
//! 1. Advance X alone, clamp into world bounds, reject if the character box
//!    overlaps any collidable
//! 2. Repeat for Z starting from the (possibly rejected) X result
//! 3. A rejected axis keeps its old coordinate, so the character slides
//!    along the obstacle on the other axis

use crate::constants::character::{MOVING_THRESHOLD_SQ, VELOCITY_LERP, VELOCITY_SNAP_SQ};
use crate::geometry::{Aabb, Vec3, WorldBounds};

/// Footprint of the moving body.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub width: f32,
    pub height: f32,
}

/// Result of an axis-separated move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub position: Vec3,
    pub blocked_x: bool,
    pub blocked_z: bool,
}

fn overlaps_any(feet: Vec3, body: Body, collidables: &[Aabb]) -> bool {
    let b = Aabb::character(feet, body.width, body.height);
    collidables.iter().any(|c| b.intersects(c))
}

/// Move `position` by `displacement` with per-axis collision rejection.
///
/// `collidables == None` means unobstructed movement (cinematic forced
/// moves); bounds clamping still applies.
pub fn move_with_collisions(
    position: Vec3,
    displacement: Vec3,
    body: Body,
    collidables: Option<&[Aabb]>,
    bounds: &WorldBounds,
) -> MoveOutcome {
    let start = bounds.clamp(position);
    let mut out = MoveOutcome {
        position: start,
        blocked_x: false,
        blocked_z: false,
    };

    let try_x = Vec3::new(bounds.clamp_x(start.x + displacement.x), start.y, start.z);
    match collidables {
        Some(list) if overlaps_any(try_x, body, list) => out.blocked_x = true,
        _ => out.position = try_x,
    }

    let try_z = Vec3::new(
        out.position.x,
        out.position.y,
        bounds.clamp_z(out.position.z + displacement.z),
    );
    match collidables {
        Some(list) if overlaps_any(try_z, body, list) => out.blocked_z = true,
        _ => out.position = try_z,
    }

    out
}

/// Turn an analog stick reading into a target velocity on the ground plane.
/// Readings longer than 1 are normalized so diagonals are not faster.
pub fn input_velocity(move_x: f32, move_z: f32, speed: f32) -> Vec3 {
    let mut v = Vec3::ground(move_x, move_z);
    if v.length_squared() > 1.0 {
        v = v.normalize();
    }
    v * speed
}

/// One tick of exponential velocity smoothing. Small results snap to zero.
pub fn smooth_velocity(current: Vec3, target: Vec3) -> Vec3 {
    let v = current.lerp(&target, VELOCITY_LERP);
    if v.length_squared() < VELOCITY_SNAP_SQ {
        Vec3::ZERO
    } else {
        v
    }
}

pub fn is_moving(velocity: Vec3) -> bool {
    velocity.length_squared() > MOVING_THRESHOLD_SQ
}

/// Step from `from` toward `to` by at most `speed * delta`, never overshooting.
pub fn step_toward(from: Vec3, to: Vec3, speed: f32, delta: f32) -> Vec3 {
    let dist = from.ground_distance(&to);
    let step = speed * delta;
    if dist <= step || dist == 0.0 {
        return Vec3::new(to.x, from.y, to.z);
    }
    from + from.ground_direction(&to) * step
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: Body = Body {
        width: 1.0,
        height: 4.0,
    };

    fn wall_at_x(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x, 2.0, 0.0), Vec3::new(1.0, 8.0, 40.0))
    }

    // --- Basic movement ---

    #[test]
    fn free_move_without_collidables() {
        let b = WorldBounds::square(95.0);
        let res = move_with_collisions(Vec3::ZERO, Vec3::ground(1.0, 2.0), BODY, None, &b);
        assert_eq!(res.position, Vec3::ground(1.0, 2.0));
        assert!(!res.blocked_x && !res.blocked_z);
    }

    #[test]
    fn empty_collidable_list_is_unobstructed() {
        let b = WorldBounds::square(95.0);
        let res = move_with_collisions(Vec3::ZERO, Vec3::ground(1.0, 0.0), BODY, Some(&[]), &b);
        assert_eq!(res.position, Vec3::ground(1.0, 0.0));
    }

    #[test]
    fn clamps_to_world_bounds() {
        let b = WorldBounds::square(95.0);
        let res = move_with_collisions(
            Vec3::ground(94.0, -94.0),
            Vec3::ground(5.0, -5.0),
            BODY,
            None,
            &b,
        );
        assert_eq!(res.position, Vec3::ground(95.0, -95.0));
    }

    // --- Wall slide ---

    #[test]
    fn blocked_axis_slides_on_other() {
        let b = WorldBounds::square(95.0);
        let walls = [wall_at_x(2.0)];
        let res = move_with_collisions(
            Vec3::ground(0.5, 0.0),
            Vec3::ground(1.0, 1.0),
            BODY,
            Some(&walls),
            &b,
        );
        assert!(res.blocked_x);
        assert!(!res.blocked_z);
        assert_eq!(res.position, Vec3::ground(0.5, 1.0));
    }

    // --- Velocity shaping ---

    #[test]
    fn diagonal_input_is_normalized() {
        let v = input_velocity(1.0, 1.0, 5.0);
        assert!((v.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn partial_stick_is_not_amplified() {
        let v = input_velocity(0.5, 0.0, 4.0);
        assert!((v.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn smoothing_approaches_target() {
        let v = smooth_velocity(Vec3::ZERO, Vec3::ground(5.0, 0.0));
        assert!((v.x - 0.5).abs() < 1e-6);
        assert!(is_moving(v));
    }

    #[test]
    fn smoothing_snaps_small_velocity() {
        let v = smooth_velocity(Vec3::ground(0.1, 0.0), Vec3::ZERO);
        assert_eq!(v, Vec3::ZERO);
        assert!(!is_moving(v));
    }

    #[test]
    fn step_toward_does_not_overshoot() {
        let p = step_toward(Vec3::ZERO, Vec3::ground(1.0, 0.0), 10.0, 1.0);
        assert_eq!(p, Vec3::ground(1.0, 0.0));
        let q = step_toward(Vec3::ZERO, Vec3::ground(10.0, 0.0), 2.0, 0.5);
        assert!((q.x - 1.0).abs() < 1e-6);
    }
}
