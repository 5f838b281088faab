//! Village layout: boundary tree line, spawn safety and altar placement

use hauntwood_logic::constants::npc::SAFE_SPAWN_ATTEMPTS;
use hauntwood_logic::constants::ritual::{ALTAR_CLEAR_RADIUS, ALTAR_COUNT, ALTAR_FIELD};
use hauntwood_logic::constants::character::{HEIGHT, WIDTH};
use hauntwood_logic::geometry::{Aabb, Vec3, WorldBounds};
use rand::Rng;

use crate::world::Altar;

/// Spacing between boundary trees.
const TREE_SPACING: f32 = 6.0;
const TREE_SIZE: Vec3 = Vec3::new(1.0, 8.0, 1.0);

fn tree(x: f32, z: f32) -> Aabb {
    Aabb::new(Vec3::new(x, TREE_SIZE.y / 2.0, z), TREE_SIZE)
}

/// Tree colliders along the left, right and far edges. The near edge is open.
pub fn boundary_trees(bounds: &WorldBounds) -> Vec<Aabb> {
    let mut trees = Vec::new();
    let mut z = bounds.min_z;
    while z <= bounds.max_z {
        trees.push(tree(bounds.min_x, z));
        trees.push(tree(bounds.max_x, z));
        z += TREE_SPACING;
    }
    let mut x = bounds.min_x;
    while x <= bounds.max_x {
        trees.push(tree(x, bounds.min_z));
        x += TREE_SPACING;
    }
    trees
}

fn is_clear(at: Vec3, collidables: &[Aabb]) -> bool {
    let body = Aabb::character(at, WIDTH, HEIGHT);
    !collidables.iter().any(|c| body.intersects(c))
}

/// `desired` if a character fits there, else a random clear point, else the origin.
pub fn safe_spawn(desired: Vec3, collidables: &[Aabb], bounds: &WorldBounds, rng: &mut impl Rng) -> Vec3 {
    if is_clear(desired, collidables) {
        return desired;
    }
    for _ in 0..SAFE_SPAWN_ATTEMPTS {
        let candidate = Vec3::new(
            rng.gen_range(bounds.min_x..=bounds.max_x),
            desired.y,
            rng.gen_range(bounds.min_z..=bounds.max_z),
        );
        if is_clear(candidate, collidables) {
            return candidate;
        }
    }
    log::warn!("no clear spawn near {:?}, using origin", desired);
    Vec3::new(0.0, desired.y, 0.0)
}

/// Scatter active altars across the field, away from the central clearing.
pub fn place_altars(rng: &mut impl Rng) -> Vec<Altar> {
    (0..ALTAR_COUNT)
        .map(|_| loop {
            let x = rng.gen_range(-ALTAR_FIELD..ALTAR_FIELD);
            let z = rng.gen_range(-ALTAR_FIELD..ALTAR_FIELD);
            let position = Vec3::ground(x, z);
            if position.length() >= ALTAR_CLEAR_RADIUS {
                break Altar {
                    position,
                    active: true,
                };
            }
        })
        .collect()
}
