//! Threat actors. Each kind lives in its own `Option` slot on the world, so
//! at most one instance of a kind exists at a time.

use hecs::Entity;
use hauntwood_logic::animation::Facing;
use hauntwood_logic::geometry::Vec3;
use serde::{Deserialize, Serialize};

/// A pursuing spirit. Kills on contact.
#[derive(Debug, Clone)]
pub struct Ghost {
    pub position: Vec3,
    pub target: Entity,
    pub speed: f32,
    pub facing: Facing,
}

impl Ghost {
    pub fn new(position: Vec3, target: Entity, speed: f32) -> Self {
        Self {
            position,
            target,
            speed,
            facing: Facing::Right,
        }
    }

    /// Move toward `goal` and report the remaining ground distance.
    pub fn pursue(&mut self, goal: Vec3, delta: f32) -> f32 {
        let dir = self.position.ground_direction(&goal);
        if dir.x < 0.0 {
            self.facing = Facing::Left;
        } else if dir.x > 0.0 {
            self.facing = Facing::Right;
        }
        self.position = hauntwood_logic::movement::step_toward(self.position, goal, self.speed, delta);
        self.position.ground_distance(&goal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TigerPhase {
    Approaching,
    Attacking,
    Fleeing,
    Finished,
}

/// An ambush predator that charges in from the map edge, strikes, and runs.
#[derive(Debug, Clone)]
pub struct Tiger {
    pub position: Vec3,
    pub spawn_point: Vec3,
    pub target: Entity,
    pub phase: TigerPhase,
    /// Time spent in the attacking phase.
    pub timer: f32,
    pub flee_target: Vec3,
}

impl Tiger {
    pub fn new(spawn_point: Vec3, target: Entity) -> Self {
        Self {
            position: spawn_point,
            spawn_point,
            target,
            phase: TigerPhase::Approaching,
            timer: 0.0,
            flee_target: spawn_point * 1.5,
        }
    }

    /// Phases only move forward.
    pub fn advance_to(&mut self, phase: TigerPhase) {
        if phase > self.phase {
            self.phase = phase;
            self.timer = 0.0;
        }
    }
}

/// A slow walking pursuer that respects obstacles.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub position: Vec3,
    pub target: Entity,
    pub speed: f32,
}
