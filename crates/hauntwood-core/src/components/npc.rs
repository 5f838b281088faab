//! NPC components: identity, status and the behavior state machine.

use hecs::Entity;
use hauntwood_logic::geometry::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcStatus {
    Alive,
    Deceased,
}

/// What drives an NPC this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NpcBehavior {
    /// Standing still until the timer runs out.
    Idle { timer: f32 },
    /// Walking to a random point.
    Wandering { target: Vec3 },
    /// Pacing after another character.
    Following { target: Entity },
    /// Receiving player input (ritual mode).
    Controlled,
    /// Moved by a cinematic.
    Scripted,
    /// Terminal.
    Dead,
}

impl NpcBehavior {
    pub fn following(&self) -> Option<Entity> {
        match self {
            NpcBehavior::Following { target } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub name: String,
    pub role: String,
    pub status: NpcStatus,
    pub behavior: NpcBehavior,
    /// Set once the NPC has stood at a deactivated altar; ghosts prefer others.
    pub ritual_protected: bool,
    /// Position in the roster; used for deterministic ordering.
    pub roster_index: usize,
}

impl Npc {
    pub fn new(name: impl Into<String>, role: impl Into<String>, roster_index: usize, idle: f32) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            status: NpcStatus::Alive,
            behavior: NpcBehavior::Idle { timer: idle },
            ritual_protected: false,
            roster_index,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == NpcStatus::Alive
    }
}
