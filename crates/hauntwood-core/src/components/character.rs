//! Shared character data: any actor the player or the AI can drive.

use hauntwood_logic::animation::{Animation, ClipSet};
use hauntwood_logic::constants::character::{HEIGHT, MAX_HP, WIDTH};
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::movement::Body;

/// Which clip timings an actor animates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    Player,
    Npc,
}

impl ClipKind {
    pub fn clips(self) -> &'static ClipSet {
        match self {
            ClipKind::Player => &ClipSet::PLAYER,
            ClipKind::Npc => &ClipSet::NPC,
        }
    }
}

/// Position, motion, health and animation of one actor.
#[derive(Debug, Clone)]
pub struct CharacterState {
    /// Stable identifier used in events and snapshots.
    pub id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub hp: f32,
    pub max_hp: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub animation: Animation,
    pub clips: ClipKind,
    pub visible: bool,
    pub moving: bool,
    /// Seconds since the character last moved.
    pub stationary_secs: f32,
    /// Looping footstep sound currently playing, if any.
    pub footsteps: Option<&'static str>,
}

impl CharacterState {
    pub fn new(id: impl Into<String>, position: Vec3, speed: f32, clips: ClipKind) -> Self {
        Self {
            id: id.into(),
            position,
            velocity: Vec3::ZERO,
            hp: MAX_HP,
            max_hp: MAX_HP,
            width: WIDTH,
            height: HEIGHT,
            speed,
            animation: Animation::default(),
            clips,
            visible: true,
            moving: false,
            stationary_secs: 0.0,
            footsteps: None,
        }
    }

    pub fn body(&self) -> Body {
        Body {
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Apply damage and start the hurt clip. Returns true if this hit killed.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.animation.hurt();
        self.is_dead()
    }
}

/// Marker for the story-mode protagonist.
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

#[cfg(test)]
mod tests {
    use super::*;
    use hauntwood_logic::animation::AnimState;

    #[test]
    fn damage_kills_once() {
        let mut c = CharacterState::new("a", Vec3::ZERO, 2.0, ClipKind::Npc);
        assert!(!c.take_damage(40.0));
        assert_eq!(c.animation.state, AnimState::Hurt);
        assert!(c.take_damage(100.0));
        assert!(!c.take_damage(10.0));
        assert_eq!(c.hp, 0.0);
    }
}
