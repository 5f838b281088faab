//! Sprite animation clips driven by accumulated delta time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimState {
    Idle,
    Walk,
    Hurt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

/// Frame timing for one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub frame_count: u8,
    /// Seconds per frame.
    pub frame_secs: f32,
    pub looping: bool,
}

/// Clip set for one kind of actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSet {
    pub idle: Clip,
    pub walk: Clip,
    pub hurt: Clip,
}

impl ClipSet {
    pub const PLAYER: Self = Self {
        idle: Clip { frame_count: 4, frame_secs: 0.200, looping: true },
        walk: Clip { frame_count: 4, frame_secs: 0.150, looping: true },
        hurt: Clip { frame_count: 4, frame_secs: 0.100, looping: false },
    };

    pub const NPC: Self = Self {
        idle: Clip { frame_count: 4, frame_secs: 0.250, looping: true },
        walk: Clip { frame_count: 4, frame_secs: 0.180, looping: true },
        hurt: Clip { frame_count: 4, frame_secs: 0.120, looping: false },
    };

    pub fn clip(&self, state: AnimState) -> Clip {
        match state {
            AnimState::Idle => self.idle,
            AnimState::Walk => self.walk,
            AnimState::Hurt => self.hurt,
        }
    }
}

/// Per-character animation cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub state: AnimState,
    pub frame: u8,
    pub elapsed: f32,
    pub facing: Facing,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            state: AnimState::Idle,
            frame: 0,
            elapsed: 0.0,
            facing: Facing::Right,
        }
    }
}

impl Animation {
    /// Start the one-shot hurt clip.
    pub fn hurt(&mut self) {
        self.state = AnimState::Hurt;
        self.frame = 0;
        self.elapsed = 0.0;
    }

    /// Advance by `delta` seconds.
    ///
    /// `direction_x` is -1, 0 or 1; zero keeps the current facing.
    /// Returns true when the visible frame, state or facing changed.
    pub fn advance(&mut self, clips: &ClipSet, delta: f32, moving: bool, direction_x: i8) -> bool {
        let before = (self.state, self.frame, self.facing);

        let current = clips.clip(self.state);
        let finished = !current.looping && self.frame + 1 >= current.frame_count;
        let next_state = match self.state {
            AnimState::Hurt if !finished => AnimState::Hurt,
            _ if moving => AnimState::Walk,
            _ => AnimState::Idle,
        };
        if next_state != self.state {
            self.state = next_state;
            self.frame = 0;
            self.elapsed = 0.0;
        }

        match direction_x.signum() {
            -1 => self.facing = Facing::Left,
            1 => self.facing = Facing::Right,
            _ => {}
        }

        let clip = clips.clip(self.state);
        self.elapsed += delta;
        while self.elapsed >= clip.frame_secs {
            self.elapsed -= clip.frame_secs;
            if clip.looping {
                self.frame = (self.frame + 1) % clip.frame_count;
            } else if self.frame + 1 < clip.frame_count {
                self.frame += 1;
            } else {
                self.elapsed = 0.0;
                break;
            }
        }

        before != (self.state, self.frame, self.facing)
    }
}

/// Map a horizontal velocity to a facing direction with a dead-zone.
pub fn direction_from_velocity(vx: f32, deadzone: f32) -> i8 {
    if vx < -deadzone {
        -1
    } else if vx > deadzone {
        1
    } else {
        0
    }
}
