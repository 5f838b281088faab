//! Opening flythrough along a Catmull-Rom path.

use hauntwood_logic::constants::cinematic::{RITUAL_INTRO_SECS, STORY_INTRO_SECS};
use hauntwood_logic::geometry::{catmull_rom, Vec3};
use rand::Rng;

use crate::state::{GameMode, GameState};
use crate::world::{CameraMode, WorldState};

/// How far ahead on the path the camera looks.
const LOOK_AHEAD: f32 = 0.05;

const STORY_PATH: [Vec3; 6] = [
    Vec3::new(-80.0, 2.0, 80.0),
    Vec3::new(0.0, 1.5, 60.0),
    Vec3::new(70.0, 2.0, 0.0),
    Vec3::new(0.0, 1.5, -50.0),
    Vec3::new(-60.0, 2.5, -60.0),
    Vec3::new(-80.0, 2.0, 80.0),
];

const RITUAL_PATH: [Vec3; 4] = [
    Vec3::new(80.0, 2.0, 80.0),
    Vec3::new(-30.0, 1.5, 40.0),
    Vec3::new(50.0, 2.5, -50.0),
    Vec3::new(0.0, 2.0, 0.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct IntroFlight {
    pub path: Vec<Vec3>,
    pub duration: f32,
    pub elapsed: f32,
}

impl IntroFlight {
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Story => Self {
                path: STORY_PATH.to_vec(),
                duration: STORY_INTRO_SECS,
                elapsed: 0.0,
            },
            GameMode::Ritual => Self {
                path: RITUAL_PATH.to_vec(),
                duration: RITUAL_INTRO_SECS,
                elapsed: 0.0,
            },
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Camera position and look target at the current progress.
    pub fn pose(&self) -> (Vec3, Vec3) {
        let t = self.progress();
        (
            catmull_rom(&self.path, t),
            catmull_rom(&self.path, (t + LOOK_AHEAD).min(1.0)),
        )
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Fly the intro camera; hand over to the mode's next state when done.
pub fn intro_system(world: &mut WorldState, delta: f32) {
    let Some(intro) = world.intro.as_mut() else {
        return;
    };
    intro.elapsed += delta;
    if intro.is_done() {
        finish_intro(world);
        return;
    }
    let (eye, look) = intro.pose();
    let shake = Vec3::new(
        (world.rng.gen::<f32>() - 0.5) * 0.4,
        (world.rng.gen::<f32>() - 0.5) * 0.2,
        (world.rng.gen::<f32>() - 0.5) * 0.4,
    );
    world.camera.position = eye;
    world.camera.look_at = look + shake;
    world.camera.jitter = Vec3::ZERO;
}

/// End the flythrough early or on time.
pub fn finish_intro(world: &mut WorldState) {
    if world.intro.take().is_none() && world.state != GameState::Intro {
        return;
    }
    world.camera_mode = CameraMode::PlayerFollow;
    if let Some(at) = world.controlled_position() {
        world.camera.snap_to(at);
    }
    match world.mode {
        GameMode::Story => world.set_state(GameState::Briefing),
        GameMode::Ritual => world.set_state(GameState::RitualPlaying),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_starts_at_first_point_and_ends_at_last() {
        let mut f = IntroFlight::for_mode(GameMode::Ritual);
        assert_eq!(f.pose().0, RITUAL_PATH[0]);
        f.elapsed = f.duration;
        assert!((f.pose().0 - RITUAL_PATH[3]).length() < 1e-4);
        assert!(f.is_done());
    }

    #[test]
    fn durations_per_mode() {
        assert_eq!(IntroFlight::for_mode(GameMode::Story).duration, 15.0);
        assert_eq!(IntroFlight::for_mode(GameMode::Ritual).duration, 12.0);
    }
}
