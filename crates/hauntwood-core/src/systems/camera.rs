//! Camera director: picks a subject, eases toward it, then layers bob and shake.

use hauntwood_logic::camera::{bob_offset, follow_offset, CameraShake};
use hauntwood_logic::constants::camera::{FOLLOW_LERP, MAP_HEIGHT, MAP_LERP};
use hauntwood_logic::geometry::Vec3;
use rand::Rng;
use serde::Serialize;

use super::cinematics::cinematic_camera;
use crate::state::{GameMode, SuspendSet};
use crate::world::{CameraMode, WorldState};

/// Where the camera wants to be this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGoal {
    pub look_at: Vec3,
    pub offset: Vec3,
    /// Fraction of the remaining distance covered per tick.
    pub lerp: f32,
}

impl CameraGoal {
    pub fn new(look_at: Vec3, offset: Vec3, lerp: f32) -> Self {
        Self {
            look_at,
            offset,
            lerp,
        }
    }

    fn follow(subject: Vec3) -> Self {
        Self::new(subject, follow_offset(), FOLLOW_LERP)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CameraRig {
    /// Smoothed position before bob and shake.
    pub position: Vec3,
    pub look_at: Vec3,
    /// Bob plus shake applied on top of `position` this tick.
    pub jitter: Vec3,
    pub bob_secs: f32,
    pub shake: CameraShake,
}

impl CameraRig {
    pub fn eye(&self) -> Vec3 {
        self.position + self.jitter
    }

    /// Jump straight to the follow pose for `subject`.
    pub fn snap_to(&mut self, subject: Vec3) {
        self.position = subject + follow_offset();
        self.look_at = subject;
        self.jitter = Vec3::ZERO;
    }

    fn ease(&mut self, goal: CameraGoal) {
        self.position = self.position.lerp(&(goal.look_at + goal.offset), goal.lerp);
        self.look_at = self.look_at.lerp(&goal.look_at, goal.lerp);
    }
}

/// Subject for free play, highest priority first.
///
/// Ritual threats only hold the camera while `camera_mode` says so.
fn gameplay_subject(world: &WorldState) -> Option<Vec3> {
    let lightning = world.lightning.and_then(|l| world.position(l.target));
    let tiger = world.tiger.as_ref().map(|t| t.position);
    match world.mode {
        GameMode::Ritual => {
            let mode = world.camera_mode;
            let pending = world
                .ritual
                .as_ref()
                .and_then(|r| r.pending_death)
                .and_then(|p| world.position(p.victim));
            let ghost = world.ghost.as_ref().map(|g| g.position);
            pending
                .or(tiger.filter(|_| mode == CameraMode::TigerFollow))
                .or(lightning.filter(|_| mode == CameraMode::EventFocus))
                .or(ghost.filter(|_| mode == CameraMode::GhostFollow))
                .or_else(|| world.controlled_position())
        }
        GameMode::Story => tiger.or(lightning).or_else(|| world.controlled_position()),
    }
}

pub fn camera_system(world: &mut WorldState, delta: f32, suspended: &SuspendSet) {
    if world.camera_mode == CameraMode::Intro {
        return;
    }

    let goal = if let Some(map) = world.ui.map_view {
        Some(CameraGoal::new(map.target, Vec3::new(0.0, MAP_HEIGHT, 0.0), MAP_LERP))
    } else if let Some(goal) = cinematic_camera(world) {
        Some(goal)
    } else {
        gameplay_subject(world).map(CameraGoal::follow)
    };
    if let Some(goal) = goal {
        world.camera.ease(goal);
    }

    let walking = world
        .controlled
        .and_then(|e| world.ecs.get::<&crate::components::CharacterState>(e).ok().map(|c| c.moving))
        .unwrap_or(false);
    let mut jitter = Vec3::ZERO;
    if walking && !suspended.any_ui() && world.cinematic.is_none() {
        world.camera.bob_secs += delta;
        let noise = (world.rng.gen::<f32>() - 0.5, world.rng.gen::<f32>() - 0.5);
        jitter += bob_offset(world.camera.bob_secs, noise);
    } else {
        world.camera.bob_secs = 0.0;
    }
    if world.camera.shake.is_active() {
        let noise = (world.rng.gen::<f32>() - 0.5, world.rng.gen::<f32>() - 0.5);
        jitter += world.camera.shake.advance(delta, noise);
    }
    world.camera.jitter = jitter;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CharacterState, ClipKind, Ghost, Npc, Player, Tiger};
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use crate::systems::LightningStrike;
    use crate::world::MapView;
    use hauntwood_logic::timers::Countdown;

    fn world() -> WorldState {
        let content = CaseContent::from_json(r#"{ "id": "t", "npcs": [ { "id": "a", "name": "A" } ] }"#).unwrap();
        let mut w = WorldState::new(ModeConfig::story(), content);
        let npc = w.ecs.spawn((
            CharacterState::new("a", Vec3::ground(30.0, 0.0), 2.0, ClipKind::Npc),
            Npc::new("A", "", 0, 5.0),
        ));
        w.roster.push(npc);
        let p = w.ecs.spawn((CharacterState::new("player", Vec3::ZERO, 5.0, ClipKind::Player), Player));
        w.player = Some(p);
        w.controlled = Some(p);
        w.camera.snap_to(Vec3::ZERO);
        w
    }

    #[test]
    fn follows_controlled_with_offset() {
        let mut w = world();
        for _ in 0..200 {
            camera_system(&mut w, 0.016, &SuspendSet::empty());
        }
        assert!((w.camera.position - follow_offset()).length() < 1e-3);
    }

    #[test]
    fn lightning_victim_outranks_player() {
        let mut w = world();
        w.lightning = Some(LightningStrike::new(w.roster[0]));
        for _ in 0..300 {
            camera_system(&mut w, 0.016, &SuspendSet::empty());
        }
        assert!((w.camera.look_at.x - 30.0).abs() < 0.1);
    }

    #[test]
    fn map_view_overrides_everything() {
        let mut w = world();
        w.lightning = Some(LightningStrike::new(w.roster[0]));
        w.ui.map_view = Some(MapView {
            target: Vec3::ground(-20.0, 10.0),
            remaining: Countdown::new(3.5),
        });
        for _ in 0..400 {
            camera_system(&mut w, 0.016, &SuspendSet::empty());
        }
        assert!((w.camera.position - Vec3::new(-20.0, 40.0, 10.0)).length() < 0.1);
    }

    fn ritual_world() -> WorldState {
        let content = CaseContent::from_json(
            r#"{ "id": "t", "npcs": [ { "id": "a", "name": "A" }, { "id": "b", "name": "B" } ] }"#,
        )
        .unwrap();
        let mut w = WorldState::new(ModeConfig::ritual(), content);
        for (id, x) in [("a", 0.0), ("b", 30.0)] {
            let npc = w.ecs.spawn((
                CharacterState::new(id, Vec3::ground(x, 0.0), 2.0, ClipKind::Npc),
                Npc::new(id, "Survivor", w.roster.len(), 5.0),
            ));
            w.roster.push(npc);
        }
        w.controlled = Some(w.roster[0]);
        w.camera_mode = CameraMode::PlayerFollow;
        w.camera.snap_to(Vec3::ZERO);
        w
    }

    fn settle(w: &mut WorldState) {
        for _ in 0..400 {
            camera_system(w, 0.016, &SuspendSet::empty());
        }
    }

    #[test]
    fn ritual_ghost_needs_ghost_follow() {
        let mut w = ritual_world();
        w.ghost = Some(Ghost::new(Vec3::ground(-60.0, -60.0), w.roster[1], 4.0));
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ZERO) < 0.1);

        w.camera_mode = CameraMode::GhostFollow;
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ground(-60.0, -60.0)) < 0.1);
    }

    #[test]
    fn ritual_tiger_needs_tiger_follow() {
        let mut w = ritual_world();
        let mut tiger = Tiger::new(Vec3::ground(100.0, 40.0), w.roster[0]);
        tiger.position = Vec3::ground(100.0, 40.0);
        w.tiger = Some(tiger);
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ZERO) < 0.1);

        w.camera_mode = CameraMode::TigerFollow;
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ground(100.0, 40.0)) < 0.1);
    }

    #[test]
    fn ritual_lightning_needs_event_focus() {
        let mut w = ritual_world();
        w.lightning = Some(LightningStrike::new(w.roster[1]));
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ZERO) < 0.1);

        w.camera_mode = CameraMode::EventFocus;
        settle(&mut w);
        assert!(w.camera.look_at.ground_distance(&Vec3::ground(30.0, 0.0)) < 0.1);
    }

    #[test]
    fn bob_restarts_after_stopping() {
        let mut w = world();
        let p = w.controlled.unwrap();
        w.ecs.get::<&mut CharacterState>(p).unwrap().moving = true;
        for _ in 0..30 {
            camera_system(&mut w, 0.016, &SuspendSet::empty());
        }
        assert!(w.camera.bob_secs > 0.4);

        w.ecs.get::<&mut CharacterState>(p).unwrap().moving = false;
        camera_system(&mut w, 0.016, &SuspendSet::empty());
        assert_eq!(w.camera.bob_secs, 0.0);
    }
}
