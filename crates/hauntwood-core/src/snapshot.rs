//! Per-frame render handoff.
//!
//! A `FrameSnapshot` is a plain copy of everything the renderer and HUD
//! draw. It owns no entity handles, so the host can keep or serialize it
//! freely.

use hauntwood_logic::animation::{AnimState, Facing};
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::weather::{LightingState, Weather};
use serde::Serialize;

use crate::components::{CharacterState, Npc, TigerPhase};
use crate::events::CinematicText;
use crate::state::{GameMode, GameState};
use crate::systems::Prompt;
use crate::world::{Altar, BloodEffect, CameraMode, DeathMarker, WorldState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: String,
    pub name: Option<String>,
    pub position: Vec3,
    pub visible: bool,
    pub anim: AnimState,
    pub frame: u8,
    pub facing: Facing,
    pub hp: f32,
    pub controlled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraView {
    pub eye: Vec3,
    pub look_at: Vec3,
    pub mode: CameraMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatView {
    pub ghost: Option<Vec3>,
    pub tiger: Option<(Vec3, TigerPhase)>,
    pub enemy: Option<Vec3>,
    /// Ghost owned by the running cinematic.
    pub cinematic_ghost: Option<Vec3>,
    pub lightning_target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RitualHud {
    pub survival_secs: f32,
    pub survivors: usize,
    pub altars: Vec<Altar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryHud {
    pub evidence: Vec<String>,
    pub accusations_left: u8,
    pub hint_active: bool,
    pub inventory_open: bool,
    pub journal_open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CinematicView {
    pub kind: &'static str,
    pub phase: String,
    pub phase_elapsed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    pub mode: GameMode,
    pub state: GameState,
    pub camera: CameraView,
    pub entities: Vec<EntityView>,
    pub threats: ThreatView,
    pub prompt: Option<Prompt>,
    pub weather: Weather,
    pub lighting: LightingState,
    pub ritual: Option<RitualHud>,
    pub story: Option<StoryHud>,
    pub cinematic: Option<CinematicView>,
    pub cinematic_text: Option<CinematicText>,
    pub blood: Vec<BloodEffect>,
    pub death_markers: Vec<DeathMarker>,
}

impl FrameSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        let mut entities: Vec<EntityView> = world
            .ecs
            .query::<(&CharacterState, Option<&Npc>)>()
            .iter()
            .map(|(e, (ch, npc))| EntityView {
                id: ch.id.clone(),
                name: npc.map(|n| n.name.clone()),
                position: ch.position,
                visible: ch.visible,
                anim: ch.animation.state,
                frame: ch.animation.frame,
                facing: ch.animation.facing,
                hp: ch.hp,
                controlled: world.controlled == Some(e),
            })
            .collect();
        // hecs iteration order follows archetypes; sort for stable output.
        entities.sort_by(|a, b| a.id.cmp(&b.id));

        let threats = ThreatView {
            ghost: world.ghost.as_ref().map(|g| g.position),
            tiger: world.tiger.as_ref().map(|t| (t.position, t.phase)),
            enemy: world.enemy.as_ref().map(|e| e.position),
            cinematic_ghost: world
                .cinematic
                .as_ref()
                .and_then(|c| c.ghost())
                .map(|g| g.position),
            lightning_target: world.lightning.map(|l| world.character_id(l.target)),
        };

        let ritual = world.ritual.as_ref().map(|r| RitualHud {
            survival_secs: world.scheduler.survival.remaining(),
            survivors: r.survivors,
            altars: r.altars.clone(),
        });
        let story = world.story.as_ref().map(|s| StoryHud {
            evidence: s.evidence.clone(),
            accusations_left: s.accusations_left,
            hint_active: world.hint.is_highlighting(),
            inventory_open: world.ui.inventory_open,
            journal_open: world.ui.journal_open,
        });

        Self {
            tick: world.tick,
            elapsed: world.elapsed,
            mode: world.mode,
            state: world.state,
            camera: CameraView {
                eye: world.camera.eye(),
                look_at: world.camera.look_at,
                mode: world.camera_mode,
            },
            entities,
            threats,
            prompt: world.prompt.clone(),
            weather: world.weather,
            lighting: world.lighting,
            ritual,
            story,
            cinematic: world.cinematic.as_ref().map(|c| CinematicView {
                kind: c.kind(),
                phase: c.phase_label(),
                phase_elapsed: c.phase_elapsed(),
            }),
            cinematic_text: world.cinematic_text.clone(),
            blood: world.blood.clone(),
            death_markers: world.death_markers.clone(),
        }
    }

    pub fn entity(&self, id: &str) -> Option<&EntityView> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use crate::engine::SimulationEngine;
    use crate::input::InputSnapshot;

    fn content() -> CaseContent {
        CaseContent::from_json(
            r#"{ "id": "snap", "npcs": [ { "id": "a", "name": "Ada" }, { "id": "b", "name": "Bo" } ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_story_snapshot() {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::story().skipping_intro(), &content())
            .unwrap();
        engine.update(0.016, &InputSnapshot::idle());
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.entities.len(), 3);
        assert!(snap.entity("player").unwrap().controlled);
        assert_eq!(snap.entity("a").unwrap().name.as_deref(), Some("Ada"));
        assert!(snap.ritual.is_none());
        assert_eq!(snap.story.as_ref().unwrap().accusations_left, 3);
        assert!(snap.to_json().unwrap().contains("\"state\""));
    }

    #[test]
    fn test_ritual_hud() {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::ritual().skipping_intro(), &content())
            .unwrap();
        engine.update(1.0, &InputSnapshot::idle());
        let snap = engine.snapshot().unwrap();
        let hud = snap.ritual.unwrap();
        assert_eq!(hud.survivors, 7);
        assert_eq!(hud.altars.len(), 7);
        assert!((hud.survival_secs - 179.0).abs() < 1e-3);
        assert_eq!(snap.entities.iter().filter(|e| e.controlled).count(), 1);
    }
}
