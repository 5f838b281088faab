//! Threat lifecycles and in-flight event sequences.
//!
//! These advance every unpaused tick even while the scheduler is suspended:
//! a ghost already on its way, a lightning flash, a pending ritual death or
//! a tiger ambush always plays out.

use hecs::Entity;
use hauntwood_logic::constants::effects::{
    BLOOM_FLASH, BLOOM_REST, LIGHTNING_FLASH_SECS, LIGHTNING_STRIKE_WINDOW, PENDING_DEATH_SECS,
};
use hauntwood_logic::constants::threat::{
    ENEMY_SPEED, GHOST_CONTACT, GHOST_SPAWN_DISTANCE, GHOST_SPEED, TIGER_ATTACK_DURATION,
    TIGER_CONTACT, TIGER_DESPAWN_RADIUS, TIGER_SPAWN_OFFSET, TIGER_SPEED,
};
use hauntwood_logic::constants::WORLD_HALF_EXTENT;
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::movement::{move_with_collisions, step_toward, Body};
use hauntwood_logic::timers::Countdown;
use rand::Rng;

use super::death::handle_npc_death;
use crate::components::{Enemy, Ghost, Tiger, TigerPhase};
use crate::events::{DeathCause, MusicCue, SimEvent, SoundChannel};
use crate::state::GameMode;
use crate::world::{CameraMode, PendingDeath, WorldState};

/// A lightning bolt in progress. `struck` guards the single kill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningStrike {
    pub target: Entity,
    pub flash: f32,
    pub struck: bool,
}

impl LightningStrike {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            flash: LIGHTNING_FLASH_SECS,
            struck: false,
        }
    }
}

/// Point `distance` away from `center` at a random angle.
pub fn ring_point<R: Rng + ?Sized>(rng: &mut R, center: Vec3, distance: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec3::new(
        center.x + angle.cos() * distance,
        center.y,
        center.z + angle.sin() * distance,
    )
}

/// Spawn the scheduled ghost. Rejected while one is already active.
pub fn spawn_ghost(world: &mut WorldState, target: Entity) -> bool {
    if world.ghost.is_some() || !world.is_alive(target) {
        return false;
    }
    let Some(anchor) = world.position(target) else {
        return false;
    };
    let at = ring_point(&mut world.rng, anchor, GHOST_SPAWN_DISTANCE);
    log::info!("ghost spawned for {}", world.character_id(target));
    world.ghost = Some(Ghost::new(at, target, GHOST_SPEED));
    world.events.push(SimEvent::Music(MusicCue::DemonStart));
    let sfx = world.sfx();
    world.events.looping("ghost", sfx, Some(at), SoundChannel::Ghost);
    true
}

fn dismiss_ghost(world: &mut WorldState) {
    if world.ghost.take().is_some() {
        world.events.push(SimEvent::Music(MusicCue::DemonStop));
        world.events.stop(SoundChannel::Ghost);
    }
}

/// Chase the scheduled ghost's target; contact starts a pending death.
pub fn ghost_system(world: &mut WorldState, delta: f32) {
    let Some(ghost) = world.ghost.as_ref() else {
        return;
    };
    let target = ghost.target;
    let goal = match world.position(target) {
        Some(p) if world.is_alive(target) => p,
        _ => {
            dismiss_ghost(world);
            if world.camera_mode == CameraMode::GhostFollow {
                world.camera_mode = CameraMode::PlayerFollow;
            }
            return;
        }
    };
    let distance = match world.ghost.as_mut() {
        Some(g) => g.pursue(goal, delta),
        None => return,
    };
    let pending = world.ritual.as_ref().is_some_and(|r| r.pending_death.is_some());
    if distance < GHOST_CONTACT && !pending {
        log::info!("ghost reached {}", world.character_id(target));
        let sfx = world.sfx();
        world.events.sound("scream_death", sfx * 1.5, Some(goal));
        world.shake_camera(0.8, 0.6);
        world.spawn_blood(goal);
        dismiss_ghost(world);
        match world.ritual.as_mut() {
            Some(r) => {
                r.pending_death = Some(PendingDeath {
                    victim: target,
                    timer: Countdown::new(PENDING_DEATH_SECS),
                });
            }
            None => {
                handle_npc_death(world, target, DeathCause::Ghost);
            }
        }
    }
}

/// Land a pending ritual death once its timer expires.
pub fn pending_death_system(world: &mut WorldState, delta: f32) {
    let Some(ritual) = world.ritual.as_mut() else {
        return;
    };
    let Some(pending) = ritual.pending_death.as_mut() else {
        return;
    };
    if !pending.timer.tick(delta) {
        return;
    }
    let victim = pending.victim;
    ritual.pending_death = None;
    world.camera_mode = CameraMode::PlayerFollow;
    handle_npc_death(world, victim, DeathCause::Ghost);
}

/// Advance the lightning flash; the kill lands once, inside the strike window.
///
/// A frame that jumps past the window still resolves the strike on the
/// first tick below its upper edge.
pub fn lightning_system(world: &mut WorldState, delta: f32) {
    let Some(mut strike) = world.lightning else {
        return;
    };
    strike.flash -= delta;
    let (_, upper) = LIGHTNING_STRIKE_WINDOW;
    if !strike.struck && strike.flash < upper {
        strike.struck = true;
        world.events.sound("thunder", 0.9, None);
        world.events.push(SimEvent::Bloom {
            strength: BLOOM_FLASH,
        });
        if world.is_alive(strike.target) {
            let at = world.position(strike.target).unwrap_or(Vec3::ZERO);
            if handle_npc_death(world, strike.target, DeathCause::Lightning) {
                world.spawn_blood(at);
                world.shake_camera(1.0, 0.7);
            }
        }
    }
    let (lower, _) = LIGHTNING_STRIKE_WINDOW;
    if strike.struck && strike.flash <= lower && strike.flash + delta > lower {
        world.events.push(SimEvent::Bloom {
            strength: BLOOM_REST,
        });
    }

    if strike.flash <= 0.0 {
        world.lightning = None;
        if world.mode == GameMode::Ritual && world.camera_mode == CameraMode::EventFocus {
            world.camera_mode = CameraMode::PlayerFollow;
        }
    } else {
        world.lightning = Some(strike);
    }
}

/// Spawn a tiger just past the map edge on the target's dominant axis.
pub fn spawn_tiger(world: &mut WorldState, target: Entity) -> bool {
    if world.tiger.is_some() {
        return false;
    }
    let Some(pos) = world.position(target) else {
        return false;
    };
    let far = WORLD_HALF_EXTENT + TIGER_SPAWN_OFFSET;
    let spawn = if pos.x.abs() > pos.z.abs() {
        Vec3::ground(far.copysign(pos.x), pos.z)
    } else {
        Vec3::ground(pos.x, far.copysign(pos.z))
    };
    log::info!("tiger ambush on {}", world.character_id(target));
    world.tiger = Some(Tiger::new(spawn, target));
    world.events.push(SimEvent::Music(MusicCue::DemonStart));
    world.events.sound("tiger_attack", 0.8, Some(spawn));
    if world.mode == GameMode::Ritual {
        world.camera_mode = CameraMode::TigerFollow;
    }
    true
}

pub fn tiger_system(world: &mut WorldState, delta: f32) {
    let Some(mut tiger) = world.tiger.take() else {
        return;
    };
    match tiger.phase {
        TigerPhase::Approaching => {
            let goal = world.position(tiger.target).filter(|_| world.is_alive(tiger.target));
            match goal {
                Some(goal) => {
                    tiger.position = step_toward(tiger.position, goal, TIGER_SPEED, delta);
                    if tiger.position.ground_distance(&goal) < TIGER_CONTACT {
                        tiger.advance_to(TigerPhase::Attacking);
                    }
                }
                None => tiger.advance_to(TigerPhase::Fleeing),
            }
        }
        TigerPhase::Attacking => {
            tiger.timer += delta;
            if tiger.timer >= TIGER_ATTACK_DURATION {
                if world.is_alive(tiger.target) {
                    let at = world.position(tiger.target).unwrap_or(tiger.position);
                    if handle_npc_death(world, tiger.target, DeathCause::Tiger) {
                        world.spawn_blood(at);
                    }
                }
                tiger.advance_to(TigerPhase::Fleeing);
                if world.mode == GameMode::Ritual && world.camera_mode == CameraMode::TigerFollow {
                    world.camera_mode = CameraMode::PlayerFollow;
                }
            }
        }
        TigerPhase::Fleeing => {
            let dir = (tiger.flee_target - tiger.position).normalize();
            tiger.position += dir * (TIGER_SPEED * delta);
            if tiger.position.length() > TIGER_DESPAWN_RADIUS {
                tiger.advance_to(TigerPhase::Finished);
            }
        }
        TigerPhase::Finished => {}
    }

    if tiger.phase == TigerPhase::Finished {
        log::info!("tiger left");
        world.events.push(SimEvent::Music(MusicCue::DemonStop));
        if world.camera_mode == CameraMode::TigerFollow {
            world.camera_mode = CameraMode::PlayerFollow;
        }
    } else {
        world.tiger = Some(tiger);
    }
}

/// Put a walking pursuer on `target`, replacing any current one.
pub fn spawn_enemy(world: &mut WorldState, at: Vec3, target: Entity) -> bool {
    if !world.is_alive(target) {
        return false;
    }
    world.enemy = Some(Enemy {
        position: world.bounds.clamp(at),
        target,
        speed: ENEMY_SPEED,
    });
    true
}

/// The enemy walks around obstacles toward its target and leaves when the
/// target is gone.
pub fn enemy_system(world: &mut WorldState, delta: f32) {
    let Some(enemy) = world.enemy.as_ref() else {
        return;
    };
    let target = enemy.target;
    let goal = match world.position(target) {
        Some(p) if world.is_alive(target) => p,
        _ => {
            world.enemy = None;
            return;
        }
    };
    let body = Body {
        width: 1.5,
        height: 3.0,
    };
    let collidables = &world.collidables;
    let bounds = &world.bounds;
    if let Some(enemy) = world.enemy.as_mut() {
        let dir = enemy.position.ground_direction(&goal);
        let step = dir * (enemy.speed * delta);
        enemy.position = move_with_collisions(enemy.position, step, body, Some(collidables.as_slice()), bounds).position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{CharacterState, ClipKind, Npc};
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use crate::world::RitualState;

    fn world(mode_ritual: bool, positions: &[(f32, f32)]) -> WorldState {
        let npcs: Vec<String> = (0..positions.len())
            .map(|i| format!(r#"{{ "id": "n{i}", "name": "N{i}" }}"#))
            .collect();
        let json = format!(r#"{{ "id": "t", "npcs": [{}] }}"#, npcs.join(","));
        let content = CaseContent::from_json(&json).unwrap();
        let cfg = if mode_ritual { ModeConfig::ritual() } else { ModeConfig::story() };
        let mut w = WorldState::new(cfg, content);
        for (i, &(x, z)) in positions.iter().enumerate() {
            let e = w.ecs.spawn((
                CharacterState::new(format!("n{i}"), Vec3::ground(x, z), 2.0, ClipKind::Npc),
                Npc::new(format!("N{i}"), "", i, 5.0),
            ));
            w.roster.push(e);
        }
        if mode_ritual {
            w.ritual = Some(RitualState {
                survivors: positions.len(),
                ..RitualState::default()
            });
        }
        w
    }

    #[test]
    fn ghost_is_single_flight() {
        let mut w = world(true, &[(0.0, 0.0), (10.0, 0.0)]);
        let (a, b) = (w.roster[0], w.roster[1]);
        assert!(spawn_ghost(&mut w, a));
        assert!(!spawn_ghost(&mut w, b), "second ghost rejected while first active");
        dismiss_ghost(&mut w);
        assert!(spawn_ghost(&mut w, b));
    }

    #[test]
    fn ghost_contact_queues_pending_death() {
        let mut w = world(true, &[(0.0, 0.0), (30.0, 30.0), (-30.0, 30.0)]);
        let a = w.roster[0];
        assert!(spawn_ghost(&mut w, a));
        for _ in 0..200 {
            ghost_system(&mut w, 0.05);
            pending_death_system(&mut w, 0.05);
        }
        assert!(w.ghost.is_none());
        assert!(!w.is_alive(a));
        assert_eq!(w.blood.len(), 1);
    }

    #[test]
    fn lightning_kills_once_with_one_blood() {
        let mut w = world(false, &[(0.0, 0.0)]);
        let a = w.roster[0];
        w.lightning = Some(LightningStrike::new(a));
        for _ in 0..40 {
            lightning_system(&mut w, 0.05);
        }
        assert!(w.lightning.is_none());
        assert!(!w.is_alive(a));
        let splats = w
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::BloodSplatter { .. }))
            .count();
        assert_eq!(splats, 1);
    }

    #[test]
    fn tiger_spawns_past_dominant_edge_and_runs_its_course() {
        let mut w = world(false, &[(85.0, 10.0)]);
        let a = w.roster[0];
        assert!(spawn_tiger(&mut w, a));
        let t = w.tiger.as_ref().unwrap();
        assert_eq!(t.spawn_point, Vec3::ground(100.0, 10.0));
        let mut seen = vec![TigerPhase::Approaching];
        for _ in 0..400 {
            tiger_system(&mut w, 0.05);
            match &w.tiger {
                Some(t) if seen.last() != Some(&t.phase) => seen.push(t.phase),
                _ => {}
            }
        }
        assert!(w.tiger.is_none());
        assert!(!w.is_alive(a));
        assert_eq!(
            seen,
            vec![TigerPhase::Approaching, TigerPhase::Attacking, TigerPhase::Fleeing]
        );
    }

    #[test]
    fn enemy_leaves_when_target_dies() {
        let mut w = world(false, &[(0.0, 0.0)]);
        let a = w.roster[0];
        assert!(spawn_enemy(&mut w, Vec3::ground(20.0, 0.0), a));
        enemy_system(&mut w, 1.0);
        assert!(w.enemy.as_ref().unwrap().position.x < 20.0);
        handle_npc_death(&mut w, a, DeathCause::Enemy);
        enemy_system(&mut w, 1.0);
        assert!(w.enemy.is_none());
    }
}
