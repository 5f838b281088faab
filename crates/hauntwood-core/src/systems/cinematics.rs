//! Scripted sequences that take over entities and the camera.
//!
//! At most one [`CinematicSession`] is active. Every variant walks a phase
//! enum forward only; a missing participant jumps straight to the last phase.

use hecs::Entity;
use hauntwood_logic::camera::outro_offset;
use hauntwood_logic::constants::cinematic::{
    BLOOD_PHASE_SECS, CONVERGE_ARRIVAL, CONVERGE_SPEED, PLAYER_RETREAT_RADIUS,
    PLAYER_RETREAT_SPEED, RESCUE_AFTER_SECS, RESCUE_DISTANCE, RESCUE_RING, TEXT_PHASE_SECS,
};
use hauntwood_logic::constants::ritual::{
    EXIT_SPEED, EXIT_TOLERANCE, GATHER_SPEED, GATHER_TOLERANCE, RALLY_POINT,
};
use hauntwood_logic::constants::threat::{
    GHOST_ATTACK_DURATION, GHOST_BEHIND_PLAYER_DISTANCE, GHOST_CONTACT, GHOST_SPAWN_DISTANCE,
    GHOST_SPEED,
};
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::timers::PhaseClock;
use rand::Rng;
use serde::Serialize;

use super::camera::CameraGoal;
use super::character::{force_move, silence, TickContext};
use super::death::handle_npc_death;
use super::threats::ring_point;
use crate::components::{CharacterState, Ghost, Npc, NpcBehavior};
use crate::events::{CinematicText, DeathCause, Message, MusicCue, SimEvent, SoundChannel};
use crate::state::{GameOverReason, GameState};
use crate::world::{CameraMode, WorldState};

/// Why a ghost is visiting an NPC during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostVisitCause {
    /// A wrong accusation with accusations still in hand.
    Accusation { accusations_left: u8 },
    /// The periodic story-mode death.
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RevealPhase {
    Running,
    Blood,
    Text,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ChasePhase {
    Running,
    Attacking,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VisitPhase {
    Approaching,
    Attacking,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OutroPhase {
    Gathering,
    Exiting,
    /// Everyone has left; waiting for the host to show the finish screen.
    Complete,
}

/// Move `phase` forward to `to` and restart the clock. Backward moves are ignored.
fn advance<P: Ord + Copy + std::fmt::Debug>(phase: &mut P, clock: &mut PhaseClock, to: P) {
    if to > *phase {
        log::info!("cinematic phase {:?} -> {:?}", phase, to);
        *phase = to;
        clock.restart();
    }
}

#[derive(Debug, Clone)]
pub struct WinningReveal {
    pub murderer: Option<Entity>,
    pub phase: RevealPhase,
    pub clock: PhaseClock,
    pub rescued: bool,
}

#[derive(Debug, Clone)]
pub struct LosingChase {
    pub target: Option<Entity>,
    pub reason: GameOverReason,
    pub ghost: Option<Ghost>,
    pub phase: ChasePhase,
    pub clock: PhaseClock,
}

#[derive(Debug, Clone)]
pub struct GhostVisit {
    pub victim: Entity,
    pub cause: GhostVisitCause,
    pub ghost: Option<Ghost>,
    pub phase: VisitPhase,
    pub clock: PhaseClock,
}

#[derive(Debug, Clone)]
pub struct RitualOutro {
    pub survivors: Vec<Entity>,
    pub phase: OutroPhase,
    pub clock: PhaseClock,
    /// Total time since the ending began; drives the camera pull-back.
    pub outro_secs: f32,
}

#[derive(Debug, Clone)]
pub enum CinematicSession {
    Winning(WinningReveal),
    Losing(LosingChase),
    WrongAccusation(GhostVisit),
    RitualEnding(RitualOutro),
}

impl CinematicSession {
    pub fn kind(&self) -> &'static str {
        match self {
            CinematicSession::Winning(_) => "winning",
            CinematicSession::Losing(_) => "losing",
            CinematicSession::WrongAccusation(_) => "wrong_accusation",
            CinematicSession::RitualEnding(_) => "ritual_ending",
        }
    }

    pub fn phase_label(&self) -> String {
        match self {
            CinematicSession::Winning(s) => format!("{:?}", s.phase),
            CinematicSession::Losing(s) => format!("{:?}", s.phase),
            CinematicSession::WrongAccusation(s) => format!("{:?}", s.phase),
            CinematicSession::RitualEnding(s) => format!("{:?}", s.phase),
        }
    }

    /// Seconds spent in the current phase.
    pub fn phase_elapsed(&self) -> f32 {
        match self {
            CinematicSession::Winning(s) => s.clock.elapsed,
            CinematicSession::Losing(s) => s.clock.elapsed,
            CinematicSession::WrongAccusation(s) => s.clock.elapsed,
            CinematicSession::RitualEnding(s) => s.clock.elapsed,
        }
    }

    /// The cinematic's own ghost, if one is on screen.
    pub fn ghost(&self) -> Option<&Ghost> {
        match self {
            CinematicSession::Losing(s) => s.ghost.as_ref(),
            CinematicSession::WrongAccusation(s) => s.ghost.as_ref(),
            _ => None,
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            CinematicSession::Winning(s) => s.phase == RevealPhase::Finished,
            CinematicSession::Losing(s) => s.phase == ChasePhase::Finished,
            CinematicSession::WrongAccusation(s) => s.phase == VisitPhase::Finished,
            CinematicSession::RitualEnding(_) => false,
        }
    }
}

fn start_ghost_audio(world: &mut WorldState, at: Vec3) {
    world.events.push(SimEvent::Music(MusicCue::DemonStart));
    let sfx = world.sfx();
    world.events.looping("ghost", sfx, Some(at), SoundChannel::Ghost);
}

fn set_scripted(world: &mut WorldState, e: Entity) {
    if let Ok(mut npc) = world.ecs.get::<&mut Npc>(e) {
        if npc.is_alive() {
            npc.behavior = NpcBehavior::Scripted;
        }
    }
}

/// Scripted, unobstructed walk. `None` if the entity has no character.
fn walk(world: &mut WorldState, e: Entity, goal: Vec3, speed: f32, delta: f32) -> Option<f32> {
    let ctx = TickContext {
        delta,
        collidables: None,
        bounds: &world.bounds,
        paused: false,
        weather: world.weather,
        sfx_volume: world.config.sfx_volume,
    };
    let ch = world.ecs.query_one_mut::<&mut CharacterState>(e).ok()?;
    Some(force_move(ch, goal, speed, &ctx, &mut world.events))
}

fn hold(world: &mut WorldState, e: Entity, delta: f32) {
    if let Some(p) = world.position(e) {
        walk(world, e, p, 0.0, delta);
    }
}

// ── Starters ───────────────────────────────────────────────────────────

/// Correct accusation: the village closes in on the murderer.
pub fn start_winning(world: &mut WorldState) {
    let murderer = world.murderer.filter(|m| world.is_alive(*m));
    for e in world.living_npcs() {
        set_scripted(world, e);
    }
    log::info!("winning reveal begins");
    world.set_state(GameState::WinningCinematic);
    let phase = if murderer.is_some() {
        RevealPhase::Running
    } else {
        RevealPhase::Finished
    };
    world.cinematic = Some(CinematicSession::Winning(WinningReveal {
        murderer,
        phase,
        clock: PhaseClock::default(),
        rescued: false,
    }));
}

/// A ghost hunts `target` down, then the game ends with `reason`.
pub fn start_losing(world: &mut WorldState, target: Entity, reason: GameOverReason) -> bool {
    if matches!(world.cinematic, Some(CinematicSession::Losing(_))) {
        return false;
    }
    let anchor = world.position(target);
    let ghost = anchor.map(|p| {
        let at = ring_point(&mut world.rng, p, GHOST_SPAWN_DISTANCE);
        Ghost::new(at, target, GHOST_SPEED)
    });
    if let Some(g) = &ghost {
        let at = g.position;
        start_ghost_audio(world, at);
    }
    log::info!("losing chase on {} ({:?})", world.character_id(target), reason);
    world.set_state(GameState::LosingCinematic);
    let phase = if ghost.is_some() {
        ChasePhase::Running
    } else {
        ChasePhase::Finished
    };
    world.cinematic = Some(CinematicSession::Losing(LosingChase {
        target: anchor.map(|_| target),
        reason,
        ghost,
        phase,
        clock: PhaseClock::default(),
    }));
    true
}

/// A ghost comes for `victim` while play continues around it.
///
/// The ghost appears behind the player, on the side away from the victim.
pub fn start_wrong_accusation(world: &mut WorldState, victim: Entity, cause: GhostVisitCause) -> bool {
    if world.cinematic.is_some() {
        return false;
    }
    let alive = world.is_alive(victim);
    let victim_pos = world.position(victim).unwrap_or(Vec3::ZERO);
    let spawn = match world.player.and_then(|p| world.position(p)) {
        Some(player) => {
            let away = (player - victim_pos).normalize();
            let away = if away == Vec3::ZERO { Vec3::ground(0.0, 1.0) } else { away };
            world.bounds.clamp(player + away * GHOST_BEHIND_PLAYER_DISTANCE)
        }
        None => ring_point(&mut world.rng, victim_pos, GHOST_BEHIND_PLAYER_DISTANCE),
    };
    let (ghost, phase) = if alive {
        start_ghost_audio(world, spawn);
        (Some(Ghost::new(spawn, victim, GHOST_SPEED)), VisitPhase::Approaching)
    } else {
        (None, VisitPhase::Finished)
    };
    log::info!("ghost visits {} ({:?})", world.npc_name(victim), cause);
    world.cinematic = Some(CinematicSession::WrongAccusation(GhostVisit {
        victim,
        cause,
        ghost,
        phase,
        clock: PhaseClock::default(),
    }));
    true
}

/// Survival timer ran out: survivors rally and walk off the map.
pub fn start_ritual_ending(world: &mut WorldState) {
    if world.state == GameState::RitualEnding {
        return;
    }
    let survivors = world.living_npcs();
    for &e in &survivors {
        set_scripted(world, e);
    }
    log::info!("ritual complete, {} survivors", survivors.len());
    world.set_state(GameState::RitualEnding);
    world.camera_mode = CameraMode::Outro;
    world.cinematic = Some(CinematicSession::RitualEnding(RitualOutro {
        survivors,
        phase: OutroPhase::Gathering,
        clock: PhaseClock::default(),
        outro_secs: 0.0,
    }));
}

// ── Update ─────────────────────────────────────────────────────────────

/// Advance whichever cinematic is active.
pub fn cinematic_system(world: &mut WorldState, delta: f32) {
    let Some(mut session) = world.cinematic.take() else {
        return;
    };
    match &mut session {
        CinematicSession::Winning(s) => update_winning(world, s, delta),
        CinematicSession::Losing(s) => update_losing(world, s, delta),
        CinematicSession::WrongAccusation(s) => update_visit(world, s, delta),
        CinematicSession::RitualEnding(s) => update_outro(world, s, delta),
    }
    // A death inside the update may have started a different session.
    if world.cinematic.is_some() {
        return;
    }
    if session.is_finished() {
        finish(world, session);
    } else {
        world.cinematic = Some(session);
    }
}

fn finish(world: &mut WorldState, session: CinematicSession) {
    match session {
        CinematicSession::Winning(_) => {
            world.set_state(GameState::FinishScreen);
        }
        CinematicSession::Losing(s) => {
            world.events.push(SimEvent::Music(MusicCue::DemonStop));
            world.events.stop(SoundChannel::Ghost);
            world.set_state(GameState::GameOver(s.reason));
        }
        CinematicSession::WrongAccusation(s) => {
            let victim = world.npc_name(s.victim);
            let message = match s.cause {
                GhostVisitCause::Accusation { accusations_left } => Message::WrongAccusation {
                    victim,
                    accusations_left,
                },
                GhostVisitCause::Scheduled => Message::GhostClaimed { victim },
            };
            world.events.push(SimEvent::Message(message));
            world.events.push(SimEvent::Music(MusicCue::DemonStop));
            world.events.stop(SoundChannel::Ghost);
        }
        CinematicSession::RitualEnding(_) => {}
    }
}

fn update_winning(world: &mut WorldState, s: &mut WinningReveal, delta: f32) {
    let murderer_pos = s.murderer.and_then(|m| world.position(m));
    let (Some(murderer), Some(center)) = (s.murderer, murderer_pos) else {
        advance(&mut s.phase, &mut s.clock, RevealPhase::Finished);
        return;
    };
    let elapsed = s.clock.advance(delta);

    match s.phase {
        RevealPhase::Running => {
            let converging = world.living_npcs_except(&[Some(murderer)]);

            if elapsed >= RESCUE_AFTER_SECS && !s.rescued {
                s.rescued = true;
                for &e in &converging {
                    let Some(p) = world.position(e) else { continue };
                    if p.ground_distance(&center) > RESCUE_DISTANCE {
                        let radius = world.rng.gen_range(RESCUE_RING.0..RESCUE_RING.1);
                        let to = world.bounds.clamp(ring_point(&mut world.rng, center, radius));
                        if let Ok(mut ch) = world.ecs.get::<&mut CharacterState>(e) {
                            ch.position = to;
                        }
                    }
                }
            }

            let mut all_arrived = true;
            for &e in &converging {
                let Some(p) = world.position(e) else { continue };
                if p.ground_distance(&center) <= CONVERGE_ARRIVAL {
                    hold(world, e, delta);
                } else {
                    let left = walk(world, e, center, CONVERGE_SPEED, delta).unwrap_or(0.0);
                    if left > CONVERGE_ARRIVAL {
                        all_arrived = false;
                    }
                }
            }

            if let Some(player) = world.player {
                if let Some(p) = world.position(player) {
                    if p.ground_distance(&center) < PLAYER_RETREAT_RADIUS {
                        let away = center.ground_direction(&p);
                        let away = if away == Vec3::ZERO { Vec3::ground(0.0, 1.0) } else { away };
                        walk(world, player, p + away, PLAYER_RETREAT_SPEED, delta);
                    } else {
                        hold(world, player, delta);
                    }
                }
            }

            if all_arrived {
                advance(&mut s.phase, &mut s.clock, RevealPhase::Blood);
                world.spawn_blood(center);
                let sfx = world.sfx();
                world.events.sound("scream_death", sfx, Some(center));
                handle_npc_death(world, murderer, DeathCause::Revealed);
            }
        }
        RevealPhase::Blood => {
            if elapsed >= BLOOD_PHASE_SECS {
                advance(&mut s.phase, &mut s.clock, RevealPhase::Text);
                let text = CinematicText::MurdererRevealed {
                    name: world.npc_name(murderer),
                };
                world.cinematic_text = Some(text.clone());
                world.events.push(SimEvent::CinematicText(text));
            }
        }
        RevealPhase::Text => {
            if elapsed >= TEXT_PHASE_SECS {
                advance(&mut s.phase, &mut s.clock, RevealPhase::Finished);
            }
        }
        RevealPhase::Finished => {}
    }
}

fn update_losing(world: &mut WorldState, s: &mut LosingChase, delta: f32) {
    let goal = s.target.and_then(|t| world.position(t));
    let (Some(target), Some(goal)) = (s.target, goal) else {
        advance(&mut s.phase, &mut s.clock, ChasePhase::Finished);
        return;
    };
    let elapsed = s.clock.advance(delta);
    match s.phase {
        ChasePhase::Running => {
            let distance = match s.ghost.as_mut() {
                Some(g) => g.pursue(goal, delta),
                None => 0.0,
            };
            if distance < GHOST_CONTACT {
                advance(&mut s.phase, &mut s.clock, ChasePhase::Attacking);
                scream(world, goal);
                if world.is_npc(target) {
                    handle_npc_death(world, target, DeathCause::Ghost);
                } else if let Ok(ch) = world.ecs.query_one_mut::<&mut CharacterState>(target) {
                    ch.visible = false;
                    ch.moving = false;
                    silence(ch, &mut world.events);
                }
                world.spawn_blood(goal);
                s.ghost = None;
                world.events.stop(SoundChannel::Ghost);
            }
        }
        ChasePhase::Attacking => {
            if elapsed >= GHOST_ATTACK_DURATION {
                advance(&mut s.phase, &mut s.clock, ChasePhase::Finished);
            }
        }
        ChasePhase::Finished => {}
    }
}

fn scream(world: &mut WorldState, at: Vec3) {
    let sfx = world.sfx();
    world.events.sound("scream_death", sfx * 1.5, Some(at));
}

fn update_visit(world: &mut WorldState, s: &mut GhostVisit, delta: f32) {
    let elapsed = s.clock.advance(delta);
    match s.phase {
        VisitPhase::Approaching => {
            let goal = world.position(s.victim).filter(|_| world.is_alive(s.victim));
            let Some(goal) = goal else {
                s.ghost = None;
                advance(&mut s.phase, &mut s.clock, VisitPhase::Finished);
                return;
            };
            let distance = match s.ghost.as_mut() {
                Some(g) => g.pursue(goal, delta),
                None => 0.0,
            };
            if distance < GHOST_CONTACT {
                advance(&mut s.phase, &mut s.clock, VisitPhase::Attacking);
                scream(world, goal);
                if world.is_alive(s.victim) {
                    handle_npc_death(world, s.victim, DeathCause::Ghost);
                }
                world.spawn_blood(goal);
                s.ghost = None;
            }
        }
        VisitPhase::Attacking => {
            if elapsed >= GHOST_ATTACK_DURATION {
                advance(&mut s.phase, &mut s.clock, VisitPhase::Finished);
            }
        }
        VisitPhase::Finished => {}
    }
}

fn update_outro(world: &mut WorldState, s: &mut RitualOutro, delta: f32) {
    s.outro_secs += delta;
    s.clock.advance(delta);
    let walkers: Vec<Entity> = s
        .survivors
        .iter()
        .copied()
        .filter(|e| world.is_alive(*e))
        .collect();

    match s.phase {
        OutroPhase::Gathering => {
            let rally = Vec3::ground(RALLY_POINT.0, RALLY_POINT.1);
            let mut all_there = true;
            for &e in &walkers {
                let Some(p) = world.position(e) else { continue };
                if p.ground_distance(&rally) <= GATHER_TOLERANCE {
                    hold(world, e, delta);
                    continue;
                }
                let left = walk(world, e, rally, GATHER_SPEED, delta).unwrap_or(0.0);
                if left > GATHER_TOLERANCE {
                    all_there = false;
                }
            }
            if all_there {
                advance(&mut s.phase, &mut s.clock, OutroPhase::Exiting);
            }
        }
        OutroPhase::Exiting => {
            let exit_z = world.bounds.min_z;
            let mut all_gone = true;
            for &e in &walkers {
                let (p, visible) = match world.ecs.get::<&CharacterState>(e) {
                    Ok(ch) => (ch.position, ch.visible),
                    Err(_) => continue,
                };
                if !visible {
                    continue;
                }
                let left = walk(world, e, Vec3::new(p.x, p.y, exit_z), EXIT_SPEED, delta).unwrap_or(0.0);
                if left <= EXIT_TOLERANCE {
                    if let Ok(ch) = world.ecs.query_one_mut::<&mut CharacterState>(e) {
                        ch.visible = false;
                        silence(ch, &mut world.events);
                    }
                } else {
                    all_gone = false;
                }
            }
            if all_gone {
                advance(&mut s.phase, &mut s.clock, OutroPhase::Complete);
                world.events.push(SimEvent::EndingSequenceComplete);
            }
        }
        OutroPhase::Complete => {}
    }
}

// ── Camera ─────────────────────────────────────────────────────────────

/// Camera framing owned by the active cinematic, if any.
pub fn cinematic_camera(world: &WorldState) -> Option<CameraGoal> {
    match world.cinematic.as_ref()? {
        CinematicSession::Winning(s) => {
            let at = s.murderer.and_then(|m| world.position(m))?;
            Some(CameraGoal::new(at, Vec3::new(8.0, 8.0, 8.0), 0.05))
        }
        CinematicSession::Losing(s) => {
            let at = s.target.and_then(|t| world.position(t))?;
            Some(CameraGoal::new(at, Vec3::new(0.0, 5.0, 8.0), 0.08))
        }
        CinematicSession::WrongAccusation(s) => {
            let victim = world.position(s.victim)?;
            let at = match &s.ghost {
                Some(g) => victim.midpoint(&g.position),
                None => victim,
            };
            Some(CameraGoal::new(at, Vec3::new(5.0, 5.0, 5.0), 0.18))
        }
        CinematicSession::RitualEnding(s) => {
            let points: Vec<Vec3> = s.survivors.iter().filter_map(|e| world.position(*e)).collect();
            if points.is_empty() {
                return None;
            }
            let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
            let centroid = sum * (1.0 / points.len() as f32);
            Some(CameraGoal::new(centroid, outro_offset(s.outro_secs), 0.08))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ClipKind, Player};
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use crate::world::RitualState;

    fn story_world(positions: &[(f32, f32)]) -> WorldState {
        let npcs: Vec<String> = (0..positions.len())
            .map(|i| format!(r#"{{ "id": "n{i}", "name": "N{i}" }}"#))
            .collect();
        let content = CaseContent::from_json(&format!(r#"{{ "id": "t", "npcs": [{}] }}"#, npcs.join(","))).unwrap();
        let mut w = WorldState::new(ModeConfig::story(), content);
        for (i, &(x, z)) in positions.iter().enumerate() {
            let e = w.ecs.spawn((
                CharacterState::new(format!("n{i}"), Vec3::ground(x, z), 2.0, ClipKind::Npc),
                Npc::new(format!("N{i}"), "", i, 5.0),
            ));
            w.roster.push(e);
        }
        let p = w.ecs.spawn((
            CharacterState::new("player", Vec3::ground(0.0, 10.0), 5.0, ClipKind::Player),
            Player,
        ));
        w.player = Some(p);
        w.controlled = Some(p);
        w.state = GameState::Playing;
        w
    }

    fn run(w: &mut WorldState, secs: f32) {
        let steps = (secs / 0.05) as usize;
        for _ in 0..steps {
            cinematic_system(w, 0.05);
        }
    }

    #[test]
    fn winning_reveal_runs_to_finish_screen() {
        let mut w = story_world(&[(0.0, 0.0), (60.0, 0.0), (-10.0, 5.0)]);
        w.murderer = Some(w.roster[0]);
        start_winning(&mut w);
        assert_eq!(w.state, GameState::WinningCinematic);
        run(&mut w, 15.0);
        assert_eq!(w.state, GameState::FinishScreen);
        assert!(w.cinematic.is_none());
        assert!(w.events.iter().any(|e| matches!(e, SimEvent::CinematicText(_))));
        assert!(!w.is_alive(w.roster[0]));
    }

    #[test]
    fn winning_without_murderer_short_circuits() {
        let mut w = story_world(&[(0.0, 0.0)]);
        start_winning(&mut w);
        cinematic_system(&mut w, 0.016);
        assert_eq!(w.state, GameState::FinishScreen);
    }

    #[test]
    fn losing_chase_ends_in_game_over() {
        let mut w = story_world(&[(30.0, 30.0)]);
        let player = w.player.unwrap();
        assert!(start_losing(&mut w, player, GameOverReason::Accusation));
        assert!(!start_losing(&mut w, player, GameOverReason::Timeout));
        run(&mut w, 10.0);
        assert_eq!(w.state, GameState::GameOver(GameOverReason::Accusation));
    }

    #[test]
    fn visit_phases_only_move_forward() {
        let mut w = story_world(&[(20.0, 0.0), (-40.0, 0.0)]);
        let victim = w.roster[0];
        assert!(start_wrong_accusation(
            &mut w,
            victim,
            GhostVisitCause::Accusation { accusations_left: 2 }
        ));
        let mut last = VisitPhase::Approaching;
        for _ in 0..400 {
            cinematic_system(&mut w, 0.05);
            match &w.cinematic {
                Some(CinematicSession::WrongAccusation(s)) => {
                    assert!(s.phase >= last);
                    last = s.phase;
                }
                _ => break,
            }
        }
        assert!(w.cinematic.is_none());
        assert!(!w.is_alive(victim));
        assert_eq!(w.state, GameState::Playing);
        assert!(w.events.iter().any(|e| matches!(
            e,
            SimEvent::Message(Message::WrongAccusation { accusations_left: 2, .. })
        )));
    }

    fn screams(w: &WorldState) -> usize {
        w.events
            .iter()
            .filter(|e| matches!(e, SimEvent::PlaySound { sound, .. } if sound == "scream_death"))
            .count()
    }

    #[test]
    fn visit_kills_on_contact() {
        let mut w = story_world(&[(20.0, 0.0), (-40.0, 0.0)]);
        let victim = w.roster[0];
        start_wrong_accusation(&mut w, victim, GhostVisitCause::Scheduled);
        for _ in 0..400 {
            cinematic_system(&mut w, 0.05);
            if let Some(CinematicSession::WrongAccusation(s)) = &w.cinematic {
                if s.phase == VisitPhase::Attacking {
                    break;
                }
            }
        }
        let Some(CinematicSession::WrongAccusation(s)) = &w.cinematic else {
            panic!("visit ended before the attack");
        };
        assert!(s.ghost.is_none());
        assert!(!w.is_alive(victim));
        assert!(!w.ecs.get::<&CharacterState>(victim).unwrap().visible);
        assert_eq!(screams(&w), 1);
        let blood = w.events.iter().filter(|e| matches!(e, SimEvent::BloodSplatter { .. })).count();
        assert_eq!(blood, 1);
    }

    #[test]
    fn losing_chase_hides_player_on_contact() {
        let mut w = story_world(&[(30.0, 30.0)]);
        let player = w.player.unwrap();
        start_losing(&mut w, player, GameOverReason::Timeout);
        for _ in 0..400 {
            cinematic_system(&mut w, 0.05);
            if let Some(CinematicSession::Losing(s)) = &w.cinematic {
                if s.phase == ChasePhase::Attacking {
                    break;
                }
            }
        }
        assert!(matches!(
            &w.cinematic,
            Some(CinematicSession::Losing(s)) if s.phase == ChasePhase::Attacking && s.ghost.is_none()
        ));
        assert!(!w.ecs.get::<&CharacterState>(player).unwrap().visible);
        assert_eq!(screams(&w), 1);
        assert_eq!(w.state, GameState::LosingCinematic);
    }

    #[test]
    fn dead_victim_short_circuits_visit() {
        let mut w = story_world(&[(20.0, 0.0), (-40.0, 0.0)]);
        let victim = w.roster[0];
        handle_npc_death(&mut w, victim, DeathCause::Lightning);
        assert!(start_wrong_accusation(&mut w, victim, GhostVisitCause::Scheduled));
        cinematic_system(&mut w, 0.05);
        assert!(w.cinematic.is_none());
    }

    #[test]
    fn ritual_ending_gathers_exits_and_completes_once() {
        let content = CaseContent::from_json(r#"{ "id": "t", "npcs": [ { "id": "a", "name": "A" }, { "id": "b", "name": "B" } ] }"#).unwrap();
        let mut w = WorldState::new(ModeConfig::ritual(), content);
        for (i, x) in [0.0f32, 10.0].into_iter().enumerate() {
            let e = w.ecs.spawn((
                CharacterState::new(format!("n{i}"), Vec3::ground(x, -70.0), 2.0, ClipKind::Npc),
                Npc::new(format!("N{i}"), "", i, 5.0),
            ));
            w.roster.push(e);
        }
        w.ritual = Some(RitualState { survivors: 2, ..RitualState::default() });
        w.state = GameState::RitualPlaying;
        start_ritual_ending(&mut w);
        run(&mut w, 40.0);
        let done = w
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::EndingSequenceComplete))
            .count();
        assert_eq!(done, 1);
        assert_eq!(w.state, GameState::RitualEnding);
        for e in w.roster.clone() {
            assert!(!w.ecs.get::<&CharacterState>(e).unwrap().visible);
        }
    }
}
