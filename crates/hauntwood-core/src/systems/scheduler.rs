//! Event scheduler: independent countdowns that fire world events.
//!
//! All gameplay timers freeze together whenever the suspend set is
//! non-empty. Event *sequences* already in flight (lightning flash, pending
//! death, threats) are advanced elsewhere and are not frozen by it.

use hauntwood_logic::constants::threat::{TIGER_NEARBY_RADIUS, TIGER_STATIONARY_SECS};
use hauntwood_logic::constants::EDGE_THRESHOLD;
use hauntwood_logic::geometry::WorldBounds;
use hauntwood_logic::timers::Countdown;
use hauntwood_logic::weather::Weather;
use rand::seq::SliceRandom;
use rand::Rng;

use super::cinematics::{start_losing, start_ritual_ending, start_wrong_accusation, GhostVisitCause};
use super::threats::{spawn_ghost, spawn_tiger, LightningStrike};
use crate::components::Npc;
use crate::config::SchedulerConfig;
use crate::events::{SimEvent, SoundChannel};
use crate::state::{GameMode, GameOverReason, GameState, SuspendSet};
use crate::world::{CameraMode, WorldState};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerState {
    pub weather: Countdown,
    pub lightning: Countdown,
    pub ghost: Countdown,
    pub tiger: Countdown,
    pub npc_death: Countdown,
    /// Ritual survival countdown; unused in story mode.
    pub survival: Countdown,
}

impl SchedulerState {
    pub fn arm<R: Rng + ?Sized>(mode: GameMode, cfg: &SchedulerConfig, rng: &mut R) -> Self {
        match mode {
            GameMode::Story => Self {
                weather: Countdown::new(cfg.story_weather.sample(rng)),
                lightning: Countdown::new(cfg.story_lightning.sample(rng)),
                ghost: Countdown::default(),
                tiger: Countdown::new(cfg.tiger_initial),
                npc_death: Countdown::new(cfg.npc_death_first),
                survival: Countdown::default(),
            },
            GameMode::Ritual => Self {
                weather: Countdown::new(cfg.ritual_weather.sample(rng)),
                lightning: Countdown::new(cfg.ritual_lightning.sample(rng)),
                ghost: Countdown::new(cfg.ghost_interval),
                tiger: Countdown::new(cfg.tiger_initial),
                npc_death: Countdown::default(),
                survival: Countdown::new(cfg.survival_secs),
            },
        }
    }
}

/// Advance all scheduler timers and fire whatever expires.
pub fn scheduler_tick(world: &mut WorldState, delta: f32, suspended: &SuspendSet) {
    if !suspended.is_empty() {
        return;
    }
    match (world.mode, world.state) {
        (GameMode::Story, GameState::Playing) => {
            tick_weather(world, delta);
            tick_story_lightning(world, delta);
            tick_npc_death(world, delta);
            tick_tiger(world, delta);
        }
        (GameMode::Ritual, GameState::RitualPlaying) => {
            world.scheduler.survival.tick(delta);
            tick_weather(world, delta);
            tick_ghost(world, delta);
            tick_ritual_lightning(world, delta);
            tick_tiger(world, delta);
            check_ritual_outcome(world);
        }
        _ => {}
    }
}

pub fn set_weather(world: &mut WorldState, weather: Weather) {
    if world.weather == weather {
        return;
    }
    log::info!("weather {:?} -> {:?}", world.weather, weather);
    if world.weather == Weather::Rain {
        world.events.stop(SoundChannel::Rain);
    }
    world.weather = weather;
    if weather == Weather::Rain {
        let sfx = world.sfx();
        world.events.looping("rain", sfx * 0.5, None, SoundChannel::Rain);
    }
    world.events.push(SimEvent::WeatherChanged { weather });
}

fn tick_weather(world: &mut WorldState, delta: f32) {
    if !world.scheduler.weather.tick(delta) {
        return;
    }
    let next = *world
        .weather
        .alternatives()
        .choose(&mut world.rng)
        .unwrap_or(&Weather::Clear);
    set_weather(world, next);
    let range = match world.mode {
        GameMode::Story => world.config.scheduler.story_weather,
        GameMode::Ritual => world.config.scheduler.ritual_weather,
    };
    let secs = range.sample(&mut world.rng);
    world.scheduler.weather.reset(secs);
}

fn begin_strike(world: &mut WorldState, target: hecs::Entity) {
    log::info!("lightning targets {}", world.character_id(target));
    world.lightning = Some(LightningStrike::new(target));
}

fn tick_story_lightning(world: &mut WorldState, delta: f32) {
    if !world.scheduler.lightning.tick(delta) {
        return;
    }
    let chance = world.config.scheduler.story_lightning_chance;
    if world.weather == Weather::Rain && world.lightning.is_none() && world.rng.gen_bool(chance) {
        let innocents = world.living_npcs_except(&[world.murderer]);
        if let Some(&victim) = innocents.choose(&mut world.rng) {
            begin_strike(world, victim);
        }
    }
    let secs = world.config.scheduler.story_lightning.sample(&mut world.rng);
    world.scheduler.lightning.reset(secs);
}

fn tick_ritual_lightning(world: &mut WorldState, delta: f32) {
    if world.weather != Weather::Rain || world.camera_mode != CameraMode::PlayerFollow {
        return;
    }
    if !world.scheduler.lightning.tick(delta) {
        return;
    }
    let (lo, hi) = world.config.scheduler.ritual_lightning_chance;
    let chance = if hi > lo { world.rng.gen_range(lo..hi) } else { lo };
    if world.lightning.is_none() && world.rng.gen_bool(chance) {
        let candidates = world.living_npcs_except(&[world.controlled]);
        if let Some(&victim) = candidates.choose(&mut world.rng) {
            begin_strike(world, victim);
            world.camera_mode = CameraMode::EventFocus;
        }
    }
    let secs = world.config.scheduler.ritual_lightning.sample(&mut world.rng);
    world.scheduler.lightning.reset(secs);
}

fn tick_ghost(world: &mut WorldState, delta: f32) {
    if !world.scheduler.ghost.tick(delta) {
        return;
    }
    let living = world.living_npcs();
    let unprotected: Vec<_> = living
        .iter()
        .copied()
        .filter(|e| {
            world
                .ecs
                .get::<&Npc>(*e)
                .map(|n| !n.ritual_protected)
                .unwrap_or(false)
        })
        .collect();
    let pool = if unprotected.is_empty() { &living } else { &unprotected };
    if let Some(&target) = pool.choose(&mut world.rng) {
        if spawn_ghost(world, target) {
            world.camera_mode = CameraMode::GhostFollow;
        }
    }
    let secs = world.config.scheduler.ghost_interval;
    world.scheduler.ghost.reset(secs);
}

fn tick_npc_death(world: &mut WorldState, delta: f32) {
    if !world.scheduler.npc_death.tick(delta) {
        return;
    }
    let innocents = world.living_npcs_except(&[world.murderer]);
    if let Some(&victim) = innocents.choose(&mut world.rng) {
        if world.cinematic.is_none() {
            start_wrong_accusation(world, victim, GhostVisitCause::Scheduled);
        }
        let secs = world.config.scheduler.npc_death_repeat;
        world.scheduler.npc_death.reset(secs);
    } else if world.living_npcs().len() <= 1 {
        if let Some(target) = world.player.or(world.controlled) {
            start_losing(world, target, GameOverReason::Timeout);
        }
    }
}

fn tick_tiger(world: &mut WorldState, delta: f32) {
    world.scheduler.tiger.tick(delta);
    if !world.scheduler.tiger.is_done() || world.tiger.is_some() {
        return;
    }
    let Some(controlled) = world.controlled else {
        return;
    };
    let (anchor, still) = match world.ecs.get::<&crate::components::CharacterState>(controlled) {
        Ok(ch) => (ch.position, ch.stationary_secs),
        Err(_) => return,
    };
    if still <= TIGER_STATIONARY_SECS {
        return;
    }

    let mut best: Option<(hecs::Entity, f32)> = None;
    if WorldBounds::at_edge(anchor, EDGE_THRESHOLD) {
        for e in world.living_npcs_except(&[Some(controlled)]) {
            let Some(pos) = world.position(e) else { continue };
            let d = pos.distance(&anchor);
            if d < TIGER_NEARBY_RADIUS
                && WorldBounds::at_edge(pos, EDGE_THRESHOLD)
                && best.map_or(true, |(_, bd)| d < bd)
            {
                best = Some((e, d));
            }
        }
    }

    let chance = world.config.scheduler.tiger_chance;
    match best {
        Some((target, _)) if world.rng.gen_bool(chance) => {
            spawn_tiger(world, target);
            let secs = world.config.scheduler.tiger_cooldown.sample(&mut world.rng);
            world.scheduler.tiger.reset(secs);
        }
        _ => {
            let secs = world.config.scheduler.tiger_retry;
            world.scheduler.tiger.reset(secs);
        }
    }
}

fn check_ritual_outcome(world: &mut WorldState) {
    let survivors = world.ritual.as_ref().map_or(0, |r| r.survivors);
    if survivors == 0 {
        world.set_state(GameState::GameOver(GameOverReason::AllDead));
    } else if world.scheduler.survival.is_done() {
        start_ritual_ending(world);
    }
}

/// Ease scene lighting toward the current weather.
pub fn atmosphere_system(world: &mut WorldState, delta: f32) {
    let flicker = (world.rng.gen::<f32>() - 0.5, world.rng.gen::<f32>() - 0.5);
    let weather = world.weather;
    let elapsed = world.elapsed;
    world.lighting.approach(weather, delta, flicker, elapsed);

    for b in &mut world.blood {
        b.remaining -= delta;
    }
    world.blood.retain(|b| b.remaining > 0.0);
}
