//! NPC death: the single place status flips to deceased.

use hecs::Entity;
use hauntwood_logic::constants::npc::{IDLE_MAX, IDLE_MIN};
use hauntwood_logic::geometry::Vec3;
use rand::Rng;

use super::character::silence;
use super::cinematics::start_losing;
use super::npc::take_control;
use crate::components::{CharacterState, Npc, NpcBehavior, NpcStatus};
use crate::events::{DeathCause, SimEvent};
use crate::state::{GameMode, GameOverReason, GameState};
use crate::world::{DeathMarker, WorldState};

/// Kill an NPC. Returns false if it was already dead or is not an NPC.
///
/// Safe to call from any number of threat paths in the same tick.
pub fn handle_npc_death(world: &mut WorldState, entity: Entity, cause: DeathCause) -> bool {
    let (name, position) = {
        let Ok((ch, npc)) = world.ecs.query_one_mut::<(&mut CharacterState, &mut Npc)>(entity) else {
            return false;
        };
        if npc.status == NpcStatus::Deceased {
            return false;
        }
        npc.status = NpcStatus::Deceased;
        npc.behavior = NpcBehavior::Dead;
        ch.visible = false;
        ch.moving = false;
        ch.velocity = Vec3::ZERO;
        ch.hp = 0.0;
        silence(ch, &mut world.events);
        (npc.name.clone(), ch.position)
    };

    log::info!("{} died ({:?})", name, cause);
    world.death_markers.push(DeathMarker {
        npc: name.clone(),
        position,
    });
    world.events.push(SimEvent::NpcDied { npc: name, cause });

    match world.mode {
        GameMode::Ritual => ritual_aftermath(world, entity, position),
        GameMode::Story => {
            if world.living_npcs().is_empty() && world.state == GameState::Playing {
                if let Some(player) = world.player {
                    start_losing(world, player, GameOverReason::Timeout);
                }
            }
        }
    }
    true
}

fn ritual_aftermath(world: &mut WorldState, dead: Entity, at: Vec3) {
    if let Some(r) = world.ritual.as_mut() {
        r.survivors = r.survivors.saturating_sub(1);
    }

    let followers: Vec<Entity> = world
        .ecs
        .query::<&Npc>()
        .iter()
        .filter(|(_, n)| n.behavior.following() == Some(dead))
        .map(|(e, _)| e)
        .collect();
    for e in followers {
        let timer = world.rng.gen_range(IDLE_MIN..IDLE_MAX);
        if let Ok(mut npc) = world.ecs.get::<&mut Npc>(e) {
            npc.behavior = NpcBehavior::Idle { timer };
        }
    }

    if world.controlled == Some(dead) {
        let mut nearest: Option<(Entity, f32)> = None;
        for e in world.living_npcs() {
            let Some(p) = world.position(e) else { continue };
            let d = p.ground_distance(&at);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((e, d));
            }
        }
        world.controlled = None;
        if let Some((next, _)) = nearest {
            take_control(world, next);
        }
    }

    let survivors = world.ritual.as_ref().map_or(0, |r| r.survivors);
    if survivors == 1 && world.state == GameState::RitualPlaying {
        if let Some(&last) = world.living_npcs().first() {
            start_losing(world, last, GameOverReason::AllDead);
        }
    }
}
