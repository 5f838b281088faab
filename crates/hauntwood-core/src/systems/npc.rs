//! NPC autonomy (idle, wander, follow) and the input-driven controlled character.

use hecs::Entity;
use hauntwood_logic::constants::character::{PLAYER_SPEED, SPRINT_MULTIPLIER};
use hauntwood_logic::constants::npc::{
    ARRIVAL_RADIUS, FOLLOW_DISTANCE, FOLLOW_SPEED_MULTIPLIER, IDLE_MAX, IDLE_MIN,
};
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::movement::input_velocity;
use rand::Rng;

use super::character::{update_character, Drive, TickContext};
use crate::components::{CharacterState, Npc, NpcBehavior};
use crate::events::{Message, SimEvent};
use crate::input::InputSnapshot;
use crate::state::GameMode;
use crate::world::WorldState;

/// Position and follow-eligibility of every character, read before NPCs move.
fn follow_targets(world: &WorldState) -> Vec<(Entity, Vec3, bool)> {
    world
        .ecs
        .query::<(&CharacterState, Option<&Npc>)>()
        .iter()
        .map(|(e, (ch, npc))| {
            let alive = npc.map_or(!ch.is_dead(), |n| n.is_alive());
            (e, ch.position, alive && ch.visible)
        })
        .collect()
}

/// Random point anywhere inside the world bounds.
fn wander_target<R: Rng + ?Sized>(rng: &mut R, world: &hauntwood_logic::geometry::WorldBounds) -> Vec3 {
    Vec3::ground(
        rng.gen_range(world.min_x..world.max_x),
        rng.gen_range(world.min_z..world.max_z),
    )
}

/// Advance every autonomous NPC. Controlled, scripted and dead NPCs are skipped.
///
/// While `suspended`, NPCs only animate in place and their timers hold.
pub fn npc_system(world: &mut WorldState, delta: f32, suspended: bool) {
    let targets = follow_targets(world);
    let ctx = TickContext {
        delta,
        collidables: Some(world.collidables.as_slice()),
        bounds: &world.bounds,
        paused: suspended,
        weather: world.weather,
        sfx_volume: world.config.sfx_volume,
    };

    for &entity in &world.roster {
        if Some(entity) == world.controlled {
            continue;
        }
        let Ok((ch, npc)) = world.ecs.query_one_mut::<(&mut CharacterState, &mut Npc)>(entity) else {
            continue;
        };
        if !npc.is_alive() {
            continue;
        }
        if suspended {
            if !matches!(npc.behavior, NpcBehavior::Scripted) {
                update_character(ch, &ctx, Drive::Still, &mut world.events);
            }
            continue;
        }

        let drive = match npc.behavior {
            NpcBehavior::Dead | NpcBehavior::Scripted => continue,
            NpcBehavior::Controlled => {
                // Control moved elsewhere without handing back.
                npc.behavior = NpcBehavior::Idle {
                    timer: world.rng.gen_range(IDLE_MIN..IDLE_MAX),
                };
                Drive::Still
            }
            NpcBehavior::Following { target } => {
                match targets.iter().find(|(e, _, ok)| *e == target && *ok) {
                    Some(&(_, goal, _)) => {
                        if ch.position.ground_distance(&goal) > FOLLOW_DISTANCE {
                            Drive::Direct {
                                direction: ch.position.ground_direction(&goal),
                                speed: ch.speed * FOLLOW_SPEED_MULTIPLIER,
                            }
                        } else {
                            Drive::Still
                        }
                    }
                    None => {
                        npc.behavior = NpcBehavior::Idle {
                            timer: world.rng.gen_range(IDLE_MIN..IDLE_MAX),
                        };
                        Drive::Still
                    }
                }
            }
            NpcBehavior::Idle { timer } => {
                let timer = timer - delta;
                if timer <= 0.0 {
                    let target = wander_target(&mut world.rng, &world.bounds);
                    npc.behavior = NpcBehavior::Wandering { target };
                    wander_drive(ch, npc, target, &mut world.rng)
                } else {
                    npc.behavior = NpcBehavior::Idle { timer };
                    Drive::Still
                }
            }
            NpcBehavior::Wandering { target } => wander_drive(ch, npc, target, &mut world.rng),
        };
        update_character(ch, &ctx, drive, &mut world.events);
    }
}

fn wander_drive<R: Rng + ?Sized>(ch: &CharacterState, npc: &mut Npc, target: Vec3, rng: &mut R) -> Drive {
    if ch.position.ground_distance(&target) > ARRIVAL_RADIUS {
        Drive::Direct {
            direction: ch.position.ground_direction(&target),
            speed: ch.speed,
        }
    } else {
        npc.behavior = NpcBehavior::Idle {
            timer: rng.gen_range(IDLE_MIN..IDLE_MAX),
        };
        Drive::Still
    }
}

/// Drive the controlled character from input.
///
/// Story: the player, with sprint. Ritual: the controlled NPC at player
/// speed; while suspended it eases to a stop rather than freezing.
pub fn controlled_system(world: &mut WorldState, delta: f32, input: &InputSnapshot, suspended: bool) {
    let Some(entity) = world.controlled else {
        return;
    };
    if !world.is_alive(entity) {
        return;
    }
    let mode = world.mode;
    let ctx = TickContext {
        delta,
        collidables: Some(world.collidables.as_slice()),
        bounds: &world.bounds,
        paused: suspended && mode == GameMode::Story,
        weather: world.weather,
        sfx_volume: world.config.sfx_volume,
    };
    let Ok(ch) = world.ecs.query_one_mut::<&mut CharacterState>(entity) else {
        return;
    };

    let target_velocity = if suspended {
        Vec3::ZERO
    } else {
        let speed = match mode {
            GameMode::Story if input.sprint => ch.speed * SPRINT_MULTIPLIER,
            GameMode::Story => ch.speed,
            GameMode::Ritual => PLAYER_SPEED,
        };
        input_velocity(input.move_x, input.move_z, speed)
    };
    update_character(ch, &ctx, Drive::Smoothed { target_velocity }, &mut world.events);
}

/// Hand input control to a ritual NPC. Gaining control clears any follow;
/// the previous holder goes back to idling.
pub fn take_control(world: &mut WorldState, entity: Entity) -> bool {
    if world.mode != GameMode::Ritual || !world.is_alive(entity) || world.controlled == Some(entity) {
        return false;
    }
    if let Some(prev) = world.controlled {
        let idle = world.rng.gen_range(IDLE_MIN..IDLE_MAX);
        if let Ok(mut npc) = world.ecs.get::<&mut Npc>(prev) {
            if npc.is_alive() {
                npc.behavior = NpcBehavior::Idle { timer: idle };
            }
        }
        if let Ok(mut ch) = world.ecs.get::<&mut CharacterState>(prev) {
            ch.velocity = Vec3::ZERO;
        }
    }
    let name = match world.ecs.get::<&mut Npc>(entity) {
        Ok(mut npc) => {
            npc.behavior = NpcBehavior::Controlled;
            npc.name.clone()
        }
        Err(_) => return false,
    };
    world.controlled = Some(entity);
    log::info!("control switched to {}", name);
    world
        .events
        .push(SimEvent::Message(Message::ControlSwitched { name }));
    true
}

/// Select by roster slot, if that NPC is alive.
pub fn select_character(world: &mut WorldState, slot: usize) -> bool {
    match world.roster.get(slot).copied() {
        Some(e) => take_control(world, e),
        None => false,
    }
}

/// Move control to the next living NPC after the current one, wrapping.
pub fn cycle_character(world: &mut WorldState) -> bool {
    let start = world
        .controlled
        .and_then(|e| world.roster_index(e))
        .unwrap_or(0);
    let n = world.roster.len();
    for step in 1..=n {
        let e = world.roster[(start + step) % n];
        if world.is_alive(e) && Some(e) != world.controlled {
            return take_control(world, e);
        }
    }
    false
}

/// Toggle whether `npc` follows the controlled character.
///
/// Following the controlled NPC stops it; following nobody starts it.
/// Following someone else is left alone.
pub fn toggle_follow(world: &mut WorldState, npc_entity: Entity) -> bool {
    let Some(leader) = world.controlled else {
        return false;
    };
    if npc_entity == leader || !world.is_alive(npc_entity) {
        return false;
    }
    let idle = world.rng.gen_range(IDLE_MIN..IDLE_MAX);
    let Ok(mut npc) = world.ecs.get::<&mut Npc>(npc_entity) else {
        return false;
    };
    match npc.behavior {
        NpcBehavior::Following { target } if target == leader => {
            npc.behavior = NpcBehavior::Idle { timer: idle };
            true
        }
        NpcBehavior::Following { .. } | NpcBehavior::Scripted | NpcBehavior::Dead => false,
        _ => {
            npc.behavior = NpcBehavior::Following { target: leader };
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ClipKind, NpcStatus};
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use hauntwood_logic::constants::character::NPC_SPEED;

    fn content() -> CaseContent {
        CaseContent::from_json(
            r#"{ "id": "t", "npcs": [
                { "id": "a", "name": "A" }, { "id": "b", "name": "B" }, { "id": "c", "name": "C" }
            ] }"#,
        )
        .unwrap()
    }

    fn world_with(mode: GameMode, positions: &[(f32, f32)]) -> WorldState {
        let cfg = match mode {
            GameMode::Story => ModeConfig::story(),
            GameMode::Ritual => ModeConfig::ritual(),
        };
        let content = content();
        let mut world = WorldState::new(cfg, content.clone());
        for (i, (def, &(x, z))) in content.npcs.iter().zip(positions).enumerate() {
            let e = world.ecs.spawn((
                CharacterState::new(def.id.clone(), Vec3::ground(x, z), NPC_SPEED, ClipKind::Npc),
                Npc::new(def.name.clone(), "", i, 100.0),
            ));
            world.roster.push(e);
        }
        world
    }

    #[test]
    fn idle_expiry_starts_wandering() {
        let mut world = world_with(GameMode::Story, &[(0.0, 0.0)]);
        let e = world.roster[0];
        world.ecs.get::<&mut Npc>(e).unwrap().behavior = NpcBehavior::Idle { timer: 0.05 };
        npc_system(&mut world, 0.1, false);
        let b = world.ecs.get::<&Npc>(e).unwrap().behavior;
        assert!(matches!(b, NpcBehavior::Wandering { .. } | NpcBehavior::Idle { .. }));
        if let NpcBehavior::Wandering { target } = b {
            assert!(world.bounds.contains(target));
        }
    }

    #[test]
    fn arrival_resets_idle_timer() {
        let mut world = world_with(GameMode::Story, &[(0.0, 0.0)]);
        let e = world.roster[0];
        world.ecs.get::<&mut Npc>(e).unwrap().behavior = NpcBehavior::Wandering {
            target: Vec3::ground(0.5, 0.0),
        };
        npc_system(&mut world, 0.1, false);
        match world.ecs.get::<&Npc>(e).unwrap().behavior {
            NpcBehavior::Idle { timer } => assert!((IDLE_MIN..IDLE_MAX).contains(&timer)),
            other => panic!("expected idle, got {:?}", other),
        };
    }

    #[test]
    fn follower_keeps_distance() {
        let mut world = world_with(GameMode::Ritual, &[(0.0, 0.0), (10.0, 0.0)]);
        let (leader, follower) = (world.roster[0], world.roster[1]);
        world.controlled = Some(leader);
        world.ecs.get::<&mut Npc>(leader).unwrap().behavior = NpcBehavior::Controlled;
        assert!(toggle_follow(&mut world, follower));
        for _ in 0..200 {
            npc_system(&mut world, 0.05, false);
        }
        let d = world.position(follower).unwrap().ground_distance(&Vec3::ZERO);
        assert!(d <= FOLLOW_DISTANCE + 0.2, "follower closed in, d = {}", d);
        assert!(d > 2.5, "but stops outside the follow distance");
        assert!(toggle_follow(&mut world, follower));
        assert!(matches!(
            world.ecs.get::<&Npc>(follower).unwrap().behavior,
            NpcBehavior::Idle { .. }
        ));
    }

    #[test]
    fn follower_of_dead_target_reverts_to_idle() {
        let mut world = world_with(GameMode::Ritual, &[(0.0, 0.0), (10.0, 0.0)]);
        let (a, b) = (world.roster[0], world.roster[1]);
        world.ecs.get::<&mut Npc>(b).unwrap().behavior = NpcBehavior::Following { target: a };
        world.ecs.get::<&mut Npc>(a).unwrap().status = NpcStatus::Deceased;
        npc_system(&mut world, 0.1, false);
        assert!(matches!(
            world.ecs.get::<&Npc>(b).unwrap().behavior,
            NpcBehavior::Idle { .. }
        ));
    }

    #[test]
    fn suspended_npcs_hold_position_and_timers() {
        let mut world = world_with(GameMode::Story, &[(0.0, 0.0)]);
        let e = world.roster[0];
        world.ecs.get::<&mut Npc>(e).unwrap().behavior = NpcBehavior::Wandering {
            target: Vec3::ground(50.0, 0.0),
        };
        npc_system(&mut world, 0.5, true);
        assert_eq!(world.position(e).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn taking_control_clears_follow_and_cycles() {
        let mut world = world_with(GameMode::Ritual, &[(0.0, 0.0), (5.0, 0.0), (9.0, 0.0)]);
        let (a, b, c) = (world.roster[0], world.roster[1], world.roster[2]);
        assert!(take_control(&mut world, a));
        world.ecs.get::<&mut Npc>(b).unwrap().behavior = NpcBehavior::Following { target: a };
        assert!(select_character(&mut world, 1));
        assert_eq!(world.controlled, Some(b));
        assert_eq!(world.ecs.get::<&Npc>(b).unwrap().behavior, NpcBehavior::Controlled);
        world.ecs.get::<&mut Npc>(c).unwrap().status = NpcStatus::Deceased;
        assert!(cycle_character(&mut world));
        assert_eq!(world.controlled, Some(a), "dead NPCs are skipped");
    }

    #[test]
    fn controlled_npc_moves_from_input() {
        let mut world = world_with(GameMode::Ritual, &[(0.0, 0.0)]);
        let a = world.roster[0];
        take_control(&mut world, a);
        for _ in 0..30 {
            controlled_system(&mut world, 0.05, &InputSnapshot::moving(1.0, 0.0), false);
        }
        assert!(world.position(a).unwrap().x > 1.0);
    }
}
