//! Character spawning: the story roster and player, or the ritual survivors

use hecs::Entity;
use hauntwood_logic::constants::character::{NPC_SPEED, PLAYER_SPEED};
use hauntwood_logic::constants::npc::{INITIAL_IDLE_MAX, INITIAL_IDLE_MIN, SPAWN_POINTS};
use hauntwood_logic::constants::ritual::ALTAR_COUNT;
use hauntwood_logic::geometry::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;

use super::names::generate_names;
use super::village::safe_spawn;
use crate::components::{CharacterState, ClipKind, Npc, Player};
use crate::world::WorldState;

fn spawn_point(index: usize) -> Vec3 {
    let (x, z) = SPAWN_POINTS[index % SPAWN_POINTS.len()];
    Vec3::ground(x, z)
}

fn spawn_npc(world: &mut WorldState, id: String, name: String, role: String) -> Entity {
    let index = world.roster.len();
    let at = safe_spawn(spawn_point(index), &world.collidables, &world.bounds, &mut world.rng);
    let idle = world.rng.gen_range(INITIAL_IDLE_MIN..INITIAL_IDLE_MAX);
    let entity = world.ecs.spawn((
        CharacterState::new(id, at, NPC_SPEED, ClipKind::Npc),
        Npc::new(name, role, index, idle),
    ));
    world.roster.push(entity);
    entity
}

/// Spawn the case's NPCs in content order.
pub fn spawn_story_roster(world: &mut WorldState) -> Vec<Entity> {
    let defs = world.content.npcs.clone();
    defs.into_iter()
        .map(|d| spawn_npc(world, d.id, d.name, d.role))
        .collect()
}

/// Spawn the seven ritual survivors with generated names.
pub fn spawn_survivors(world: &mut WorldState) -> Vec<Entity> {
    let names = generate_names(&mut world.rng, ALTAR_COUNT);
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| spawn_npc(world, format!("ritual_npc_{}", i), name, "Survivor".to_string()))
        .collect()
}

pub fn spawn_player(world: &mut WorldState) -> Entity {
    let at = safe_spawn(Vec3::ZERO, &world.collidables, &world.bounds, &mut world.rng);
    let entity = world.ecs.spawn((
        CharacterState::new("player", at, PLAYER_SPEED, ClipKind::Player),
        Player,
    ));
    world.player = Some(entity);
    entity
}

/// Resolve the murderer: the fixed id if given, else a random suspect from
/// the evidence map, else any NPC.
pub fn choose_murderer(world: &mut WorldState) -> Option<Entity> {
    let by_id = |world: &WorldState, id: &str| {
        world
            .roster
            .iter()
            .copied()
            .find(|e| world.character_id(*e) == id)
    };

    let chosen = match world.content.murderer.clone() {
        Some(id) => by_id(world, &id),
        None => {
            let suspects: Vec<String> = world.content.suspects().into_iter().map(str::to_string).collect();
            match suspects.choose(&mut world.rng) {
                Some(id) => by_id(world, id),
                None => world.roster.choose(&mut world.rng).copied(),
            }
        }
    };
    if let Some(m) = chosen {
        log::info!("murderer is {}", world.npc_name(m));
    }
    world.murderer = chosen;
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::content::CaseContent;

    fn content() -> CaseContent {
        CaseContent::from_json(
            r#"{
                "id": "t",
                "npcs": [
                    { "id": "a", "name": "Ada" },
                    { "id": "b", "name": "Bo" },
                    { "id": "c", "name": "Cy" }
                ],
                "murderer_evidence": { "b": ["ev1"], "c": ["ev2"] }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_story_roster_in_content_order() {
        let mut world = WorldState::new(ModeConfig::story(), content());
        let spawned = spawn_story_roster(&mut world);
        assert_eq!(spawned.len(), 3);
        assert_eq!(world.character_id(spawned[0]), "a");
        assert_eq!(world.position(spawned[0]), Some(spawn_point(0)));
        assert_eq!(world.ecs.get::<&Npc>(spawned[2]).unwrap().roster_index, 2);
    }

    #[test]
    fn test_random_murderer_is_a_suspect() {
        for seed in 0..10 {
            let mut world = WorldState::new(ModeConfig::story().with_seed(seed), content());
            spawn_story_roster(&mut world);
            let m = choose_murderer(&mut world).unwrap();
            let id = world.character_id(m);
            assert!(id == "b" || id == "c");
        }
    }

    #[test]
    fn test_seven_survivors() {
        let mut world = WorldState::new(ModeConfig::ritual(), content());
        let s = spawn_survivors(&mut world);
        assert_eq!(s.len(), 7);
        assert_eq!(world.living_npcs().len(), 7);
    }
}
