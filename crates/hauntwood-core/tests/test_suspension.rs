//! Suspension and pause: what freezes and what keeps running.

use hauntwood_core::prelude::*;
use hauntwood_core::world::WorldState;

const CASE: &str = include_str!("../../../data/case_village.json");

fn playing_story() -> SimulationEngine {
    let content = CaseContent::from_json(CASE).unwrap();
    let mut engine = SimulationEngine::new();
    engine
        .start_mode(ModeConfig::story().skipping_intro().with_seed(9), &content)
        .unwrap();
    assert!(engine.start_gameplay());
    engine
}

fn world(engine: &SimulationEngine) -> &WorldState {
    engine.world.as_ref().unwrap()
}

fn npc_positions(engine: &SimulationEngine) -> Vec<(f32, f32)> {
    let w = world(engine);
    w.roster
        .iter()
        .map(|e| {
            let p = w.position(*e).unwrap();
            (p.x, p.z)
        })
        .collect()
}

#[test]
fn test_timers_frozen_while_inventory_open() {
    let mut engine = playing_story();
    engine.update(0.1, &InputSnapshot::idle());

    let open = InputSnapshot {
        inventory: true,
        ..InputSnapshot::idle()
    };
    engine.update(0.1, &open);
    assert!(world(&engine).ui.inventory_open);
    assert!(!engine.suspend_set().is_empty());

    let sched = world(&engine).scheduler;
    let positions = npc_positions(&engine);
    for _ in 0..200 {
        engine.update(0.1, &InputSnapshot::idle());
    }
    assert_eq!(world(&engine).scheduler, sched);
    assert_eq!(npc_positions(&engine), positions);

    engine.update(0.1, &open);
    assert!(engine.suspend_set().is_empty());
    let after = world(&engine).scheduler.npc_death.remaining();
    assert!((sched.npc_death.remaining() - after - 0.1).abs() < 1e-3);
}

#[test]
fn test_map_view_expires_on_its_own() {
    let mut engine = playing_story();
    engine.open_map(10.0, -10.0);
    assert!(world(&engine).ui.map_view.is_some());
    for _ in 0..40 {
        engine.update(0.1, &InputSnapshot::idle());
    }
    assert!(world(&engine).ui.map_view.is_none());
    assert!(engine.suspend_set().is_empty());
}

#[test]
fn test_pause_mid_cinematic_resumes_exactly() {
    let mut engine = playing_story();
    {
        let w = engine.world.as_mut().unwrap();
        let murderer = w.murderer.unwrap();
        let id = w.character_id(murderer);
        let needed = w.content.crucial_evidence(&id).to_vec();
        w.story.as_mut().unwrap().evidence.extend(needed);
    }
    let murderer_id = {
        let w = world(&engine);
        w.character_id(w.murderer.unwrap())
    };
    assert_eq!(engine.accuse(&murderer_id), AccuseOutcome::Correct);
    for _ in 0..10 {
        engine.update(0.05, &InputSnapshot::idle());
    }

    let before = engine.snapshot().unwrap().cinematic.unwrap();
    let pause = InputSnapshot {
        pause: true,
        ..InputSnapshot::idle()
    };
    engine.update(0.05, &pause);
    assert_eq!(engine.state(), Some(GameState::Paused));
    for _ in 0..100 {
        engine.update(0.05, &InputSnapshot::idle());
    }
    let held = engine.snapshot().unwrap().cinematic.unwrap();
    assert_eq!(held, before);

    assert!(engine.toggle_pause());
    assert_eq!(engine.state(), Some(GameState::WinningCinematic));
    engine.update(0.05, &InputSnapshot::idle());
    let resumed = engine.snapshot().unwrap().cinematic.unwrap();
    assert!(resumed.phase_elapsed >= before.phase_elapsed || resumed.phase != before.phase);
}
