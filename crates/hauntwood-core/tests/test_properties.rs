use hauntwood_core::events::DeathCause;
use hauntwood_core::prelude::*;
use hauntwood_core::systems::handle_npc_death;
use proptest::prelude::*;

fn content() -> CaseContent {
    CaseContent::from_json(include_str!("../../../data/case_village.json")).unwrap()
}

fn input_strategy() -> impl Strategy<Value = InputSnapshot> {
    (-1.0_f32..=1.0, -1.0_f32..=1.0, any::<bool>(), any::<bool>()).prop_map(
        |(move_x, move_z, sprint, cycle_character)| InputSnapshot {
            move_x,
            move_z,
            sprint,
            cycle_character,
            ..InputSnapshot::idle()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn deceased_npc_never_moves_or_returns(
        seed in 0_u64..5_000,
        victim in 0_usize..7,
        inputs in prop::collection::vec(input_strategy(), 1..120),
    ) {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::ritual().skipping_intro().with_seed(seed), &content())
            .unwrap();
        let (dead, at) = {
            let w = engine.world.as_mut().unwrap();
            let dead = w.roster[victim];
            prop_assert!(handle_npc_death(w, dead, DeathCause::Lightning));
            (dead, w.position(dead).unwrap())
        };

        for input in &inputs {
            engine.update(0.1, input);
            let w = engine.world.as_ref().unwrap();
            prop_assert_eq!(w.position(dead), Some(at));
            prop_assert!(!w.is_alive(dead));
            prop_assert!(!w.living_npcs().contains(&dead));
            prop_assert_ne!(w.controlled, Some(dead));
        }
    }

    #[test]
    fn characters_stay_inside_bounds(
        seed in 0_u64..5_000,
        inputs in prop::collection::vec(input_strategy(), 1..200),
    ) {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::story().skipping_intro().with_seed(seed), &content())
            .unwrap();
        engine.start_gameplay();
        for input in &inputs {
            engine.update(0.25, input);
        }
        let w = engine.world.as_ref().unwrap();
        let snap = engine.snapshot().unwrap();
        for e in &snap.entities {
            prop_assert!(w.bounds.contains(e.position), "{} escaped to {:?}", e.id, e.position);
        }
    }
}
