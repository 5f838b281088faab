//! Simulation engine - main entry point for running a mode

use hauntwood_logic::geometry::Vec3;
use rand::seq::SliceRandom;

use crate::config::ModeConfig;
use crate::content::CaseContent;
use crate::events::{Message, SimEvent, SoundChannel};
use crate::generation::{
    boundary_trees, choose_murderer, place_altars, spawn_player, spawn_story_roster,
    spawn_survivors,
};
use crate::input::InputSnapshot;
use crate::snapshot::FrameSnapshot;
use crate::state::{GameMode, GameOverReason, GameState, SuspendSet};
use crate::systems::*;
use crate::world::{CameraMode, RitualState, StoryProgress, WorldState};
use crate::StartError;

/// Result of an accusation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuseOutcome {
    /// Wrong mode or state, unknown NPC, or a cinematic is already running.
    Ignored,
    NotEnoughEvidence,
    Correct,
    Wrong { accusations_left: u8 },
}

/// Main simulation engine
///
/// Holds at most one running mode. Every call is a no-op until
/// [`SimulationEngine::start_mode`] succeeds.
#[derive(Default)]
pub struct SimulationEngine {
    /// World for the running mode
    pub world: Option<WorldState>,
}

impl SimulationEngine {
    /// Create an engine with no mode running
    pub fn new() -> Self {
        Self { world: None }
    }

    /// Validate inputs, build a fresh world and spawn its characters.
    ///
    /// Any running mode is torn down first.
    pub fn start_mode(&mut self, config: ModeConfig, content: &CaseContent) -> Result<(), StartError> {
        config.validate()?;
        content.validate()?;
        self.teardown_mode();

        let mut world = WorldState::new(config, content.clone());
        world.collidables = content.obstacles.clone();
        let trees = boundary_trees(&world.bounds);
        world.collidables.extend(trees);

        match world.mode {
            GameMode::Story => {
                spawn_story_roster(&mut world);
                let player = spawn_player(&mut world);
                world.controlled = Some(player);
                choose_murderer(&mut world);
                world.story = Some(StoryProgress::default());
            }
            GameMode::Ritual => {
                let survivors = spawn_survivors(&mut world);
                let altars = place_altars(&mut world.rng);
                world.ritual = Some(RitualState {
                    altars,
                    survivors: survivors.len(),
                    pending_death: None,
                });
                if let Some(&first) = survivors.first() {
                    take_control(&mut world, first);
                }
            }
        }

        world.scheduler = SchedulerState::arm(world.mode, &world.config.scheduler, &mut world.rng);
        let sfx = world.sfx();
        world.events.looping("wind", sfx * 0.4, None, SoundChannel::Wind);

        if world.config.skip_intro {
            finish_intro(&mut world);
        } else {
            world.intro = Some(IntroFlight::for_mode(world.mode));
            world.camera_mode = CameraMode::Intro;
        }

        log::info!(
            "{:?} mode started: case {}, {} npcs, seed {}",
            world.mode,
            world.content.id,
            world.roster.len(),
            world.config.seed
        );
        self.world = Some(world);
        Ok(())
    }

    /// Drop the running mode, if any.
    pub fn teardown_mode(&mut self) {
        if let Some(world) = self.world.take() {
            log::info!("{:?} mode torn down after {} ticks", world.mode, world.tick);
        }
    }

    /// Advance the running mode by `delta` seconds.
    pub fn update(&mut self, delta: f32, input: &InputSnapshot) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let delta = delta.max(0.0);

        // S1: Input and UI toggles
        if input.pause {
            toggle_pause(world);
        }
        if world.state == GameState::Paused {
            return;
        }
        handle_input(world, input);

        // S2: State dispatch
        if world.state == GameState::Intro {
            intro_system(world, delta);
        }
        cinematic_system(world, delta);

        // S3: Scheduler (suspend set computed once for the rest of the tick)
        let suspended = world.suspend_set();
        let active = !world.state.is_terminal() && world.state != GameState::Intro;
        if active {
            scheduler_tick(world, delta, &suspended);
        }

        // S4: Entities
        if active {
            npc_system(world, delta, !suspended.is_empty());
            if accepts_control(world.state) {
                controlled_system(world, delta, input, !suspended.is_empty());
            }
            ghost_system(world, delta);
            pending_death_system(world, delta);
            lightning_system(world, delta);
            tiger_system(world, delta);
            enemy_system(world, delta);
        }
        atmosphere_system(world, delta);
        ui_timer_system(world, delta);

        // S5: Interaction
        if accepts_control(world.state) {
            resolve_interaction(world, &suspended);
            if world.ui.dialogue.is_none() {
                apply_interaction(world, input);
            }
            whisper_system(world, &suspended);
        }

        // S6: Camera
        camera_system(world, delta, &suspended);

        // S7: Clock
        world.tick += 1;
        world.elapsed += delta;
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// Accuse the NPC with content id `npc_id` of the murder.
    pub fn accuse(&mut self, npc_id: &str) -> AccuseOutcome {
        let Some(world) = self.world.as_mut() else {
            return AccuseOutcome::Ignored;
        };
        accuse(world, npc_id)
    }

    pub fn close_dialogue(&mut self) -> bool {
        self.world.as_mut().is_some_and(close_dialogue)
    }

    /// Leave the story briefing and start investigating.
    pub fn start_gameplay(&mut self) -> bool {
        match self.world.as_mut() {
            Some(world) if world.state == GameState::Briefing => {
                world.set_state(GameState::Playing);
                true
            }
            _ => false,
        }
    }

    pub fn skip_intro(&mut self) -> bool {
        match self.world.as_mut() {
            Some(world) if world.state == GameState::Intro => {
                finish_intro(world);
                true
            }
            _ => false,
        }
    }

    /// Leave the ritual ending once every survivor has walked off.
    pub fn show_finish_screen(&mut self) -> bool {
        let Some(world) = self.world.as_mut() else {
            return false;
        };
        let complete = matches!(
            &world.cinematic,
            Some(CinematicSession::RitualEnding(s)) if s.phase == OutroPhase::Complete
        );
        if world.state != GameState::RitualEnding || !complete {
            return false;
        }
        world.cinematic = None;
        world.camera_mode = CameraMode::PlayerFollow;
        world.set_state(GameState::FinishScreen);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.world.as_mut().is_some_and(toggle_pause)
    }

    pub fn request_hint(&mut self) -> bool {
        self.world.as_mut().is_some_and(request_hint)
    }

    pub fn open_map(&mut self, x: f32, z: f32) {
        if let Some(world) = self.world.as_mut() {
            open_map(world, Vec3::ground(x, z));
        }
    }

    /// Drop a hostile chaser at `at` that hunts the controlled character.
    pub fn spawn_enemy(&mut self, x: f32, z: f32) -> bool {
        let Some(world) = self.world.as_mut() else {
            return false;
        };
        match world.controlled {
            Some(target) => spawn_enemy(world, Vec3::ground(x, z), target),
            None => false,
        }
    }

    /// Take control of the ritual survivor in roster `slot` (0-based).
    pub fn select_character(&mut self, slot: usize) -> bool {
        self.world
            .as_mut()
            .is_some_and(|w| select_character(w, slot))
    }

    pub fn cycle_character(&mut self) -> bool {
        self.world.as_mut().is_some_and(cycle_character)
    }

    // ── Outputs ────────────────────────────────────────────────────────

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world
            .as_mut()
            .map(|w| w.events.drain())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<FrameSnapshot> {
        self.world.as_ref().map(FrameSnapshot::capture)
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn state(&self) -> Option<GameState> {
        self.world.as_ref().map(|w| w.state)
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.world.as_ref().map(|w| w.mode)
    }

    pub fn npc_count(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.roster.len())
    }

    pub fn living_npc_count(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.living_npcs().len())
    }

    pub fn suspend_set(&self) -> SuspendSet {
        self.world
            .as_ref()
            .map_or_else(SuspendSet::empty, WorldState::suspend_set)
    }

    pub fn tick(&self) -> u64 {
        self.world.as_ref().map_or(0, |w| w.tick)
    }
}

/// States in which input moves the controlled character.
fn accepts_control(state: GameState) -> bool {
    matches!(state, GameState::Playing | GameState::RitualPlaying)
}

fn toggle_pause(world: &mut WorldState) -> bool {
    if world.state == GameState::Paused {
        let resume = world.paused_from.take().unwrap_or(GameState::Playing);
        world.set_state(resume);
        return true;
    }
    if world.state.is_terminal() {
        return false;
    }
    world.paused_from = Some(world.state);
    world.set_state(GameState::Paused);
    true
}

fn handle_input(world: &mut WorldState, input: &InputSnapshot) {
    match world.state {
        GameState::Intro if input.confirm || input.cancel => finish_intro(world),
        GameState::Briefing if input.confirm => world.set_state(GameState::Playing),
        GameState::Playing | GameState::RitualPlaying => {
            if world.ui.dialogue.is_some() {
                dialogue_input(world, input);
                return;
            }
            if world.mode == GameMode::Story {
                if input.inventory {
                    world.ui.inventory_open = !world.ui.inventory_open;
                }
                if input.journal {
                    world.ui.journal_open = !world.ui.journal_open;
                }
                if input.hint {
                    request_hint(world);
                }
            }
            if let Some((x, z)) = input.map_view {
                open_map(world, Vec3::ground(x, z));
            }
            if let Some(slot) = input.select_character {
                select_character(world, slot);
            } else if input.cycle_character {
                cycle_character(world);
            }
        }
        _ => {}
    }
}

fn accuse(world: &mut WorldState, npc_id: &str) -> AccuseOutcome {
    if world.mode != GameMode::Story || world.state != GameState::Playing || world.cinematic.is_some() {
        return AccuseOutcome::Ignored;
    }
    let Some(accused) = world
        .roster
        .iter()
        .copied()
        .find(|e| world.character_id(*e) == npc_id && world.is_alive(*e))
    else {
        return AccuseOutcome::Ignored;
    };

    let murderer_id = world.murderer.map(|m| world.character_id(m)).unwrap_or_default();
    let required = world.content.crucial_evidence(&murderer_id).to_vec();
    let Some(progress) = world.story.as_mut() else {
        return AccuseOutcome::Ignored;
    };
    if !progress.has_all(&required) {
        world
            .events
            .push(SimEvent::Message(Message::NotEnoughEvidence));
        return AccuseOutcome::NotEnoughEvidence;
    }
    progress.accusations_left = progress.accusations_left.saturating_sub(1);
    let accusations_left = progress.accusations_left;
    close_dialogue(world);

    if Some(accused) == world.murderer {
        log::info!("correct accusation: {}", npc_id);
        start_winning(world);
        return AccuseOutcome::Correct;
    }

    log::info!("wrong accusation: {} ({} left)", npc_id, accusations_left);
    if accusations_left == 0 {
        if let Some(target) = world.player {
            start_losing(world, target, GameOverReason::Accusation);
        }
    } else {
        let bystanders = world.living_npcs_except(&[world.murderer, Some(accused)]);
        match bystanders.choose(&mut world.rng) {
            Some(&victim) => {
                start_wrong_accusation(world, victim, GhostVisitCause::Accusation { accusations_left });
            }
            None => log::debug!("no bystander left for the ghost"),
        }
    }
    AccuseOutcome::Wrong { accusations_left }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: &str = r#"{
        "id": "test_case",
        "npcs": [
            { "id": "somchai", "name": "Somchai", "role": "Farmer" },
            { "id": "malee", "name": "Malee", "role": "Healer" },
            { "id": "prasert", "name": "Prasert", "role": "Monk" }
        ],
        "murderer": "malee",
        "clues": [ { "id": "knife", "kind": "static", "x": 40, "z": 40, "evidence": "blade" } ],
        "murderer_evidence": { "malee": ["blade"] }
    }"#;

    fn content() -> CaseContent {
        CaseContent::from_json(CASE).unwrap()
    }

    fn story_engine() -> SimulationEngine {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::story().skipping_intro(), &content())
            .unwrap();
        assert!(engine.start_gameplay());
        engine
    }

    fn give_evidence(engine: &mut SimulationEngine) {
        let world = engine.world.as_mut().unwrap();
        world.story.as_mut().unwrap().evidence.push("blade".into());
    }

    #[test]
    fn test_engine_creation() {
        let mut engine = SimulationEngine::new();
        assert_eq!(engine.npc_count(), 0);
        assert!(engine.state().is_none());
        engine.update(0.016, &InputSnapshot::idle());
        assert_eq!(engine.tick(), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_story_start() {
        let mut engine = SimulationEngine::new();
        engine.start_mode(ModeConfig::story(), &content()).unwrap();
        assert_eq!(engine.state(), Some(GameState::Intro));
        assert_eq!(engine.npc_count(), 3);
        let world = engine.world.as_ref().unwrap();
        assert_eq!(world.controlled, world.player);
        assert_eq!(world.character_id(world.murderer.unwrap()), "malee");
        assert!(engine.skip_intro());
        assert_eq!(engine.state(), Some(GameState::Briefing));
    }

    #[test]
    fn test_ritual_start() {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::ritual().skipping_intro(), &content())
            .unwrap();
        assert_eq!(engine.state(), Some(GameState::RitualPlaying));
        assert_eq!(engine.living_npc_count(), 7);
        let world = engine.world.as_ref().unwrap();
        assert_eq!(world.controlled, Some(world.roster[0]));
        assert_eq!(world.ritual.as_ref().unwrap().altars.len(), 7);
        assert!(world.player.is_none());
    }

    #[test]
    fn test_start_rejects_bad_config() {
        let mut engine = SimulationEngine::new();
        let mut cfg = ModeConfig::story();
        cfg.sfx_volume = 3.0;
        assert!(matches!(engine.start_mode(cfg, &content()), Err(StartError::Config(_))));
        assert!(engine.world.is_none());
    }

    #[test]
    fn test_engine_update() {
        let mut engine = story_engine();
        for _ in 0..120 {
            engine.update(1.0 / 60.0, &InputSnapshot::moving(1.0, 0.0));
        }
        assert_eq!(engine.tick(), 120);
        let world = engine.world.as_ref().unwrap();
        assert!(world.controlled_position().unwrap().x > 1.0);
    }

    #[test]
    fn test_intro_runs_to_briefing() {
        let mut engine = SimulationEngine::new();
        engine.start_mode(ModeConfig::story(), &content()).unwrap();
        for _ in 0..(16 * 10) {
            engine.update(0.1, &InputSnapshot::idle());
        }
        assert_eq!(engine.state(), Some(GameState::Briefing));
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut engine = story_engine();
        engine.update(0.1, &InputSnapshot::idle());
        assert!(engine.toggle_pause());
        assert_eq!(engine.state(), Some(GameState::Paused));
        let before = engine.tick();
        for _ in 0..10 {
            engine.update(0.1, &InputSnapshot::moving(1.0, 0.0));
        }
        assert_eq!(engine.tick(), before);
        assert!(engine.toggle_pause());
        assert_eq!(engine.state(), Some(GameState::Playing));
    }

    #[test]
    fn test_accuse_without_evidence() {
        let mut engine = story_engine();
        engine.drain_events();
        assert_eq!(engine.accuse("malee"), AccuseOutcome::NotEnoughEvidence);
        let events = engine.drain_events();
        assert!(events.contains(&SimEvent::Message(Message::NotEnoughEvidence)));
        let world = engine.world.as_ref().unwrap();
        assert_eq!(world.story.as_ref().unwrap().accusations_left, 3);
    }

    #[test]
    fn test_correct_accusation_wins() {
        let mut engine = story_engine();
        give_evidence(&mut engine);
        assert_eq!(engine.accuse("malee"), AccuseOutcome::Correct);
        assert_eq!(engine.state(), Some(GameState::WinningCinematic));
        for _ in 0..400 {
            engine.update(0.05, &InputSnapshot::idle());
        }
        assert_eq!(engine.state(), Some(GameState::FinishScreen));
    }

    #[test]
    fn test_wrong_accusation_claims_bystander() {
        let mut engine = story_engine();
        give_evidence(&mut engine);
        assert_eq!(engine.accuse("somchai"), AccuseOutcome::Wrong { accusations_left: 2 });
        {
            let world = engine.world.as_ref().unwrap();
            assert_eq!(world.state, GameState::Playing);
            assert!(matches!(world.cinematic, Some(CinematicSession::WrongAccusation(_))));
        }
        assert_eq!(engine.accuse("somchai"), AccuseOutcome::Ignored);
        for _ in 0..600 {
            engine.update(0.05, &InputSnapshot::idle());
        }
        let world = engine.world.as_ref().unwrap();
        assert!(world.cinematic.is_none());
        let prasert = world.roster[2];
        assert!(!world.is_alive(prasert));
    }

    #[test]
    fn test_last_accusation_loses() {
        let mut engine = story_engine();
        give_evidence(&mut engine);
        engine
            .world
            .as_mut()
            .unwrap()
            .story
            .as_mut()
            .unwrap()
            .accusations_left = 1;
        assert_eq!(engine.accuse("prasert"), AccuseOutcome::Wrong { accusations_left: 0 });
        assert_eq!(engine.state(), Some(GameState::LosingCinematic));
        for _ in 0..600 {
            engine.update(0.05, &InputSnapshot::idle());
        }
        assert_eq!(
            engine.state(),
            Some(GameState::GameOver(GameOverReason::Accusation))
        );
    }

    #[test]
    fn test_cycle_character_in_ritual() {
        let mut engine = SimulationEngine::new();
        engine
            .start_mode(ModeConfig::ritual().skipping_intro(), &content())
            .unwrap();
        assert!(engine.cycle_character());
        let world = engine.world.as_ref().unwrap();
        assert_eq!(world.controlled, Some(world.roster[1]));
        assert!(!engine.select_character(1));
        assert!(engine.select_character(4));
    }

    #[test]
    fn test_teardown() {
        let mut engine = story_engine();
        engine.teardown_mode();
        assert!(engine.snapshot().is_none());
        assert_eq!(engine.npc_count(), 0);
    }
}
