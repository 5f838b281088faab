//! The single mutable world record every system reads and writes.
//!
//! Characters live in a `hecs::World`; everything else (threat slots, the
//! cinematic session, scheduler timers, UI overlays) is an owned field so
//! systems can borrow disjoint parts at once.

use std::collections::HashSet;

use hecs::{Entity, World};
use hauntwood_logic::geometry::{Aabb, Vec3, WorldBounds};
use hauntwood_logic::timers::Countdown;
use hauntwood_logic::weather::{LightingState, Weather};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::{CharacterState, Enemy, Ghost, Npc, Tiger};
use crate::config::ModeConfig;
use crate::content::CaseContent;
use crate::events::{EventQueue, SimEvent};
use crate::state::{GameMode, GameState, SuspendReason, SuspendSet};
use crate::systems::{
    CameraRig, CinematicSession, InteractionTarget, IntroFlight, LightningStrike, Prompt,
    SchedulerState,
};

/// Which subject the follow camera tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    Intro,
    PlayerFollow,
    GhostFollow,
    EventFocus,
    TigerFollow,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodEffect {
    pub position: Vec3,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathMarker {
    pub npc: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Altar {
    pub position: Vec3,
    pub active: bool,
}

/// A ghost has reached its victim; death lands when the timer expires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDeath {
    pub victim: Entity,
    pub timer: Countdown,
}

#[derive(Debug, Clone, Default)]
pub struct RitualState {
    pub altars: Vec<Altar>,
    pub survivors: usize,
    pub pending_death: Option<PendingDeath>,
}

#[derive(Debug, Clone)]
pub struct StoryProgress {
    pub found_clues: HashSet<String>,
    /// Collected evidence in pickup order.
    pub evidence: Vec<String>,
    pub read_lore: HashSet<String>,
    pub accusations_left: u8,
}

impl Default for StoryProgress {
    fn default() -> Self {
        Self {
            found_clues: HashSet::new(),
            evidence: Vec::new(),
            read_lore: HashSet::new(),
            accusations_left: 3,
        }
    }
}

impl StoryProgress {
    pub fn has_all(&self, required: &[String]) -> bool {
        required.iter().all(|e| self.evidence.contains(e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialogueSession {
    pub npc: Entity,
    pub focused: usize,
    pub option_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub target: Vec3,
    pub remaining: Countdown,
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub dialogue: Option<DialogueSession>,
    pub inventory_open: bool,
    pub journal_open: bool,
    pub map_view: Option<MapView>,
}

/// Temporary clue highlight and its cooldown.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintState {
    pub highlight: Countdown,
    pub cooldown: Countdown,
}

impl HintState {
    pub fn is_highlighting(&self) -> bool {
        !self.highlight.is_done()
    }
}

pub struct WorldState {
    pub mode: GameMode,
    pub state: GameState,
    /// State to return to when unpausing.
    pub paused_from: Option<GameState>,
    pub config: ModeConfig,
    pub content: CaseContent,

    pub ecs: World,
    /// NPCs in content order.
    pub roster: Vec<Entity>,
    pub player: Option<Entity>,
    /// Entity receiving input: the player in story mode, an NPC in ritual mode.
    pub controlled: Option<Entity>,
    pub murderer: Option<Entity>,
    pub bounds: WorldBounds,
    pub collidables: Vec<Aabb>,

    pub weather: Weather,
    pub lighting: LightingState,
    pub scheduler: SchedulerState,
    pub cinematic: Option<CinematicSession>,
    pub ghost: Option<Ghost>,
    pub tiger: Option<Tiger>,
    pub enemy: Option<Enemy>,
    pub lightning: Option<LightningStrike>,
    pub ritual: Option<RitualState>,
    pub story: Option<StoryProgress>,
    pub camera: CameraRig,
    pub camera_mode: CameraMode,
    pub intro: Option<IntroFlight>,
    pub ui: UiState,
    pub hint: HintState,
    pub interaction: Option<InteractionTarget>,
    pub prompt: Option<Prompt>,
    /// Whisper clue whose loop is currently playing.
    pub whisper_playing: Option<String>,
    pub cinematic_text: Option<crate::events::CinematicText>,
    pub blood: Vec<BloodEffect>,
    pub death_markers: Vec<DeathMarker>,

    pub rng: StdRng,
    pub events: EventQueue,
    pub elapsed: f32,
    pub tick: u64,
}

impl WorldState {
    /// Empty world for `config`; characters are spawned by `generation`.
    pub fn new(config: ModeConfig, content: CaseContent) -> Self {
        let weather = Weather::Clear;
        Self {
            mode: config.mode,
            state: GameState::Intro,
            paused_from: None,
            bounds: config.bounds,
            rng: StdRng::seed_from_u64(config.seed),
            scheduler: SchedulerState::default(),
            config,
            content,
            ecs: World::new(),
            roster: Vec::new(),
            player: None,
            controlled: None,
            murderer: None,
            collidables: Vec::new(),
            weather,
            lighting: LightingState::for_weather(weather),
            cinematic: None,
            ghost: None,
            tiger: None,
            enemy: None,
            lightning: None,
            ritual: None,
            story: None,
            camera: CameraRig::default(),
            camera_mode: CameraMode::PlayerFollow,
            intro: None,
            ui: UiState::default(),
            hint: HintState::default(),
            interaction: None,
            prompt: None,
            whisper_playing: None,
            cinematic_text: None,
            blood: Vec::new(),
            death_markers: Vec::new(),
            events: EventQueue::new(),
            elapsed: 0.0,
            tick: 0,
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn position(&self, e: Entity) -> Option<Vec3> {
        self.ecs.get::<&CharacterState>(e).ok().map(|c| c.position)
    }

    pub fn character_id(&self, e: Entity) -> String {
        self.ecs
            .get::<&CharacterState>(e)
            .map(|c| c.id.clone())
            .unwrap_or_default()
    }

    pub fn npc_name(&self, e: Entity) -> String {
        self.ecs
            .get::<&Npc>(e)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    /// Alive and present. The player is alive until removed; NPCs follow status.
    pub fn is_alive(&self, e: Entity) -> bool {
        if !self.ecs.contains(e) {
            return false;
        }
        match self.ecs.get::<&Npc>(e) {
            Ok(npc) => npc.is_alive(),
            Err(_) => self
                .ecs
                .get::<&CharacterState>(e)
                .map(|c| !c.is_dead())
                .unwrap_or(false),
        }
    }

    pub fn is_npc(&self, e: Entity) -> bool {
        self.ecs.get::<&Npc>(e).is_ok()
    }

    /// Living NPCs in roster order.
    pub fn living_npcs(&self) -> Vec<Entity> {
        self.roster
            .iter()
            .copied()
            .filter(|e| self.is_alive(*e))
            .collect()
    }

    pub fn living_npcs_except(&self, excluded: &[Option<Entity>]) -> Vec<Entity> {
        self.living_npcs()
            .into_iter()
            .filter(|e| !excluded.contains(&Some(*e)))
            .collect()
    }

    pub fn controlled_position(&self) -> Option<Vec3> {
        self.controlled.and_then(|e| self.position(e))
    }

    pub fn roster_index(&self, e: Entity) -> Option<usize> {
        self.roster.iter().position(|r| *r == e)
    }

    /// The shared suspension predicate.
    pub fn suspend_set(&self) -> SuspendSet {
        let mut set = SuspendSet::empty();
        if self.ui.dialogue.is_some() {
            set.insert(SuspendReason::DialogueOpen);
        }
        if self.ui.inventory_open {
            set.insert(SuspendReason::InventoryOpen);
        }
        if self.ui.journal_open {
            set.insert(SuspendReason::JournalOpen);
        }
        if self.ui.map_view.is_some() {
            set.insert(SuspendReason::MapView);
        }
        if self.cinematic.is_some() {
            set.insert(SuspendReason::Cinematic);
        }
        if self
            .ritual
            .as_ref()
            .is_some_and(|r| r.pending_death.is_some())
        {
            set.insert(SuspendReason::PendingDeath);
        }
        if self.state == GameState::RitualEnding {
            set.insert(SuspendReason::RitualEnding);
        }
        if self.tiger.is_some() {
            set.insert(SuspendReason::TigerEvent);
        }
        set
    }

    // ── Mutations ──────────────────────────────────────────────────────

    pub fn set_state(&mut self, to: GameState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        log::info!("state {:?} -> {:?}", from, to);
        self.state = to;
        self.events.push(SimEvent::StateChanged { from, to });
        if let GameState::GameOver(reason) = to {
            self.events.push(SimEvent::GameOver { reason });
        }
    }

    pub fn spawn_blood(&mut self, position: Vec3) {
        self.blood.push(BloodEffect {
            position,
            remaining: hauntwood_logic::constants::effects::BLOOD_LIFETIME,
        });
        self.events.push(SimEvent::BloodSplatter { position });
    }

    pub fn shake_camera(&mut self, intensity: f32, duration: f32) {
        self.camera.shake = hauntwood_logic::camera::CameraShake::new(intensity, duration);
    }

    pub fn sfx(&self) -> f32 {
        self.config.sfx_volume
    }
}
