//! Interaction resolver and the actions it unlocks.
//!
//! Exactly one candidate is kept per tick. Ties go to the strictly closer
//! candidate, so at equal distance the first in roster or content order wins.

use std::fmt;

use hecs::Entity;
use hauntwood_logic::constants::interaction::{
    HINT_COOLDOWN_SECS, HINT_HIGHLIGHT_SECS, MAP_VIEW_SECS, RITUAL_RADIUS, STORY_RADIUS,
    WHISPER_AUDIBLE_RADIUS, WHISPER_FOCUS_RADIUS, WHISPER_FOCUS_STILL_SECS,
};
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::timers::Countdown;
use serde::Serialize;

use super::npc::toggle_follow;
use crate::components::{CharacterState, Npc};
use crate::content::ClueKind;
use crate::events::{Message, SimEvent, SoundChannel};
use crate::input::InputSnapshot;
use crate::state::{GameMode, SuspendSet};
use crate::world::{DialogueSession, MapView, WorldState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionTarget {
    Npc(Entity),
    /// Index into the case's clue list.
    Clue(usize),
    Lore(usize),
    Follow(Entity),
    Altar(usize),
}

/// Prompt key; the host localizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Prompt {
    Talk { name: String },
    Investigate,
    Decipher,
    Focus,
    NearbyWhisper,
    Follow,
    Unfollow,
    Deactivate,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Talk { name } => write!(f, "Talk to {}", name),
            Prompt::Investigate => write!(f, "Investigate"),
            Prompt::Decipher => write!(f, "Decipher"),
            Prompt::Focus => write!(f, "Focus"),
            Prompt::NearbyWhisper => write!(f, "You hear whispers nearby..."),
            Prompt::Follow => write!(f, "Follow me"),
            Prompt::Unfollow => write!(f, "Stop following"),
            Prompt::Deactivate => write!(f, "Deactivate"),
        }
    }
}

/// Running nearest-candidate search with a strict radius.
struct Nearest<T> {
    best: Option<(T, f32)>,
    radius: f32,
}

impl<T> Nearest<T> {
    fn within(radius: f32) -> Self {
        Self { best: None, radius }
    }

    fn offer(&mut self, candidate: T, distance: f32) {
        let closer = match &self.best {
            Some((_, d)) => distance < *d,
            None => distance < self.radius,
        };
        if closer {
            self.best = Some((candidate, distance));
        }
    }

    fn take(self) -> Option<(T, f32)> {
        self.best
    }
}

/// Pick this tick's interaction target and prompt.
pub fn resolve_interaction(world: &mut WorldState, suspended: &SuspendSet) {
    world.interaction = None;
    world.prompt = None;
    if !suspended.is_empty() {
        return;
    }
    let Some(me) = world.controlled else {
        return;
    };
    let (origin, still_secs) = match world.ecs.get::<&CharacterState>(me) {
        Ok(ch) => (ch.position, ch.stationary_secs),
        Err(_) => return,
    };

    let resolved = match world.mode {
        GameMode::Story => resolve_story(world, origin, still_secs),
        GameMode::Ritual => resolve_ritual(world, me, origin),
    };
    if let Some((target, prompt)) = resolved {
        world.interaction = Some(target);
        world.prompt = prompt;
    }
}

fn resolve_story(world: &WorldState, origin: Vec3, still_secs: f32) -> Option<(InteractionTarget, Option<Prompt>)> {
    let mut npc = Nearest::within(STORY_RADIUS);
    for e in world.living_npcs() {
        if let Some(p) = world.position(e) {
            npc.offer(e, origin.ground_distance(&p));
        }
    }
    if let Some((e, _)) = npc.take() {
        let name = world.npc_name(e);
        return Some((InteractionTarget::Npc(e), Some(Prompt::Talk { name })));
    }

    let found = world.story.as_ref().map(|s| &s.found_clues);
    let mut clue = Nearest::within(STORY_RADIUS);
    for (i, def) in world.content.clues.iter().enumerate() {
        if found.is_some_and(|f| f.contains(&def.id)) {
            continue;
        }
        clue.offer(i, origin.ground_distance(&def.position()));
    }
    if let Some((i, distance)) = clue.take() {
        let prompt = match world.content.clues[i].kind {
            ClueKind::Static => Some(Prompt::Investigate),
            ClueKind::Symbol => world.hint.is_highlighting().then_some(Prompt::Decipher),
            ClueKind::Whisper => {
                if distance < WHISPER_FOCUS_RADIUS && still_secs > WHISPER_FOCUS_STILL_SECS {
                    Some(Prompt::Focus)
                } else {
                    Some(Prompt::NearbyWhisper)
                }
            }
        };
        return Some((InteractionTarget::Clue(i), prompt));
    }

    let mut lore = Nearest::within(STORY_RADIUS);
    for (i, def) in world.content.lore.iter().enumerate() {
        lore.offer(i, origin.ground_distance(&def.position()));
    }
    lore.take()
        .map(|(i, _)| (InteractionTarget::Lore(i), Some(Prompt::Investigate)))
}

fn resolve_ritual(world: &WorldState, me: Entity, origin: Vec3) -> Option<(InteractionTarget, Option<Prompt>)> {
    let mut other = Nearest::within(RITUAL_RADIUS);
    for e in world.living_npcs_except(&[Some(me)]) {
        if let Some(p) = world.position(e) {
            other.offer(e, origin.ground_distance(&p));
        }
    }
    if let Some((e, _)) = other.take() {
        let follows_me = world
            .ecs
            .get::<&Npc>(e)
            .map(|n| n.behavior.following() == Some(me))
            .unwrap_or(false);
        let prompt = if follows_me { Prompt::Unfollow } else { Prompt::Follow };
        return Some((InteractionTarget::Follow(e), Some(prompt)));
    }

    let ritual = world.ritual.as_ref()?;
    let mut altar = Nearest::within(RITUAL_RADIUS);
    for (i, a) in ritual.altars.iter().enumerate() {
        if a.active {
            altar.offer(i, origin.ground_distance(&a.position));
        }
    }
    altar
        .take()
        .map(|(i, _)| (InteractionTarget::Altar(i), Some(Prompt::Deactivate)))
}

/// Act on the resolved target when the interact (or follow) edge fires.
pub fn apply_interaction(world: &mut WorldState, input: &InputSnapshot) {
    if world.ui.inventory_open {
        return;
    }
    let Some(target) = world.interaction else {
        return;
    };
    match target {
        InteractionTarget::Npc(e) if input.interact => open_dialogue(world, e),
        InteractionTarget::Clue(i) if input.interact => {
            let ready = match world.content.clues[i].kind {
                ClueKind::Static => true,
                ClueKind::Symbol => world.prompt == Some(Prompt::Decipher),
                ClueKind::Whisper => world.prompt == Some(Prompt::Focus),
            };
            if ready {
                collect_clue(world, i);
            }
        }
        InteractionTarget::Lore(i) if input.interact => read_lore(world, i),
        InteractionTarget::Altar(i) if input.interact => {
            deactivate_altar(world, i);
        }
        InteractionTarget::Follow(e) if input.interact || input.follow => {
            toggle_follow(world, e);
        }
        _ => return,
    }
    world.interaction = None;
    world.prompt = None;
}

pub fn open_dialogue(world: &mut WorldState, npc: Entity) {
    let name = world.npc_name(npc);
    let id = world.character_id(npc);
    let option_count = world.content.npc(&id).map_or(0, |d| d.dialogue_options);
    world.ui.dialogue = Some(DialogueSession {
        npc,
        focused: 0,
        option_count,
    });
    world.events.push(SimEvent::DialogueOpened { npc: name });
}

pub fn close_dialogue(world: &mut WorldState) -> bool {
    let Some(session) = world.ui.dialogue.take() else {
        return false;
    };
    let npc = world.npc_name(session.npc);
    world.events.push(SimEvent::DialogueClosed { npc });
    true
}

/// Option navigation while a dialogue is open.
pub fn dialogue_input(world: &mut WorldState, input: &InputSnapshot) {
    let Some(session) = world.ui.dialogue.as_mut() else {
        return;
    };
    if input.cancel {
        close_dialogue(world);
        return;
    }
    let n = session.option_count;
    if n > 0 {
        if input.nav_down {
            session.focused = (session.focused + 1) % n;
        }
        if input.nav_up {
            session.focused = (session.focused + n - 1) % n;
        }
    }
    if input.confirm && n > 0 {
        let (npc, option) = (session.npc, session.focused);
        let npc = world.npc_name(npc);
        world.events.push(SimEvent::DialogueOptionChosen { npc, option });
    }
}

pub fn collect_clue(world: &mut WorldState, index: usize) {
    let Some(def) = world.content.clues.get(index) else {
        return;
    };
    let (clue, evidence) = (def.id.clone(), def.evidence.clone());
    let Some(story) = world.story.as_mut() else {
        return;
    };
    if !story.found_clues.insert(clue.clone()) {
        return;
    }
    let new_evidence = match &evidence {
        Some(ev) if !story.evidence.contains(ev) => {
            story.evidence.push(ev.clone());
            true
        }
        _ => false,
    };
    let sfx = world.sfx();
    let sound = if new_evidence { "collect" } else { "clue" };
    world.events.sound(sound, sfx * 1.2, None);
    log::info!("clue {} found (new evidence: {})", clue, new_evidence);
    world.events.push(SimEvent::ClueFound {
        clue,
        evidence,
        new_evidence,
    });
}

pub fn read_lore(world: &mut WorldState, index: usize) {
    let Some(def) = world.content.lore.get(index) else {
        return;
    };
    let lore = def.id.clone();
    if let Some(story) = world.story.as_mut() {
        story.read_lore.insert(lore.clone());
    }
    let sfx = world.sfx();
    world.events.sound("clue", sfx * 0.7, None);
    world.events.push(SimEvent::LoreRead { lore });
}

/// Deactivate an altar: more survival time, and the controlled NPC is
/// marked as having performed the ritual.
pub fn deactivate_altar(world: &mut WorldState, index: usize) -> bool {
    let Some(altar) = world
        .ritual
        .as_mut()
        .and_then(|r| r.altars.get_mut(index))
        .filter(|a| a.active)
    else {
        return false;
    };
    altar.active = false;
    let bonus = world.config.scheduler.altar_bonus_secs;
    world.scheduler.survival.add(bonus);
    if let Some(e) = world.controlled {
        if let Ok(mut npc) = world.ecs.get::<&mut Npc>(e) {
            npc.ritual_protected = true;
        }
    }
    let sfx = world.sfx();
    world.events.sound("collect", sfx * 1.2, None);
    let survival_secs = world.scheduler.survival.remaining();
    log::info!("altar {} deactivated, {:.0}s left", index, survival_secs);
    world.events.push(SimEvent::AltarDeactivated {
        altar: index,
        survival_secs,
    });
    true
}

/// Keep one looping whisper on the nearest unfound whisper clue in earshot.
pub fn whisper_system(world: &mut WorldState, suspended: &SuspendSet) {
    let mut nearest = Nearest::within(WHISPER_AUDIBLE_RADIUS);
    if suspended.is_empty() && world.mode == GameMode::Story {
        if let (Some(origin), Some(story)) = (world.controlled_position(), world.story.as_ref()) {
            for def in &world.content.clues {
                if def.kind == ClueKind::Whisper && !story.found_clues.contains(&def.id) {
                    nearest.offer(def, origin.ground_distance(&def.position()));
                }
            }
        }
    }
    let chosen = nearest.take().map(|(def, _)| (def.id.clone(), def.position()));

    match chosen {
        Some((id, at)) => {
            if world.whisper_playing.as_deref() != Some(id.as_str()) {
                if world.whisper_playing.is_some() {
                    world.events.stop(SoundChannel::Whisper);
                }
                let sfx = world.sfx();
                world
                    .events
                    .looping("whisper", sfx * 0.8, Some(Vec3::new(at.x, 1.0, at.z)), SoundChannel::Whisper);
                world.whisper_playing = Some(id);
            }
        }
        None => {
            if world.whisper_playing.take().is_some() {
                world.events.stop(SoundChannel::Whisper);
            }
        }
    }
}

/// Highlight symbol clues for a while. Story mode only; rate limited.
pub fn request_hint(world: &mut WorldState) -> bool {
    if world.mode != GameMode::Story {
        return false;
    }
    if !world.hint.cooldown.is_done() {
        let remaining_secs = world.hint.cooldown.remaining();
        world
            .events
            .push(SimEvent::Message(Message::HintOnCooldown { remaining_secs }));
        return false;
    }
    world.hint.highlight = Countdown::new(HINT_HIGHLIGHT_SECS);
    world.hint.cooldown = Countdown::new(HINT_COOLDOWN_SECS);
    let sfx = world.sfx();
    world.events.sound("clue", sfx * 0.5, None);
    true
}

/// Temporary overhead camera around `target`.
pub fn open_map(world: &mut WorldState, target: Vec3) {
    world.ui.map_view = Some(MapView {
        target,
        remaining: Countdown::new(MAP_VIEW_SECS),
    });
}

/// Hint highlight, hint cooldown and map view countdowns.
pub fn ui_timer_system(world: &mut WorldState, delta: f32) {
    world.hint.highlight.tick(delta);
    world.hint.cooldown.tick(delta);
    if let Some(map) = world.ui.map_view.as_mut() {
        if map.remaining.tick(delta) {
            world.ui.map_view = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ClipKind, Player};
    use crate::config::ModeConfig;
    use crate::content::CaseContent;
    use crate::world::StoryProgress;

    fn story(json: &str, npc_at: &[(f32, f32)]) -> WorldState {
        let content = CaseContent::from_json(json).unwrap();
        let mut w = WorldState::new(ModeConfig::story(), content.clone());
        for (i, (def, &(x, z))) in content.npcs.iter().zip(npc_at).enumerate() {
            let e = w.ecs.spawn((
                CharacterState::new(def.id.clone(), Vec3::ground(x, z), 2.0, ClipKind::Npc),
                Npc::new(def.name.clone(), "", i, 5.0),
            ));
            w.roster.push(e);
        }
        let p = w.ecs.spawn((CharacterState::new("player", Vec3::ZERO, 5.0, ClipKind::Player), Player));
        w.player = Some(p);
        w.controlled = Some(p);
        w.story = Some(StoryProgress::default());
        w
    }

    const CASE: &str = r#"{
        "id": "t",
        "npcs": [ { "id": "a", "name": "Ada", "dialogue_options": 3 } ],
        "clues": [
            { "id": "knife", "kind": "static", "x": 0.0, "z": 2.0, "evidence": "ev_knife" },
            { "id": "mark", "kind": "symbol", "x": 1.0, "z": 0.0 },
            { "id": "voice", "kind": "whisper", "x": 10.0, "z": 0.0 }
        ]
    }"#;

    #[test]
    fn npc_outranks_clue_even_when_clue_is_closer() {
        let mut w = story(CASE, &[(2.9, 0.0)]);
        resolve_interaction(&mut w, &SuspendSet::empty());
        assert!(matches!(w.interaction, Some(InteractionTarget::Npc(_))));
        assert_eq!(w.prompt, Some(Prompt::Talk { name: "Ada".into() }));
    }

    #[test]
    fn npc_at_2_9_beats_clue_at_3_5() {
        let json = r#"{ "id": "t", "npcs": [ { "id": "a", "name": "Ada" } ],
            "clues": [ { "id": "c", "kind": "static", "x": 3.5, "z": 0.0 } ] }"#;
        let mut w = story(json, &[(2.9, 0.0)]);
        resolve_interaction(&mut w, &SuspendSet::empty());
        assert!(matches!(w.interaction, Some(InteractionTarget::Npc(_))));
    }

    #[test]
    fn symbol_prompt_needs_highlight() {
        let mut w = story(CASE, &[(50.0, 50.0)]);
        let knife = w.content.clues.iter().position(|c| c.id == "knife").unwrap();
        collect_clue(&mut w, knife);
        resolve_interaction(&mut w, &SuspendSet::empty());
        assert_eq!(w.interaction, Some(InteractionTarget::Clue(1)));
        assert_eq!(w.prompt, None);
        assert!(request_hint(&mut w));
        resolve_interaction(&mut w, &SuspendSet::empty());
        assert_eq!(w.prompt, Some(Prompt::Decipher));
        assert!(!request_hint(&mut w), "hint is on cooldown");
    }

    #[test]
    fn collecting_evidence_is_idempotent() {
        let mut w = story(CASE, &[(50.0, 50.0)]);
        collect_clue(&mut w, 0);
        collect_clue(&mut w, 0);
        let story = w.story.as_ref().unwrap();
        assert_eq!(story.evidence, vec!["ev_knife".to_string()]);
        let found = w
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::ClueFound { new_evidence: true, .. }))
            .count();
        assert_eq!(found, 1);
    }

    #[test]
    fn suspended_resolves_nothing() {
        let mut w = story(CASE, &[(1.0, 0.0)]);
        let suspended: SuspendSet = [crate::state::SuspendReason::InventoryOpen].into_iter().collect();
        resolve_interaction(&mut w, &suspended);
        assert!(w.interaction.is_none());
        assert!(w.prompt.is_none());
    }

    #[test]
    fn whisper_loop_starts_once_and_stops_out_of_range() {
        let mut w = story(CASE, &[(50.0, 50.0)]);
        whisper_system(&mut w, &SuspendSet::empty());
        whisper_system(&mut w, &SuspendSet::empty());
        assert_eq!(w.whisper_playing.as_deref(), Some("voice"));
        let starts = w
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::PlaySound { sound, .. } if sound == "whisper"))
            .count();
        assert_eq!(starts, 1);
        let p = w.player.unwrap();
        w.ecs.get::<&mut CharacterState>(p).unwrap().position = Vec3::ground(-40.0, 0.0);
        whisper_system(&mut w, &SuspendSet::empty());
        assert!(w.whisper_playing.is_none());
    }

    #[test]
    fn dialogue_navigation_wraps() {
        let mut w = story(CASE, &[(1.0, 0.0)]);
        let npc = w.roster[0];
        open_dialogue(&mut w, npc);
        let up = InputSnapshot {
            nav_up: true,
            ..InputSnapshot::default()
        };
        dialogue_input(&mut w, &up);
        assert_eq!(w.ui.dialogue.unwrap().focused, 2);
        let cancel = InputSnapshot {
            cancel: true,
            ..InputSnapshot::default()
        };
        dialogue_input(&mut w, &cancel);
        assert!(w.ui.dialogue.is_none());
    }
}
