//! Hauntwood Headless Simulation Harness
//!
//! Plays both game modes end to end against the shipped village case.
//! Runs entirely in-process: no renderer, no audio, no input devices.
//!
//! Usage:
//!   cargo run -p hauntwood-simtest
//!   cargo run -p hauntwood-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p hauntwood-simtest

use hauntwood_core::config::SecsRange;
use hauntwood_core::content::ClueKind;
use hauntwood_core::events::{DeathCause, Message, SimEvent};
use hauntwood_core::prelude::*;
use hauntwood_core::systems::set_weather;
use hauntwood_core::world::WorldState;
use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::weather::Weather;
use tracing_subscriber::EnvFilter;

// ── Case content (same JSON a host ships) ───────────────────────────────
const CASE_JSON: &str = include_str!("../../../data/case_village.json");

/// Fixed step the harness drives the engine with.
const DT: f32 = 1.0 / 30.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

type Scenario = fn(&CaseContent, bool) -> Result<Vec<TestResult>, String>;

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    init_logging(verbose);
    println!("=== Hauntwood Simulation Harness ===\n");

    let content = match CaseContent::from_json(CASE_JSON) {
        Ok(c) => c,
        Err(e) => {
            println!("  ✗ case_parse: {}", e);
            std::process::exit(1);
        }
    };

    let scenarios: [(&str, Scenario); 7] = [
        // 1. Case content sanity
        ("case_content", validate_case),
        // 2. Story intro, briefing and investigation
        ("story_flow", validate_story_flow),
        // 3. Wrong then correct accusation
        ("accusations", validate_accusations),
        // 4. Running out of accusations
        ("accusation_loss", validate_accusation_loss),
        // 5. Ritual altars and the ending walk-off
        ("ritual_survival", validate_ritual_survival),
        // 6. Ritual threats: lightning and ghosts
        ("ritual_threats", validate_ritual_threats),
        // 7. Same seed, same run
        ("determinism", validate_determinism),
    ];

    let mut results = Vec::new();
    for (name, scenario) in scenarios {
        println!("--- {} ---", name);
        match scenario(&content, verbose) {
            Ok(r) => {
                log::info!("{}: {} checks", name, r.len());
                results.extend(r);
            }
            Err(e) => results.push(TestResult::check(name, false, format!("aborted: {}", e))),
        }
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ── Driving helpers ─────────────────────────────────────────────────────

fn start(content: &CaseContent, config: ModeConfig) -> Result<SimulationEngine, String> {
    let mut engine = SimulationEngine::new();
    engine.start_mode(config, content).map_err(|e| e.to_string())?;
    Ok(engine)
}

fn world(engine: &mut SimulationEngine) -> Result<&mut WorldState, String> {
    engine.world.as_mut().ok_or_else(|| "no mode running".to_string())
}

/// Step `secs` of idle time, collecting every event emitted.
fn run_for(engine: &mut SimulationEngine, secs: f32) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let ticks = (secs / DT).ceil() as usize;
    for _ in 0..ticks {
        engine.update(DT, &InputSnapshot::idle());
        events.extend(engine.drain_events());
    }
    events
}

/// Step until `done` holds or `max_secs` pass. Returns whether it held.
fn run_until(
    engine: &mut SimulationEngine,
    max_secs: f32,
    events: &mut Vec<SimEvent>,
    done: impl Fn(&SimulationEngine) -> bool,
) -> bool {
    let ticks = (max_secs / DT).ceil() as usize;
    for _ in 0..ticks {
        if done(engine) {
            return true;
        }
        engine.update(DT, &InputSnapshot::idle());
        events.extend(engine.drain_events());
    }
    done(engine)
}

fn teleport(engine: &mut SimulationEngine, to: Vec3) -> Result<(), String> {
    let w = world(engine)?;
    let me = w.controlled.ok_or("nobody is controlled")?;
    let mut ch = w
        .ecs
        .get::<&mut CharacterState>(me)
        .map_err(|e| e.to_string())?;
    ch.position = to;
    ch.velocity = Vec3::ZERO;
    Ok(())
}

/// Stand on `at` pressing interact until an event matching `hit` arrives.
/// Dialogues opened by a passer-by are closed again.
fn interact_at(
    engine: &mut SimulationEngine,
    at: Vec3,
    hit: impl Fn(&SimEvent) -> bool,
) -> Result<bool, String> {
    let press = InputSnapshot {
        interact: true,
        ..InputSnapshot::idle()
    };
    for _ in 0..300 {
        teleport(engine, at)?;
        engine.update(DT, &press);
        if engine.drain_events().iter().any(&hit) {
            return Ok(true);
        }
        engine.close_dialogue();
    }
    Ok(false)
}

fn count(events: &[SimEvent], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

fn story_playing(content: &CaseContent, seed: u64) -> Result<SimulationEngine, String> {
    let mut engine = start(content, ModeConfig::story().skipping_intro().with_seed(seed))?;
    if !engine.start_gameplay() {
        return Err("briefing did not accept start".into());
    }
    Ok(engine)
}

/// Walk to every static clue and pick it up.
fn collect_static_clues(engine: &mut SimulationEngine, content: &CaseContent) -> Result<usize, String> {
    let mut found = 0;
    for clue in content
        .clues
        .iter()
        .filter(|c| c.kind == ClueKind::Static)
    {
        let id = clue.id.clone();
        if interact_at(engine, clue.position(), |e| {
            matches!(e, SimEvent::ClueFound { clue, .. } if *clue == id)
        })? {
            found += 1;
        }
    }
    Ok(found)
}

fn murderer_id(engine: &mut SimulationEngine) -> Result<String, String> {
    let w = world(engine)?;
    let m = w.murderer.ok_or("no murderer chosen")?;
    Ok(w.character_id(m))
}

// ── 1. Case Content ─────────────────────────────────────────────────────

fn validate_case(content: &CaseContent, verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();

    results.push(TestResult::check(
        "case_roster",
        content.npcs.len() == 7,
        format!("{} npcs", content.npcs.len()),
    ));

    let suspects = content.suspects();
    results.push(TestResult::check(
        "case_suspects",
        suspects.len() == content.npcs.len(),
        format!("{} suspects", suspects.len()),
    ));

    // Every piece of evidence a suspect needs must be findable.
    let findable: Vec<&str> = content
        .clues
        .iter()
        .filter_map(|c| c.evidence.as_deref())
        .collect();
    let missing: Vec<&String> = content
        .murderer_evidence
        .values()
        .flatten()
        .filter(|ev| !findable.contains(&ev.as_str()))
        .collect();
    results.push(TestResult::check(
        "case_evidence_findable",
        missing.is_empty(),
        format!("unfindable: {:?}", missing),
    ));

    if verbose {
        println!("  {} clues, {} lore, {} obstacles", content.clues.len(), content.lore.len(), content.obstacles.len());
    }
    Ok(results)
}

// ── 2. Story Flow ───────────────────────────────────────────────────────

fn validate_story_flow(content: &CaseContent, verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();
    let mut engine = start(content, ModeConfig::story().with_seed(3))?;

    run_for(&mut engine, 16.0);
    results.push(TestResult::check(
        "intro_to_briefing",
        engine.state() == Some(GameState::Briefing),
        format!("{:?}", engine.state()),
    ));

    engine.start_gameplay();
    results.push(TestResult::check(
        "briefing_to_playing",
        engine.state() == Some(GameState::Playing),
        format!("{:?}", engine.state()),
    ));

    let found = collect_static_clues(&mut engine, content)?;
    let evidence = world(&mut engine)?
        .story
        .as_ref()
        .map_or(0, |s| s.evidence.len());
    results.push(TestResult::check(
        "static_clues_collected",
        found == 3 && evidence == 3,
        format!("{} clues, {} evidence", found, evidence),
    ));

    // Symbol clues only answer while the hint highlight is up.
    let symbol = content
        .clues
        .iter()
        .find(|c| c.kind == ClueKind::Symbol)
        .ok_or("case has no symbol clue")?;
    let symbol_id = symbol.id.clone();
    engine.request_hint();
    let deciphered = interact_at(&mut engine, symbol.position(), |e| {
        matches!(e, SimEvent::ClueFound { clue, .. } if *clue == symbol_id)
    })?;
    results.push(TestResult::check("symbol_deciphered", deciphered, "with hint"));

    // Whisper clues need the player to stand still close by.
    let whisper = content
        .clues
        .iter()
        .find(|c| c.kind == ClueKind::Whisper)
        .ok_or("case has no whisper clue")?;
    let whisper_id = whisper.id.clone();
    let heard = interact_at(&mut engine, whisper.position(), |e| {
        matches!(e, SimEvent::ClueFound { clue, .. } if *clue == whisper_id)
    })?;
    results.push(TestResult::check("whisper_focused", heard, "after standing still"));

    let lore = content.lore.first().ok_or("case has no lore")?;
    let lore_id = lore.id.clone();
    let read = interact_at(&mut engine, lore.position(), |e| {
        matches!(e, SimEvent::LoreRead { lore } if *lore == lore_id)
    })?;
    results.push(TestResult::check("lore_read", read, lore.id.clone()));

    if verbose {
        if let Some(snap) = engine.snapshot() {
            println!("  after investigation: tick {}, weather {:?}", snap.tick, snap.weather);
        }
    }
    Ok(results)
}

// ── 3. Accusations ──────────────────────────────────────────────────────

fn validate_accusations(content: &CaseContent, verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();
    let mut engine = story_playing(content, 11)?;
    let murderer = murderer_id(&mut engine)?;

    let early = engine.accuse(&murderer);
    results.push(TestResult::check(
        "accuse_needs_evidence",
        early == AccuseOutcome::NotEnoughEvidence,
        format!("{:?}", early),
    ));

    collect_static_clues(&mut engine, content)?;
    let innocent = content
        .npcs
        .iter()
        .find(|n| n.id != murderer)
        .map(|n| n.id.clone())
        .ok_or("no innocent npc")?;
    let before = engine.living_npc_count();
    let wrong = engine.accuse(&innocent);
    results.push(TestResult::check(
        "wrong_accusation",
        wrong == AccuseOutcome::Wrong { accusations_left: 2 },
        format!("{:?}", wrong),
    ));

    let mut events = Vec::new();
    let settled = run_until(&mut engine, 60.0, &mut events, |e| {
        e.world.as_ref().is_some_and(|w| w.cinematic.is_none())
    });
    let claimed = count(&events, |e| {
        matches!(e, SimEvent::Message(Message::WrongAccusation { accusations_left: 2, .. }))
    });
    results.push(TestResult::check(
        "ghost_claims_bystander",
        settled && claimed == 1 && engine.living_npc_count() == before - 1,
        format!("{} -> {} living", before, engine.living_npc_count()),
    ));

    let right = engine.accuse(&murderer);
    results.push(TestResult::check(
        "correct_accusation",
        right == AccuseOutcome::Correct && engine.state() == Some(GameState::WinningCinematic),
        format!("{:?}", right),
    ));

    let mut events = Vec::new();
    let finished = run_until(&mut engine, 60.0, &mut events, |e| {
        e.state() == Some(GameState::FinishScreen)
    });
    let revealed = count(&events, |e| matches!(e, SimEvent::CinematicText(_)));
    let blood = count(&events, |e| matches!(e, SimEvent::BloodSplatter { .. }));
    results.push(TestResult::check(
        "winning_reveal",
        finished && revealed == 1 && blood >= 1,
        format!("text {}, blood {}", revealed, blood),
    ));

    if verbose {
        println!("  murderer was {}", murderer);
    }
    Ok(results)
}

// ── 4. Accusation Loss ──────────────────────────────────────────────────

fn validate_accusation_loss(content: &CaseContent, _verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();
    let mut engine = story_playing(content, 21)?;
    let murderer = murderer_id(&mut engine)?;
    collect_static_clues(&mut engine, content)?;

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let living: Vec<String> = {
            let w = world(&mut engine)?;
            w.living_npcs()
                .into_iter()
                .map(|e| w.character_id(e))
                .filter(|id| *id != murderer)
                .collect()
        };
        let accused = living.first().ok_or("no innocent left")?.clone();
        outcomes.push(engine.accuse(&accused));
        let mut events = Vec::new();
        run_until(&mut engine, 60.0, &mut events, |e| {
            e.world.as_ref().is_some_and(|w| w.cinematic.is_none()) || e.state().is_some_and(|s| s.is_terminal())
        });
    }

    results.push(TestResult::check(
        "accusations_count_down",
        outcomes.last() == Some(&AccuseOutcome::Wrong { accusations_left: 0 }),
        format!("{:?}", outcomes),
    ));
    results.push(TestResult::check(
        "game_over_by_accusation",
        engine.state() == Some(GameState::GameOver(GameOverReason::Accusation)),
        format!("{:?}", engine.state()),
    ));
    Ok(results)
}

// ── 5. Ritual Survival ──────────────────────────────────────────────────

fn validate_ritual_survival(content: &CaseContent, verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();
    let mut config = ModeConfig::ritual().with_seed(5);
    config.scheduler.survival_secs = 20.0;
    config.scheduler.ghost_interval = 10_000.0;
    config.scheduler.tiger_initial = 10_000.0;
    let mut engine = start(content, config)?;

    run_for(&mut engine, 12.5);
    results.push(TestResult::check(
        "ritual_intro_done",
        engine.state() == Some(GameState::RitualPlaying),
        format!("{:?}", engine.state()),
    ));

    let altar = world(&mut engine)?
        .ritual
        .as_ref()
        .and_then(|r| r.altars.first().copied())
        .ok_or("no altars placed")?;
    let before = world(&mut engine)?.scheduler.survival.remaining();
    let done = interact_at(&mut engine, altar.position, |e| {
        matches!(e, SimEvent::AltarDeactivated { altar: 0, .. })
    })?;
    let after = world(&mut engine)?.scheduler.survival.remaining();
    results.push(TestResult::check(
        "altar_extends_survival",
        done && after > before,
        format!("{:.1}s -> {:.1}s", before, after),
    ));

    let mut events = Vec::new();
    let ending = run_until(&mut engine, 60.0, &mut events, |e| {
        e.state() == Some(GameState::RitualEnding)
    });
    results.push(TestResult::check("survival_runs_out", ending, format!("{:?}", engine.state())));

    let complete = run_until(&mut engine, 120.0, &mut events, |e| {
        e.snapshot().is_some_and(|s| s.entities.iter().all(|c| !c.visible))
    });
    let signalled = count(&events, |e| matches!(e, SimEvent::EndingSequenceComplete));
    results.push(TestResult::check(
        "survivors_walk_off",
        complete && signalled == 1,
        format!("complete signals {}", signalled),
    ));

    let shown = engine.show_finish_screen();
    results.push(TestResult::check(
        "finish_screen_shown",
        shown && engine.state() == Some(GameState::FinishScreen),
        format!("{:?}", engine.state()),
    ));

    if verbose {
        println!("  {} survivors made it out", engine.living_npc_count());
    }
    Ok(results)
}

// ── 6. Ritual Threats ───────────────────────────────────────────────────

fn validate_ritual_threats(content: &CaseContent, _verbose: bool) -> Result<Vec<TestResult>, String> {
    let mut results = Vec::new();

    // Lightning: forced rain and a certain strike every second.
    let mut config = ModeConfig::ritual().skipping_intro().with_seed(8);
    config.scheduler.ritual_weather = SecsRange::fixed(10_000.0);
    config.scheduler.ritual_lightning = SecsRange::fixed(1.0);
    config.scheduler.ritual_lightning_chance = (1.0, 1.0);
    config.scheduler.ghost_interval = 10_000.0;
    config.scheduler.tiger_initial = 10_000.0;
    let mut engine = start(content, config)?;
    set_weather(world(&mut engine)?, Weather::Rain);

    let mut events = Vec::new();
    let struck = run_until(&mut engine, 10.0, &mut events, |e| {
        e.world.as_ref().is_some_and(|w| w.lightning.is_some())
    });
    let cleared = run_until(&mut engine, 5.0, &mut events, |e| {
        e.world.as_ref().is_some_and(|w| w.lightning.is_none())
    });
    let killed = count(&events, |e| {
        matches!(e, SimEvent::NpcDied { cause: DeathCause::Lightning, .. })
    });
    let blood = count(&events, |e| matches!(e, SimEvent::BloodSplatter { .. }));
    results.push(TestResult::check(
        "lightning_kills_once",
        struck && cleared && killed == 1 && blood == 1,
        format!("deaths {}, blood {}", killed, blood),
    ));

    // Ghost: scheduled every two seconds; the first contact claims one survivor.
    let mut config = ModeConfig::ritual().skipping_intro().with_seed(13);
    config.scheduler.ghost_interval = 2.0;
    config.scheduler.tiger_initial = 10_000.0;
    config.scheduler.ritual_weather = SecsRange::fixed(10_000.0);
    let mut engine = start(content, config)?;
    let mut events = Vec::new();
    let first_kill = run_until(&mut engine, 60.0, &mut events, |e| {
        e.world
            .as_ref()
            .and_then(|w| w.ritual.as_ref())
            .is_some_and(|r| r.survivors < 7)
    });
    let claimed = count(&events, |e| {
        matches!(e, SimEvent::NpcDied { cause: DeathCause::Ghost, .. })
    });
    let blood = count(&events, |e| matches!(e, SimEvent::BloodSplatter { .. }));
    results.push(TestResult::check(
        "ghost_claims_one_survivor",
        first_kill && claimed == 1 && blood >= 1,
        format!("deaths {}, blood {}", claimed, blood),
    ));

    let handed_off = {
        let w = world(&mut engine)?;
        w.controlled.is_some_and(|c| w.is_alive(c))
    };
    results.push(TestResult::check("control_survives_death", handed_off, ""));
    Ok(results)
}

// ── 7. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(content: &CaseContent, _verbose: bool) -> Result<Vec<TestResult>, String> {
    let inputs: Vec<InputSnapshot> = (0..900)
        .map(|i| {
            let t = i as f32 * DT;
            InputSnapshot {
                cycle_character: i % 200 == 199,
                ..InputSnapshot::moving(t.sin(), t.cos())
            }
        })
        .collect();

    let mut frames = Vec::new();
    for _ in 0..2 {
        let mut engine = start(content, ModeConfig::ritual().skipping_intro().with_seed(77))?;
        for input in &inputs {
            engine.update(DT, input);
        }
        let snap = engine.snapshot().ok_or("no snapshot")?;
        frames.push(snap.to_json().map_err(|e| e.to_string())?);
    }
    Ok(vec![TestResult::check(
        "seeded_runs_match",
        frames[0] == frames[1],
        format!("{} bytes", frames[0].len()),
    )])
}
