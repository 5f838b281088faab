//! Hauntwood Core - Village Horror Simulation Engine
//!
//! A headless, tick-driven simulation of a haunted forest village with two
//! modes: a murder-mystery investigation and a ritual survival run.
//!
//! # Architecture
//!
//! Characters live in a `hecs` ECS world inside a single `WorldState`:
//! - **Components**: Pure data attached to characters (CharacterState, Npc, Player)
//! - **Systems**: Free functions that take `&mut WorldState` and advance one concern
//! - **Generation**: Spawning the roster, player, boundary trees and altars
//! - **Engine**: Runs the per-tick stages in order and exposes host commands
//!
//! The host feeds an `InputSnapshot` each frame, then drains `SimEvent`s for
//! audio/UI and reads a `FrameSnapshot` for rendering.
//!
//! # Example
//!
//! ```rust,no_run
//! use hauntwood_core::prelude::*;
//!
//! let content = CaseContent::from_json(include_str!("../../../data/case_village.json")).unwrap();
//! let mut engine = SimulationEngine::new();
//! engine.start_mode(ModeConfig::story(), &content).unwrap();
//!
//! loop {
//!     engine.update(1.0 / 60.0, &InputSnapshot::idle()); // 60 FPS
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

use thiserror::Error;

pub mod components;
pub mod config;
pub mod content;
pub mod engine;
pub mod events;
pub mod generation;
pub mod input;
pub mod snapshot;
pub mod state;
pub mod systems;
pub mod world;

/// Why a mode could not start.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid mode config: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid case content: {0}")]
    Content(#[from] content::ContentError),
    #[error("failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::ModeConfig;
    pub use crate::content::CaseContent;
    pub use crate::engine::{AccuseOutcome, SimulationEngine};
    pub use crate::events::SimEvent;
    pub use crate::input::InputSnapshot;
    pub use crate::snapshot::FrameSnapshot;
    pub use crate::state::{GameMode, GameOverReason, GameState};
}
