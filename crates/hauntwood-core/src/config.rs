//! Mode configuration: which mode to run, the RNG seed, and scheduler tunables.
//!
//! Every field has a default matching the shipped game, so a host can start
//! from `ModeConfig::story()` / `ModeConfig::ritual()` or deserialize a
//! partial JSON override.

use hauntwood_logic::geometry::WorldBounds;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::GameMode;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name}: range {min}..{max} is empty or negative")]
    InvalidRange { name: &'static str, min: f32, max: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidChance { name: &'static str, value: f64 },
    #[error("sfx volume must be in [0, 1], got {0}")]
    InvalidVolume(f32),
    #[error("world bounds are degenerate")]
    InvalidBounds,
}

/// Inclusive-exclusive seconds range `[min, max)`. Equal ends mean a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecsRange {
    pub min: f32,
    pub max: f32,
}

impl SecsRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(v: f32) -> Self {
        Self { min: v, max: v }
    }

    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min < 0.0 || self.max < self.min {
            return Err(ConfigError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Event scheduler tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub story_weather: SecsRange,
    pub ritual_weather: SecsRange,
    pub story_lightning: SecsRange,
    pub story_lightning_chance: f64,
    pub ritual_lightning: SecsRange,
    /// The ritual strike chance is itself drawn from this range each time.
    pub ritual_lightning_chance: (f64, f64),
    pub ghost_interval: f32,
    pub tiger_initial: f32,
    pub tiger_cooldown: SecsRange,
    pub tiger_retry: f32,
    pub tiger_chance: f64,
    pub npc_death_first: f32,
    pub npc_death_repeat: f32,
    pub survival_secs: f32,
    pub altar_bonus_secs: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            story_weather: SecsRange::new(60.0, 120.0),
            ritual_weather: SecsRange::fixed(40.0),
            story_lightning: SecsRange::new(30.0, 60.0),
            story_lightning_chance: 0.2,
            ritual_lightning: SecsRange::new(20.0, 35.0),
            ritual_lightning_chance: (0.3, 0.9),
            ghost_interval: 60.0,
            tiger_initial: 5.0,
            tiger_cooldown: SecsRange::new(10.0, 15.0),
            tiger_retry: 1.0,
            tiger_chance: hauntwood_logic::constants::threat::TIGER_SPAWN_CHANCE,
            npc_death_first: 900.0,
            npc_death_repeat: 120.0,
            survival_secs: 180.0,
            altar_bonus_secs: hauntwood_logic::constants::ritual::ALTAR_BONUS_SECS,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.story_weather.validate("story_weather")?;
        self.ritual_weather.validate("ritual_weather")?;
        self.story_lightning.validate("story_lightning")?;
        self.ritual_lightning.validate("ritual_lightning")?;
        self.tiger_cooldown.validate("tiger_cooldown")?;
        for (name, value) in [
            ("ghost_interval", self.ghost_interval),
            ("tiger_retry", self.tiger_retry),
            ("npc_death_first", self.npc_death_first),
            ("npc_death_repeat", self.npc_death_repeat),
            ("survival_secs", self.survival_secs),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        let (lo, hi) = self.ritual_lightning_chance;
        for (name, value) in [
            ("story_lightning_chance", self.story_lightning_chance),
            ("tiger_chance", self.tiger_chance),
            ("ritual_lightning_chance", lo),
            ("ritual_lightning_chance", hi),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidChance { name, value });
            }
        }
        if hi < lo {
            return Err(ConfigError::InvalidChance {
                name: "ritual_lightning_chance",
                value: hi,
            });
        }
        Ok(())
    }
}

/// Everything `start_mode` needs besides content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub mode: GameMode,
    pub seed: u64,
    pub sfx_volume: f32,
    pub bounds: WorldBounds,
    /// Start directly in gameplay instead of the intro flythrough.
    pub skip_intro: bool,
    pub scheduler: SchedulerConfig,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Story,
            seed: 42,
            sfx_volume: 1.0,
            bounds: WorldBounds::default(),
            skip_intro: false,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl ModeConfig {
    pub fn story() -> Self {
        Self::default()
    }

    pub fn ritual() -> Self {
        Self {
            mode: GameMode::Ritual,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn skipping_intro(mut self) -> Self {
        self.skip_intro = true;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, crate::StartError> {
        let cfg: ModeConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sfx_volume) {
            return Err(ConfigError::InvalidVolume(self.sfx_volume));
        }
        let b = &self.bounds;
        if b.max_x <= b.min_x || b.max_z <= b.min_z {
            return Err(ConfigError::InvalidBounds);
        }
        self.scheduler.validate()
    }
}
