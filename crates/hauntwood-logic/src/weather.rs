//! Weather states, lighting targets and footstep selection.
//!
//! Lighting interpolates toward a per-weather target at `delta * 1.5` per
//! tick. Rain adds a small random flicker to the intensity targets; the
//! caller supplies the noise so this module stays deterministic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain,
    Foggy,
}

impl Weather {
    pub const ALL: [Weather; 3] = [Weather::Clear, Weather::Rain, Weather::Foggy];

    /// Weathers the scheduler may switch to from `self`.
    pub fn alternatives(self) -> [Weather; 2] {
        match self {
            Weather::Clear => [Weather::Rain, Weather::Foggy],
            Weather::Rain => [Weather::Clear, Weather::Foggy],
            Weather::Foggy => [Weather::Clear, Weather::Rain],
        }
    }

    pub fn lighting(self) -> LightingTarget {
        match self {
            Weather::Rain => LightingTarget {
                ambient: Light::new(Rgb::hex(0x303550), 0.28),
                directional: Light::new(Rgb::hex(0x405070), 0.42),
                fog_density: 0.0245,
            },
            Weather::Foggy => LightingTarget {
                ambient: Light::new(Rgb::hex(0x404050), 0.35),
                directional: Light::new(Rgb::hex(0x505560), 0.20),
                fog_density: 0.042,
            },
            Weather::Clear => LightingTarget {
                ambient: Light::new(Rgb::hex(0x405070), 0.24),
                directional: Light::new(Rgb::hex(0x9ab0d0), 0.84),
                fog_density: 0.0189,
            },
        }
    }
}

/// Looping footstep sound for a walking character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootstepCue {
    pub sound_id: &'static str,
    pub volume: f32,
}

pub fn footstep_cue(weather: Weather, sfx_volume: f32) -> FootstepCue {
    match weather {
        Weather::Rain => FootstepCue {
            sound_id: "footsteps_splash",
            volume: 0.8 * sfx_volume,
        },
        _ => FootstepCue {
            sound_id: "footsteps_grass",
            volume: 0.6 * sfx_volume,
        },
    }
}

/// Linear RGB triple in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn hex(v: u32) -> Self {
        Self {
            r: ((v >> 16) & 0xff) as f32 / 255.0,
            g: ((v >> 8) & 0xff) as f32 / 255.0,
            b: (v & 0xff) as f32 / 255.0,
        }
    }

    fn lerp(&self, to: &Rgb, t: f32) -> Rgb {
        use crate::geometry::lerp;
        Rgb {
            r: lerp(self.r, to.r, t),
            g: lerp(self.g, to.g, t),
            b: lerp(self.b, to.b, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Rgb,
    pub intensity: f32,
}

impl Light {
    pub fn new(color: Rgb, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingTarget {
    pub ambient: Light,
    pub directional: Light,
    pub fog_density: f32,
}

/// Current scene lighting as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingState {
    pub ambient: Light,
    pub directional: Light,
    pub fog_density: f32,
    pub bloom: f32,
}

impl LightingState {
    pub fn for_weather(weather: Weather) -> Self {
        let t = weather.lighting();
        Self {
            ambient: t.ambient,
            directional: t.directional,
            fog_density: t.fog_density,
            bloom: crate::constants::effects::BLOOM_REST,
        }
    }

    /// Ease toward `weather`'s target.
    ///
    /// `flicker` is a pair of noise samples in `[-0.5, 0.5)` applied only in
    /// rain. `elapsed` drives the slow fog breathing in foggy weather.
    pub fn approach(&mut self, weather: Weather, delta: f32, flicker: (f32, f32), elapsed: f32) {
        use crate::geometry::lerp;
        let target = weather.lighting();
        let t = (delta * 1.5).min(1.0);

        let mut ambient_i = target.ambient.intensity;
        let mut dir_i = target.directional.intensity;
        if weather == Weather::Rain {
            ambient_i += flicker.0 * 0.1;
            dir_i += flicker.1 * 0.2;
        }

        self.ambient.color = self.ambient.color.lerp(&target.ambient.color, t);
        self.directional.color = self.directional.color.lerp(&target.directional.color, t);
        self.ambient.intensity = lerp(self.ambient.intensity, ambient_i, t);
        self.directional.intensity = lerp(self.directional.intensity, dir_i, t);

        self.fog_density = match weather {
            Weather::Foggy => target.fog_density + (elapsed * 0.5).sin() * 0.005,
            _ => target.fog_density,
        };
    }
}
