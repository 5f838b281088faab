//! Outbound notifications for the audio, UI and effects collaborators.
//!
//! The simulation never plays sounds or draws text itself. It pushes
//! fire-and-forget requests here and the host drains them once per frame.

use hauntwood_logic::geometry::Vec3;
use hauntwood_logic::weather::Weather;
use serde::Serialize;

use crate::state::{GameOverReason, GameState};

/// Logical channel for looping sounds so they can be stopped later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SoundChannel {
    Footsteps(String),
    Whisper,
    Ghost,
    Rain,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MusicCue {
    DemonStart,
    DemonStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeathCause {
    Ghost,
    Lightning,
    Tiger,
    Enemy,
    Revealed,
}

/// Text beats shown during cinematics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CinematicText {
    MurdererRevealed { name: String },
}

/// Transient toast messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Message {
    WrongAccusation { victim: String, accusations_left: u8 },
    GhostClaimed { victim: String },
    NotEnoughEvidence,
    ControlSwitched { name: String },
    HintOnCooldown { remaining_secs: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    PlaySound {
        sound: String,
        volume: f32,
        looping: bool,
        position: Option<Vec3>,
        channel: Option<SoundChannel>,
    },
    StopSound {
        channel: SoundChannel,
    },
    Music(MusicCue),
    BloodSplatter {
        position: Vec3,
    },
    Bloom {
        strength: f32,
    },
    NpcDied {
        npc: String,
        cause: DeathCause,
    },
    WeatherChanged {
        weather: Weather,
    },
    CinematicText(CinematicText),
    ClueFound {
        clue: String,
        evidence: Option<String>,
        new_evidence: bool,
    },
    LoreRead {
        lore: String,
    },
    AltarDeactivated {
        altar: usize,
        survival_secs: f32,
    },
    Message(Message),
    StateChanged {
        from: GameState,
        to: GameState,
    },
    GameOver {
        reason: GameOverReason,
    },
    DialogueOpened {
        npc: String,
    },
    DialogueClosed {
        npc: String,
    },
    DialogueOptionChosen {
        npc: String,
        option: usize,
    },
    EndingSequenceComplete,
}

/// FIFO of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    /// One-shot sound, optionally positional.
    pub fn sound(&mut self, sound: &str, volume: f32, position: Option<Vec3>) {
        self.push(SimEvent::PlaySound {
            sound: sound.to_string(),
            volume,
            looping: false,
            position,
            channel: None,
        });
    }

    pub fn looping(&mut self, sound: &str, volume: f32, position: Option<Vec3>, channel: SoundChannel) {
        self.push(SimEvent::PlaySound {
            sound: sound.to_string(),
            volume,
            looping: true,
            position,
            channel: Some(channel),
        });
    }

    pub fn stop(&mut self, channel: SoundChannel) {
        self.push(SimEvent::StopSound { channel });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.pending.iter()
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue_in_order() {
        let mut q = EventQueue::new();
        q.sound("thunder", 1.0, None);
        q.stop(SoundChannel::Whisper);
        let out = q.drain();
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], SimEvent::PlaySound { looping: false, .. }));
        assert!(q.is_empty());
    }
}
