//! Global game states and the shared suspension predicate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Story,
    Ritual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The murderer outlasted the investigation.
    Timeout,
    /// Out of accusations.
    Accusation,
    /// Every ritual survivor died.
    AllDead,
}

/// Mutually exclusive top-level states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Intro,
    Briefing,
    Playing,
    RitualPlaying,
    /// Everything frozen; the previous state is kept on the world.
    Paused,
    WinningCinematic,
    LosingCinematic,
    RitualEnding,
    GameOver(GameOverReason),
    FinishScreen,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::GameOver(_) | GameState::FinishScreen)
    }
}

/// Reasons gameplay timers and autonomous AI are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspendReason {
    DialogueOpen,
    InventoryOpen,
    JournalOpen,
    MapView,
    Cinematic,
    PendingDeath,
    RitualEnding,
    TigerEvent,
}

impl SuspendReason {
    pub const ALL: [SuspendReason; 8] = [
        SuspendReason::DialogueOpen,
        SuspendReason::InventoryOpen,
        SuspendReason::JournalOpen,
        SuspendReason::MapView,
        SuspendReason::Cinematic,
        SuspendReason::PendingDeath,
        SuspendReason::RitualEnding,
        SuspendReason::TigerEvent,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// UI overlays that also stop the camera bob.
    pub fn is_ui(self) -> bool {
        matches!(
            self,
            SuspendReason::DialogueOpen | SuspendReason::InventoryOpen | SuspendReason::MapView
        )
    }
}

/// Set of active suspension reasons, computed once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendSet(u16);

impl SuspendSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, reason: SuspendReason) {
        self.0 |= reason.bit();
    }

    pub fn contains(&self, reason: SuspendReason) -> bool {
        self.0 & reason.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn any_ui(&self) -> bool {
        self.iter().any(SuspendReason::is_ui)
    }

    pub fn iter(&self) -> impl Iterator<Item = SuspendReason> + '_ {
        SuspendReason::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<SuspendReason> for SuspendSet {
    fn from_iter<I: IntoIterator<Item = SuspendReason>>(iter: I) -> Self {
        let mut set = SuspendSet::empty();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_membership() {
        let set: SuspendSet = [SuspendReason::MapView, SuspendReason::TigerEvent]
            .into_iter()
            .collect();
        assert!(set.contains(SuspendReason::MapView));
        assert!(!set.contains(SuspendReason::Cinematic));
        assert!(set.any_ui());
        assert_eq!(set.iter().count(), 2);
        assert!(SuspendSet::empty().is_empty());
    }

    #[test]
    fn terminal_states() {
        assert!(!GameState::Playing.is_terminal());
        assert!(GameState::FinishScreen.is_terminal());
        assert!(GameState::GameOver(GameOverReason::Timeout).is_terminal());
    }
}
