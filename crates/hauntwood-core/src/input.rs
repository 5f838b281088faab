//! Per-tick input snapshot. Device polling happens in the host.

use serde::{Deserialize, Serialize};

/// One frame of abstract input.
///
/// Movement axes are analog in `[-1, 1]`; `move_z` is positive toward the
/// camera. Every `bool` is an edge: true only on the tick it was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub move_x: f32,
    pub move_z: f32,
    /// Held, not an edge.
    pub sprint: bool,
    pub interact: bool,
    pub follow: bool,
    pub pause: bool,
    pub inventory: bool,
    pub journal: bool,
    pub hint: bool,
    /// Open the overhead map around the given ground point.
    pub map_view: Option<(f32, f32)>,
    pub cycle_character: bool,
    /// 0-based roster slot to take control of.
    pub select_character: Option<usize>,
    pub nav_up: bool,
    pub nav_down: bool,
    pub confirm: bool,
    pub cancel: bool,
}

impl InputSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(move_x: f32, move_z: f32) -> Self {
        Self {
            move_x,
            move_z,
            ..Self::default()
        }
    }

    pub fn has_movement(&self) -> bool {
        self.move_x != 0.0 || self.move_z != 0.0
    }
}
