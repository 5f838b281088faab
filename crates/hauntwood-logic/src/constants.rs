//! Game constants: world extents, speeds, radii and event timings.
//!
//! Values that a mode may want to retune live in the core crate's
//! `SchedulerConfig`; these are the fixed physical rules of the world.

/// Half-width of the square playable area.
pub const WORLD_HALF_EXTENT: f32 = 95.0;
/// Ambush band threshold: `|x|` or `|z|` beyond this counts as "at the edge".
pub const EDGE_THRESHOLD: f32 = 80.0;

pub mod character {
    pub const HEIGHT: f32 = 3.8;
    /// Sprite aspect is 64x170.
    pub const WIDTH: f32 = HEIGHT * (64.0 / 170.0);
    pub const MAX_HP: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const NPC_SPEED: f32 = 2.0;
    pub const SPRINT_MULTIPLIER: f32 = 1.75;
    /// Per-tick velocity smoothing factor.
    pub const VELOCITY_LERP: f32 = 0.1;
    /// Squared speed under which velocity snaps to zero.
    pub const VELOCITY_SNAP_SQ: f32 = 0.01;
    /// Squared speed above which a character counts as moving.
    pub const MOVING_THRESHOLD_SQ: f32 = 0.1;
    /// Horizontal velocity dead-zone for facing flips on input-driven actors.
    pub const FACING_DEADZONE: f32 = 0.1;
}

pub mod npc {
    pub const ARRIVAL_RADIUS: f32 = 1.0;
    pub const FOLLOW_DISTANCE: f32 = 3.0;
    pub const FOLLOW_SPEED_MULTIPLIER: f32 = 1.2;
    pub const INITIAL_IDLE_MIN: f32 = 2.0;
    pub const INITIAL_IDLE_MAX: f32 = 7.0;
    pub const IDLE_MIN: f32 = 3.0;
    pub const IDLE_MAX: f32 = 10.0;
    /// Ground positions the story roster spawns at, in roster order.
    pub const SPAWN_POINTS: [(f32, f32); 7] = [
        (10.0, 0.0),
        (-10.0, 5.0),
        (15.0, -10.0),
        (-15.0, -15.0),
        (20.0, 20.0),
        (-20.0, -5.0),
        (0.0, 25.0),
    ];
    pub const SAFE_SPAWN_ATTEMPTS: u32 = 100;
}

pub mod threat {
    pub const GHOST_SPEED: f32 = 6.0;
    pub const GHOST_SPAWN_DISTANCE: f32 = 25.0;
    pub const GHOST_BEHIND_PLAYER_DISTANCE: f32 = 15.0;
    pub const GHOST_CONTACT: f32 = 1.5;
    pub const GHOST_ATTACK_DURATION: f32 = 0.88;

    pub const TIGER_SPEED: f32 = 15.0;
    pub const TIGER_CONTACT: f32 = 1.0;
    pub const TIGER_ATTACK_DURATION: f32 = 1.0;
    /// Distance from origin at which a fleeing tiger is removed.
    pub const TIGER_DESPAWN_RADIUS: f32 = 110.0;
    pub const TIGER_SPAWN_OFFSET: f32 = 5.0;
    pub const TIGER_NEARBY_RADIUS: f32 = 10.0;
    pub const TIGER_STATIONARY_SECS: f32 = 5.0;
    pub const TIGER_SPAWN_CHANCE: f64 = 0.5;

    pub const ENEMY_SPEED: f32 = 3.5;
}

pub mod effects {
    pub const BLOOD_LIFETIME: f32 = 1.5;
    pub const PENDING_DEATH_SECS: f32 = 1.5;
    pub const LIGHTNING_FLASH_SECS: f32 = 1.5;
    /// Strike resolves while the flash timer sits inside this window.
    pub const LIGHTNING_STRIKE_WINDOW: (f32, f32) = (0.8, 1.0);
    pub const BLOOM_FLASH: f32 = 2.5;
    pub const BLOOM_REST: f32 = 0.35;
}

pub mod interaction {
    pub const STORY_RADIUS: f32 = 3.0;
    pub const RITUAL_RADIUS: f32 = 4.0;
    pub const WHISPER_FOCUS_RADIUS: f32 = 4.0;
    pub const WHISPER_AUDIBLE_RADIUS: f32 = 15.0;
    pub const WHISPER_FOCUS_STILL_SECS: f32 = 1.5;
    pub const HINT_HIGHLIGHT_SECS: f32 = 5.0;
    pub const HINT_COOLDOWN_SECS: f32 = 30.0;
    pub const MAP_VIEW_SECS: f32 = 3.5;
}

pub mod ritual {
    pub const ALTAR_COUNT: usize = 7;
    pub const ALTAR_FIELD: f32 = 80.0;
    pub const ALTAR_CLEAR_RADIUS: f32 = 20.0;
    pub const ALTAR_BONUS_SECS: f32 = 10.0;
    pub const RALLY_POINT: (f32, f32) = (0.0, -80.0);
    pub const GATHER_SPEED: f32 = 2.5;
    pub const GATHER_TOLERANCE: f32 = 2.0;
    pub const EXIT_SPEED: f32 = 3.0;
    pub const EXIT_TOLERANCE: f32 = 0.5;
}

pub mod cinematic {
    pub const CONVERGE_SPEED: f32 = 12.0;
    pub const CONVERGE_ARRIVAL: f32 = 2.5;
    pub const RESCUE_AFTER_SECS: f32 = 2.5;
    pub const RESCUE_DISTANCE: f32 = 40.0;
    pub const RESCUE_RING: (f32, f32) = (4.0, 8.0);
    pub const PLAYER_RETREAT_SPEED: f32 = 2.0;
    pub const PLAYER_RETREAT_RADIUS: f32 = 20.0;
    pub const BLOOD_PHASE_SECS: f32 = 1.5;
    pub const TEXT_PHASE_SECS: f32 = 5.0;
    pub const STORY_INTRO_SECS: f32 = 15.0;
    pub const RITUAL_INTRO_SECS: f32 = 12.0;
}

pub mod camera {
    pub const FOLLOW_OFFSET: (f32, f32, f32) = (0.0, 8.0, 12.0);
    pub const FOLLOW_LERP: f32 = 0.08;
    pub const MAP_HEIGHT: f32 = 40.0;
    pub const MAP_LERP: f32 = 0.05;
    pub const BOB_FREQUENCY: f32 = 10.0;
    pub const BOB_AMPLITUDE: f32 = 0.08;
    pub const BOB_JITTER: f32 = 0.03;
}
