//! Character update contract shared by the player, NPCs and cinematic moves.

use hauntwood_logic::animation::direction_from_velocity;
use hauntwood_logic::constants::character::FACING_DEADZONE;
use hauntwood_logic::geometry::{Aabb, Vec3, WorldBounds};
use hauntwood_logic::movement::{is_moving, move_with_collisions, smooth_velocity};
use hauntwood_logic::weather::{footstep_cue, Weather};

use crate::components::CharacterState;
use crate::events::{EventQueue, SoundChannel};

/// Where this tick's motion comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drive {
    /// Input-driven: velocity eases toward the target.
    Smoothed { target_velocity: Vec3 },
    /// AI or script: move along `direction` at `speed` this tick.
    Direct { direction: Vec3, speed: f32 },
    /// Stand still.
    Still,
}

/// Per-tick environment for character updates.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub delta: f32,
    /// `None` means unobstructed movement.
    pub collidables: Option<&'a [Aabb]>,
    pub bounds: &'a WorldBounds,
    pub paused: bool,
    pub weather: Weather,
    pub sfx_volume: f32,
}

/// Advance one character: movement, animation and footstep audio.
pub fn update_character(ch: &mut CharacterState, ctx: &TickContext, drive: Drive, events: &mut EventQueue) {
    if ctx.paused {
        ch.moving = false;
        ch.animation.advance(ch.clips.clips(), ctx.delta, false, 0);
        sync_footsteps(ch, ctx, events);
        return;
    }

    let (moving, direction_x) = match drive {
        Drive::Smoothed { target_velocity } => {
            ch.velocity = smooth_velocity(ch.velocity, target_velocity);
            let moving = is_moving(ch.velocity);
            if moving {
                let step = ch.velocity * ctx.delta;
                ch.position =
                    move_with_collisions(ch.position, step, ch.body(), ctx.collidables, ctx.bounds).position;
            }
            (moving, direction_from_velocity(ch.velocity.x, FACING_DEADZONE))
        }
        Drive::Direct { direction, speed } => {
            let step = direction * (speed * ctx.delta);
            ch.velocity = direction * speed;
            ch.position =
                move_with_collisions(ch.position, step, ch.body(), ctx.collidables, ctx.bounds).position;
            (true, direction_from_velocity(direction.x, 0.01))
        }
        Drive::Still => {
            ch.velocity = Vec3::ZERO;
            (false, 0)
        }
    };

    ch.moving = moving;
    if moving {
        ch.stationary_secs = 0.0;
    } else {
        ch.stationary_secs += ctx.delta;
    }
    ch.animation.advance(ch.clips.clips(), ctx.delta, moving, direction_x);
    sync_footsteps(ch, ctx, events);
}

/// Scripted walk toward `goal` without obstacles. Returns the remaining distance.
pub fn force_move(ch: &mut CharacterState, goal: Vec3, speed: f32, ctx: &TickContext, events: &mut EventQueue) -> f32 {
    let dist = ch.position.ground_distance(&goal);
    let step = speed * ctx.delta;
    let unobstructed = TickContext {
        collidables: None,
        ..*ctx
    };
    if dist <= step {
        ch.position = ctx.bounds.clamp(Vec3::new(goal.x, ch.position.y, goal.z));
        update_character(ch, &unobstructed, Drive::Still, events);
        return ch.position.ground_distance(&goal);
    }
    let direction = ch.position.ground_direction(&goal);
    update_character(ch, &unobstructed, Drive::Direct { direction, speed }, events);
    ch.position.ground_distance(&goal)
}

/// Start, swap or stop the looping footstep sound to match the walk state.
fn sync_footsteps(ch: &mut CharacterState, ctx: &TickContext, events: &mut EventQueue) {
    use hauntwood_logic::animation::AnimState;

    let walking = ch.visible && ch.animation.state == AnimState::Walk && ch.moving;
    if walking {
        let cue = footstep_cue(ctx.weather, ctx.sfx_volume);
        if ch.footsteps != Some(cue.sound_id) {
            if ch.footsteps.is_some() {
                events.stop(SoundChannel::Footsteps(ch.id.clone()));
            }
            events.looping(
                cue.sound_id,
                cue.volume,
                Some(ch.position),
                SoundChannel::Footsteps(ch.id.clone()),
            );
            ch.footsteps = Some(cue.sound_id);
        }
    } else if ch.footsteps.take().is_some() {
        events.stop(SoundChannel::Footsteps(ch.id.clone()));
    }
}

/// Stop a character's footsteps outright (death, hide).
pub fn silence(ch: &mut CharacterState, events: &mut EventQueue) {
    if ch.footsteps.take().is_some() {
        events.stop(SoundChannel::Footsteps(ch.id.clone()));
    }
}
