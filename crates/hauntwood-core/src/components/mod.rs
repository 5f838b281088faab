//! Component definitions for the ECS simulation.
//!
//! Components are pure data attached to characters, or held in single-slot
//! options on the world for threats. They have no behavior beyond small
//! helpers; the rules live in systems.

mod character;
mod npc;
mod threat;

pub use character::*;
pub use npc::*;
pub use threat::*;
