//! Systems - free functions that advance the world one tick

mod camera;
mod character;
mod cinematics;
mod death;
mod interaction;
mod intro;
mod npc;
mod scheduler;
mod threats;

pub use camera::*;
pub use character::*;
pub use cinematics::*;
pub use death::*;
pub use interaction::*;
pub use intro::*;
pub use npc::*;
pub use scheduler::*;
pub use threats::*;
