//! Generation - populating a fresh world at mode start

mod cast;
mod names;
mod village;

pub use cast::*;
pub use names::*;
pub use village::*;
