//! Transition declarations: descriptors, target strategies, and the
//! per-operation lookup table.

mod descriptor;
mod table;
mod target;

pub use descriptor::Transition;
pub use table::TransitionTable;
pub use target::{StateResult, Target, TargetResolver};
