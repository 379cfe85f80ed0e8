//! Core state machine tokens and predicates.
//!
//! This module contains the pure vocabulary of the engine:
//! - State tokens via the `State` trait
//! - Source match keys, including the `*`/`+` wildcards
//! - Guard conditions over entities
//!
//! All logic in this module is pure (no side effects).

mod condition;
mod source;
mod state;

pub use condition::Condition;
pub use source::Source;
pub use state::State;
