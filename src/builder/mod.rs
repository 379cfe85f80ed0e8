//! Builder API for declaring transitions and assembling machines.
//!
//! This module provides fluent builders and macros for declaring state
//! machines with minimal boilerplate while keeping every conflict a
//! startup-time error.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::FsmBuilder;
pub use transition::TransitionBuilder;
