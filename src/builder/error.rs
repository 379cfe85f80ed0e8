//! Build errors for transition and machine builders.

use std::fmt;

/// Errors that can occur while declaring transitions and building machines.
///
/// All of these are startup-time conflicts, fatal before the machine
/// serves its first transition; none can occur at runtime.
#[derive(Debug)]
pub enum BuildError {
    DuplicateTransition { name: String, source: String },

    DuplicateOperation { name: String },

    DynamicFallbackTarget { name: String },

    MissingSource { name: String },

    NoTransitions,

    RegistryFinalized { name: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::DuplicateTransition { name, source } => {
                write!(f, "Duplicate transition for source '{source}' in '{name}'")
            }
            BuildError::DuplicateOperation { name } => {
                write!(f, "Transition '{name}' declared twice for the same state field")
            }
            BuildError::DynamicFallbackTarget { name } => {
                write!(
                    f,
                    "Transition '{name}' uses a dynamic target on the '+' wildcard; the self-loop exclusion needs a literal target"
                )
            }
            BuildError::MissingSource { name } => {
                write!(
                    f,
                    "Transition '{name}' has no source states. Call .source(state) or .source_any()"
                )
            }
            BuildError::NoTransitions => {
                write!(f, "No transitions declared. Add at least one transition")
            }
            BuildError::RegistryFinalized { name } => {
                write!(f, "Cannot declare '{name}': the registry is already finalized")
            }
        }
    }
}

impl std::error::Error for BuildError {}
