//! Runtime error taxonomy for transition execution and persistence.

use std::fmt;
use thiserror::Error;

/// Boxed error type carried across the business-method boundary.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a transition was refused before the business method ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Denial {
    /// No registered transition matches the current state.
    NoTransition,
    /// A transition matched but one of its guard conditions failed.
    ConditionsNotMet,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::NoTransition => f.write_str("no transition from this state"),
            Denial::ConditionsNotMet => f.write_str("conditions have not been met"),
        }
    }
}

/// Errors that can occur while executing or persisting a transition.
#[derive(Debug, Error)]
pub enum FsmError {
    /// The current state has no sanctioned transition, or a guard condition
    /// failed. Never retried automatically.
    #[error("can't switch from state '{from}' using transition '{name}': {reason}")]
    TransitionNotAllowed {
        name: String,
        from: String,
        reason: Denial,
    },

    /// A dynamically resolved target violated its declared allow-list.
    /// Indicates a business-logic defect, not a transient condition.
    #[error("transition '{name}' resolved to '{state}', which is not an allowed result state")]
    InvalidResultState { name: String, state: String },

    /// A `ReturnValue` target was declared but the business method's return
    /// value does not carry a state token.
    #[error("transition '{name}' did not produce a result state")]
    MissingResultState { name: String },

    /// The named operation was never declared for this state field.
    /// A wiring defect, not a state-machine refusal.
    #[error("'{name}' is not a declared transition")]
    UnknownTransition { name: String },

    /// Persist-time staleness: the stored state no longer matches the
    /// snapshot taken at load time. The caller should reload and retry.
    #[error("cannot save entity: its state has changed in storage since it was loaded")]
    ConcurrentTransition,

    /// The storage collaborator itself failed.
    #[error("storage error: {0}")]
    Storage(#[source] DynError),

    /// The business method body failed. The original failure propagates
    /// unchanged after any error-target handling has run.
    #[error(transparent)]
    Invocation(DynError),
}

impl FsmError {
    /// True for both flavors of refusal (no match, failed conditions).
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, FsmError::TransitionNotAllowed { .. })
    }
}
