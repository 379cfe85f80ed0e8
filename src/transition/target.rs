//! Target resolution strategies.
//!
//! A transition's target is either a literal state or a policy for
//! computing one after the business method has run, so declaratively
//! registered transitions can still branch on runtime data (moderation
//! approve/reject and the like).

use crate::core::State;
use crate::error::FsmError;
use crate::events::CallArgs;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Resolver callback for [`Target::Computed`]: sees the entity and the
/// original invocation arguments.
pub type TargetResolver<E, S> = Arc<dyn Fn(&E, &CallArgs) -> S + Send + Sync>;

/// Policy computing the concrete next state of a transition.
pub enum Target<E, S: State> {
    /// The configured token, unchanged.
    Fixed(S),
    /// The business method's return value, optionally validated against an
    /// allow-list.
    ReturnValue(Option<HashSet<S>>),
    /// An externally computed value, optionally validated against an
    /// allow-list.
    Computed {
        resolver: TargetResolver<E, S>,
        allowed: Option<HashSet<S>>,
    },
}

/// Bridge from a business method's return value to a state token.
///
/// `ReturnValue` targets use this to extract the next state. State tokens
/// resolve to themselves; `()` carries no state. Business methods with
/// richer return types opt in with a one-line impl:
///
/// ```rust
/// use stateflow::core::State;
/// use stateflow::transition::StateResult;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// # enum ReviewState { Approved, Rejected }
/// # impl State for ReviewState {
/// #     fn name(&self) -> &str {
/// #         match self { Self::Approved => "Approved", Self::Rejected => "Rejected" }
/// #     }
/// # }
///
/// struct Review {
///     verdict: ReviewState,
///     notes: String,
/// }
///
/// impl StateResult<ReviewState> for Review {
///     fn to_state(&self) -> Option<ReviewState> {
///         Some(self.verdict.clone())
///     }
/// }
/// ```
pub trait StateResult<S: State> {
    /// The state carried by this value, if any.
    fn to_state(&self) -> Option<S> {
        None
    }
}

impl<S: State> StateResult<S> for S {
    fn to_state(&self) -> Option<S> {
        Some(self.clone())
    }
}

impl<S: State> StateResult<S> for () {}

impl<E, S: State> Target<E, S> {
    /// Literal target configured at declaration time, when there is one.
    ///
    /// Used for best-effort pre-transition payloads and for the `+`
    /// wildcard's self-loop exclusion, which only ever inspects literal
    /// targets.
    pub fn fixed(&self) -> Option<&S> {
        match self {
            Target::Fixed(state) => Some(state),
            _ => None,
        }
    }

    /// True for `ReturnValue` and `Computed` strategies.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Target::Fixed(_))
    }

    /// Compute the concrete next state after the business method ran.
    ///
    /// `returned` is the method's return value, `args` the original
    /// invocation arguments. Fails with `InvalidResultState` when an
    /// allow-list is declared and the resolved token is not a member.
    pub fn resolve<T: StateResult<S>>(
        &self,
        entity: &E,
        returned: &T,
        args: &CallArgs,
        transition: &str,
    ) -> Result<S, FsmError> {
        match self {
            Target::Fixed(state) => Ok(state.clone()),
            Target::ReturnValue(allowed) => {
                let state = returned
                    .to_state()
                    .ok_or_else(|| FsmError::MissingResultState {
                        name: transition.to_string(),
                    })?;
                check_allowed(state, allowed.as_ref(), transition)
            }
            Target::Computed { resolver, allowed } => {
                let state = resolver(entity, args);
                check_allowed(state, allowed.as_ref(), transition)
            }
        }
    }
}

fn check_allowed<S: State>(
    state: S,
    allowed: Option<&HashSet<S>>,
    transition: &str,
) -> Result<S, FsmError> {
    match allowed {
        Some(set) if !set.contains(&state) => Err(FsmError::InvalidResultState {
            name: transition.to_string(),
            state: state.name().to_string(),
        }),
        _ => Ok(state),
    }
}

impl<E, S: State> Clone for Target<E, S> {
    fn clone(&self) -> Self {
        match self {
            Target::Fixed(s) => Target::Fixed(s.clone()),
            Target::ReturnValue(allowed) => Target::ReturnValue(allowed.clone()),
            Target::Computed { resolver, allowed } => Target::Computed {
                resolver: Arc::clone(resolver),
                allowed: allowed.clone(),
            },
        }
    }
}

impl<E, S: State> fmt::Debug for Target<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Fixed(s) => write!(f, "Fixed({})", s.name()),
            Target::ReturnValue(_) => f.write_str("ReturnValue(..)"),
            Target::Computed { .. } => f.write_str("Computed(..)"),
        }
    }
}
