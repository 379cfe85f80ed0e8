//! Source tokens used as transition match keys.

use super::state::State;
use serde::Serialize;
use std::fmt;

/// Match key naming which source state(s) a transition accepts.
///
/// A transition table maps one `Source` token to one descriptor. Besides
/// literal states, two wildcard tokens exist:
///
/// - [`Source::Any`] matches every source state (`*` in graph output).
/// - [`Source::AnyOther`] matches every source state except one that already
///   equals the transition's own target, so a catch-all transition never
///   fires as a self-loop (`+` in graph output).
///
/// # Example
///
/// ```rust
/// use stateflow::core::Source;
///
/// let exact: Source<String> = Source::State("new".to_string());
/// assert!(exact.matches(&"new".to_string()));
/// assert!(!exact.matches(&"published".to_string()));
///
/// let any: Source<String> = Source::Any;
/// assert!(any.matches(&"published".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Source<S: State> {
    /// Match exactly this state.
    State(S),
    /// Match any source state.
    Any,
    /// Match any source state other than the transition's own target.
    AnyOther,
}

impl<S: State> Source<S> {
    /// Check whether this token matches a concrete state.
    ///
    /// `AnyOther` matches here unconditionally; the self-loop exclusion
    /// needs the transition's target and is applied by the table, not by
    /// the token itself.
    pub fn matches(&self, state: &S) -> bool {
        match self {
            Source::State(s) => s == state,
            Source::Any | Source::AnyOther => true,
        }
    }
}

impl<S: State> fmt::Display for Source<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::State(s) => f.write_str(s.name()),
            Source::Any => f.write_str("*"),
            Source::AnyOther => f.write_str("+"),
        }
    }
}
