//! Core State trait for transition tokens.
//!
//! Every value a governed state field can hold must implement this trait.
//! States are opaque comparable tokens: the engine only ever clones them,
//! compares them, hashes them into lookup tables and prints their names.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state tokens.
///
/// All methods are pure. States represent immutable values naming one
/// position of an entity's state field.
///
/// # Required Traits
///
/// - `Clone`: tokens are cloned into snapshots and event payloads
/// - `Eq` + `Hash`: tokens key transition tables and allow-lists
/// - `Debug`: tokens must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: tokens must be serializable for persistence
///
/// # Example
///
/// ```rust
/// use stateflow::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum PostState {
///     New,
///     Published,
///     Removed,
/// }
///
/// impl State for PostState {
///     fn name(&self) -> &str {
///         match self {
///             Self::New => "New",
///             Self::Published => "Published",
///             Self::Removed => "Removed",
///         }
///     }
/// }
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// Plain strings work as state tokens out of the box, matching systems
/// where states live in a text column.
impl State for String {
    fn name(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        New,
        Published,
        Removed,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::New => "New",
                Self::Published => "Published",
                Self::Removed => "Removed",
            }
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::New.name(), "New");
        assert_eq!(TestState::Published.name(), "Published");
        assert_eq!(TestState::Removed.name(), "Removed");
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Published;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn string_states_work() {
        let state = "published".to_string();
        assert_eq!(state.name(), "published");
    }

    #[test]
    fn state_is_comparable() {
        assert_eq!(TestState::New, TestState::New);
        assert_ne!(TestState::New, TestState::Published);
    }
}
