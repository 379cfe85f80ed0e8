//! Guard conditions for controlling state transitions.
//!
//! Conditions are pure boolean predicates over the entity that must all
//! hold for a transition to be permitted. They see only the entity, never
//! the invocation arguments.

use std::sync::Arc;

/// Pure predicate over an entity that gates a transition.
///
/// Conditions are evaluated before the business method runs. They
/// encapsulate pre-conditions as pure functions; an empty condition list
/// always passes.
///
/// # Example
///
/// ```rust
/// use stateflow::core::Condition;
///
/// struct Post {
///     word_count: usize,
/// }
///
/// let long_enough = Condition::new(|post: &Post| post.word_count >= 100);
///
/// assert!(long_enough.check(&Post { word_count: 150 }));
/// assert!(!long_enough.check(&Post { word_count: 10 }));
/// ```
pub struct Condition<E> {
    predicate: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> Condition<E> {
    /// Create a condition from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (`Send + Sync`).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Condition {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the condition holds for this entity.
    pub fn check(&self, entity: &E) -> bool {
        (self.predicate)(entity)
    }
}

impl<E> Clone for Condition<E> {
    fn clone(&self) -> Self {
        Condition {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        published_count: usize,
        moderated: bool,
    }

    #[test]
    fn condition_allows_matching_entities() {
        let condition = Condition::new(|p: &Post| p.moderated);

        assert!(condition.check(&Post {
            published_count: 0,
            moderated: true
        }));
        assert!(!condition.check(&Post {
            published_count: 0,
            moderated: false
        }));
    }

    #[test]
    fn condition_is_deterministic() {
        let post = Post {
            published_count: 3,
            moderated: true,
        };
        let condition = Condition::new(|p: &Post| p.published_count < 10);

        assert_eq!(condition.check(&post), condition.check(&post));
    }

    #[test]
    fn condition_can_use_complex_predicates() {
        let condition = Condition::new(|p: &Post| p.moderated && p.published_count < 5);

        assert!(condition.check(&Post {
            published_count: 1,
            moderated: true
        }));
        assert!(!condition.check(&Post {
            published_count: 7,
            moderated: true
        }));
    }

    #[test]
    fn cloned_condition_shares_predicate() {
        let condition = Condition::new(|p: &Post| p.moderated);
        let cloned = condition.clone();

        let post = Post {
            published_count: 0,
            moderated: true,
        };
        assert_eq!(condition.check(&post), cloned.check(&post));
    }
}
