//! Immutable descriptor of one declared transition.

use crate::access::{Actor, Permission};
use crate::core::{Condition, Source, State};
use crate::transition::target::Target;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// One declared edge of the transition graph.
///
/// A descriptor records everything a single `(operation, source token)`
/// declaration said: where it may fire from, how its target is computed,
/// where to land when the business method fails, its guard conditions,
/// its access requirement, and free-form metadata for tooling.
///
/// Descriptors are immutable once registered in a table.
pub struct Transition<E, S: State> {
    name: String,
    source: Source<S>,
    target: Option<Target<E, S>>,
    on_error: Option<S>,
    conditions: Vec<Condition<E>>,
    permission: Option<Permission<E>>,
    custom: HashMap<String, Value>,
}

impl<E, S: State> Transition<E, S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        source: Source<S>,
        target: Option<Target<E, S>>,
        on_error: Option<S>,
        conditions: Vec<Condition<E>>,
        permission: Option<Permission<E>>,
        custom: HashMap<String, Value>,
    ) -> Self {
        Self {
            name,
            source,
            target,
            on_error,
            conditions,
            permission,
            custom,
        }
    }

    /// Name of the declared operation this descriptor belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source token this descriptor is keyed under.
    pub fn source(&self) -> &Source<S> {
        &self.source
    }

    /// Target strategy; `None` means validate-only, never mutate state.
    pub fn target(&self) -> Option<&Target<E, S>> {
        self.target.as_ref()
    }

    /// State applied when the business method fails, if configured.
    pub fn on_error(&self) -> Option<&S> {
        self.on_error.as_ref()
    }

    /// Free-form metadata attached at declaration time.
    pub fn custom(&self) -> &HashMap<String, Value> {
        &self.custom
    }

    /// Evaluate all guard conditions against the entity.
    ///
    /// Every condition must pass; an empty list passes.
    pub fn conditions_met(&self, entity: &E) -> bool {
        self.conditions.iter().all(|c| c.check(entity))
    }

    /// Evaluate the access requirement. No requirement grants everyone.
    pub fn has_perm(&self, entity: &E, actor: &dyn Actor<E>) -> bool {
        match &self.permission {
            None => true,
            Some(permission) => permission.grants(entity, actor),
        }
    }
}

impl<E, S: State> Clone for Transition<E, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            on_error: self.on_error.clone(),
            conditions: self.conditions.clone(),
            permission: self.permission.clone(),
            custom: self.custom.clone(),
        }
    }
}

impl<E, S: State> fmt::Debug for Transition<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("on_error", &self.on_error.as_ref().map(|s| s.name()))
            .field("conditions", &self.conditions.len())
            .field("permission", &self.permission)
            .field("custom", &self.custom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum PostState {
        New,
        Published,
        Crashed,
    }

    impl State for PostState {
        fn name(&self) -> &str {
            match self {
                Self::New => "New",
                Self::Published => "Published",
                Self::Crashed => "Crashed",
            }
        }
    }

    struct Post {
        moderated: bool,
    }

    struct NoGrants;
    impl Actor<Post> for NoGrants {
        fn has_perm(&self, _permission: &str, _entity: Option<&Post>) -> bool {
            false
        }
    }

    fn publish() -> Transition<Post, PostState> {
        Transition::new(
            "publish".to_string(),
            Source::State(PostState::New),
            Some(Target::Fixed(PostState::Published)),
            Some(PostState::Crashed),
            vec![Condition::new(|p: &Post| p.moderated)],
            Some(Permission::named("posts.publish")),
            [("label".to_string(), json!("Publish"))].into_iter().collect(),
        )
    }

    #[test]
    fn descriptor_exposes_declaration() {
        let t = publish();
        assert_eq!(t.name(), "publish");
        assert_eq!(t.source(), &Source::State(PostState::New));
        assert_eq!(t.on_error(), Some(&PostState::Crashed));
        assert_eq!(t.custom().get("label").unwrap(), "Publish");
        assert_eq!(t.target().unwrap().fixed(), Some(&PostState::Published));
    }

    #[test]
    fn all_conditions_must_pass() {
        let t = publish();
        assert!(t.conditions_met(&Post { moderated: true }));
        assert!(!t.conditions_met(&Post { moderated: false }));
    }

    #[test]
    fn one_failing_condition_fails_the_conjunction() {
        let t = Transition::<Post, PostState>::new(
            "publish".to_string(),
            Source::State(PostState::New),
            Some(Target::Fixed(PostState::Published)),
            None,
            vec![
                Condition::new(|_: &Post| true),
                Condition::new(|p: &Post| p.moderated),
            ],
            None,
            HashMap::new(),
        );
        assert!(t.conditions_met(&Post { moderated: true }));
        assert!(!t.conditions_met(&Post { moderated: false }));
    }

    #[test]
    fn empty_condition_list_passes() {
        let t = Transition::<Post, PostState>::new(
            "touch".to_string(),
            Source::Any,
            None,
            None,
            Vec::new(),
            None,
            HashMap::new(),
        );
        assert!(t.conditions_met(&Post { moderated: false }));
    }

    #[test]
    fn missing_permission_grants_everyone() {
        let t = Transition::<Post, PostState>::new(
            "touch".to_string(),
            Source::Any,
            None,
            None,
            Vec::new(),
            None,
            HashMap::new(),
        );
        assert!(t.has_perm(&Post { moderated: true }, &NoGrants));
    }

    #[test]
    fn named_permission_denies_without_grant() {
        let t = publish();
        assert!(!t.has_perm(&Post { moderated: true }, &NoGrants));
    }
}
