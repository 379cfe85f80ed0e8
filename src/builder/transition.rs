//! Builder for declaring transitions.

use crate::access::Permission;
use crate::builder::error::BuildError;
use crate::core::{Condition, Source, State};
use crate::events::CallArgs;
use crate::transition::{Target, Transition, TransitionTable};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Fluent builder declaring one operation's transitions.
///
/// One builder produces one [`TransitionTable`]: each listed source token
/// becomes its own descriptor sharing the target strategy, error target,
/// conditions, permission and metadata.
///
/// # Example
///
/// ```rust
/// use stateflow::builder::TransitionBuilder;
///
/// struct Post {
///     moderated: bool,
/// }
///
/// let table = TransitionBuilder::<Post, String>::new("publish")
///     .source("new".to_string())
///     .target("published".to_string())
///     .when(|post: &Post| post.moderated)
///     .build()
///     .unwrap();
///
/// assert!(table.has_transition(&"new".to_string()));
/// ```
pub struct TransitionBuilder<E, S: State> {
    name: String,
    sources: Vec<Source<S>>,
    target: Option<Target<E, S>>,
    on_error: Option<S>,
    conditions: Vec<Condition<E>>,
    permission: Option<Permission<E>>,
    custom: HashMap<String, Value>,
}

impl<E, S: State> TransitionBuilder<E, S> {
    /// Start declaring the operation called `name`.
    ///
    /// Without a target call the declaration is validate-only: the whole
    /// protocol runs but the state field is never mutated.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
            target: None,
            on_error: None,
            conditions: Vec::new(),
            permission: None,
            custom: HashMap::new(),
        }
    }

    /// Allow this transition from `state` (may be called repeatedly).
    pub fn source(mut self, state: S) -> Self {
        self.sources.push(Source::State(state));
        self
    }

    /// Allow this transition from several states at once.
    pub fn sources(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.sources.extend(states.into_iter().map(Source::State));
        self
    }

    /// Allow this transition from any source state (`*`).
    pub fn source_any(mut self) -> Self {
        self.sources.push(Source::Any);
        self
    }

    /// Allow this transition from any source state except its own target
    /// (`+`, self-loop exclusion).
    pub fn source_any_other(mut self) -> Self {
        self.sources.push(Source::AnyOther);
        self
    }

    /// Fixed target state.
    pub fn target(mut self, state: S) -> Self {
        self.target = Some(Target::Fixed(state));
        self
    }

    /// Take the target from the business method's return value.
    pub fn target_returned(mut self) -> Self {
        self.target = Some(Target::ReturnValue(None));
        self
    }

    /// Take the target from the return value, restricted to an allow-list.
    pub fn target_returned_in(mut self, allowed: impl IntoIterator<Item = S>) -> Self {
        self.target = Some(Target::ReturnValue(Some(allowed.into_iter().collect())));
        self
    }

    /// Compute the target from the entity and invocation arguments.
    pub fn target_computed<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&E, &CallArgs) -> S + Send + Sync + 'static,
    {
        self.target = Some(Target::Computed {
            resolver: Arc::new(resolver),
            allowed: None,
        });
        self
    }

    /// Compute the target, restricted to an allow-list.
    pub fn target_computed_in<F>(
        mut self,
        resolver: F,
        allowed: impl IntoIterator<Item = S>,
    ) -> Self
    where
        F: Fn(&E, &CallArgs) -> S + Send + Sync + 'static,
    {
        let allowed: HashSet<S> = allowed.into_iter().collect();
        self.target = Some(Target::Computed {
            resolver: Arc::new(resolver),
            allowed: Some(allowed),
        });
        self
    }

    /// State to land in when the business method fails.
    pub fn on_error(mut self, state: S) -> Self {
        self.on_error = Some(state);
        self
    }

    /// Add a guard condition (may be called repeatedly; all must pass).
    pub fn condition(mut self, condition: Condition<E>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a guard condition from a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.condition(Condition::new(predicate))
    }

    /// Attach the access requirement.
    pub fn permission(mut self, permission: Permission<E>) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Attach one metadata entry for tooling.
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Build the transition table.
    ///
    /// Fails when no source was declared, on duplicate source tokens, and
    /// on a dynamic target combined with the `+` wildcard.
    pub fn build(self) -> Result<TransitionTable<E, S>, BuildError> {
        if self.sources.is_empty() {
            return Err(BuildError::MissingSource { name: self.name });
        }

        let mut table = TransitionTable::new(self.name.clone());
        for source in self.sources {
            table.register(Transition::new(
                self.name.clone(),
                source,
                self.target.clone(),
                self.on_error.clone(),
                self.conditions.clone(),
                self.permission.clone(),
                self.custom.clone(),
            ))?;
        }
        Ok(table)
    }
}
