//! Per-operation transition table: source token to descriptor.

use crate::access::Actor;
use crate::builder::BuildError;
use crate::core::{Source, State};
use crate::transition::descriptor::Transition;
use std::collections::HashMap;

/// All declared source states of one operation, keyed by source token.
///
/// The table owns the single source-matching algorithm used everywhere:
/// an exact entry wins over `*` (any), which wins over `+` (any other).
/// Tables are built during startup and immutable afterwards, so they are
/// safe for unsynchronized concurrent reads.
pub struct TransitionTable<E, S: State> {
    name: String,
    by_source: HashMap<Source<S>, Transition<E, S>>,
    order: Vec<Source<S>>,
}

impl<E, S: State> TransitionTable<E, S> {
    /// Create an empty table for the operation called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_source: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Name of the operation this table belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register one descriptor under its source token.
    ///
    /// Fails on a duplicate source token, and rejects dynamic targets on
    /// the `+` wildcard: its self-loop exclusion compares the literal
    /// configured target, which a dynamic strategy does not have.
    pub fn register(&mut self, transition: Transition<E, S>) -> Result<(), BuildError> {
        let source = transition.source().clone();

        if source == Source::AnyOther
            && transition.target().map(|t| t.is_dynamic()).unwrap_or(false)
        {
            return Err(BuildError::DynamicFallbackTarget {
                name: self.name.clone(),
            });
        }

        if self.by_source.contains_key(&source) {
            return Err(BuildError::DuplicateTransition {
                name: self.name.clone(),
                source: source.to_string(),
            });
        }

        tracing::debug!(
            transition = %self.name,
            source = %source,
            "registered transition"
        );
        self.order.push(source.clone());
        self.by_source.insert(source, transition);
        Ok(())
    }

    /// Find the descriptor governing `state`.
    ///
    /// Three-tier fallback: the exact entry if present, else the `*`
    /// entry, else the `+` entry.
    pub fn lookup(&self, state: &S) -> Option<&Transition<E, S>> {
        self.by_source
            .get(&Source::State(state.clone()))
            .or_else(|| self.by_source.get(&Source::Any))
            .or_else(|| self.by_source.get(&Source::AnyOther))
    }

    /// Is any transition sanctioned from `state`?
    ///
    /// A `+` entry only counts when its literal target differs from
    /// `state`, so a catch-all never fires as a self-loop. The check uses
    /// the configured target, never a dynamically resolved one; a `+`
    /// entry with no target (validate-only) is never excluded.
    pub fn has_transition(&self, state: &S) -> bool {
        if self.by_source.contains_key(&Source::State(state.clone())) {
            return true;
        }
        if self.by_source.contains_key(&Source::Any) {
            return true;
        }
        if let Some(fallback) = self.by_source.get(&Source::AnyOther) {
            return match fallback.target().and_then(|t| t.fixed()) {
                Some(target) => target != state,
                None => true,
            };
        }
        false
    }

    /// Have all guard conditions of the matched descriptor been met?
    ///
    /// False when no descriptor matches at all.
    pub fn conditions_met(&self, entity: &E, state: &S) -> bool {
        match self.lookup(state) {
            None => false,
            Some(transition) => transition.conditions_met(entity),
        }
    }

    /// Does `actor` satisfy the matched descriptor's access requirement?
    ///
    /// False when no descriptor matches at all.
    pub fn has_perm(&self, entity: &E, state: &S, actor: &dyn Actor<E>) -> bool {
        match self.lookup(state) {
            None => false,
            Some(transition) => transition.has_perm(entity, actor),
        }
    }

    /// All descriptors, in registration order. Read-only, for tooling
    /// and diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<E, S>> {
        self.order.iter().filter_map(|source| self.by_source.get(source))
    }

    /// Consume the table, yielding its descriptors in registration order.
    /// Used to merge separately built declarations into one table.
    pub fn into_transitions(mut self) -> Vec<Transition<E, S>> {
        self.order
            .drain(..)
            .filter_map(|source| self.by_source.remove(&source))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
