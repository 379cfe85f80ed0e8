//! Per-field registry of declared operations.
//!
//! Startup is two-phase: declare every operation's transition table, then
//! finalize once. A finalized registry is immutable and safe to share
//! across threads for the life of the process.

use crate::builder::BuildError;
use crate::core::State;
use crate::transition::{Transition, TransitionTable};
use std::collections::HashMap;

/// All operations declared for one (entity type, state field) pair.
pub struct TransitionRegistry<E, S: State> {
    tables: HashMap<String, TransitionTable<E, S>>,
    order: Vec<String>,
    finalized: bool,
}

impl<E, S: State> TransitionRegistry<E, S> {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            order: Vec::new(),
            finalized: false,
        }
    }

    /// Declare one operation. Fails after finalization and on duplicate
    /// operation names.
    pub fn declare(&mut self, table: TransitionTable<E, S>) -> Result<(), BuildError> {
        let name = table.name().to_string();
        if self.finalized {
            return Err(BuildError::RegistryFinalized { name });
        }
        if self.tables.contains_key(&name) {
            return Err(BuildError::DuplicateOperation { name });
        }
        self.order.push(name.clone());
        self.tables.insert(name, table);
        Ok(())
    }

    /// Freeze the registry. Fails when nothing was declared.
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        if self.tables.is_empty() {
            return Err(BuildError::NoTransitions);
        }
        self.finalized = true;
        tracing::debug!(operations = self.tables.len(), "transition registry finalized");
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Look up one operation's table by name.
    pub fn get(&self, name: &str) -> Option<&TransitionTable<E, S>> {
        self.tables.get(name)
    }

    /// All tables, in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &TransitionTable<E, S>> {
        self.order.iter().filter_map(|name| self.tables.get(name))
    }

    /// Every registered descriptor across all operations, in declaration
    /// order. Read-only; this is the contract graph tooling consumes.
    pub fn all_transitions(&self) -> impl Iterator<Item = &Transition<E, S>> {
        self.tables().flat_map(|table| table.iter())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<E, S: State> Default for TransitionRegistry<E, S> {
    fn default() -> Self {
        Self::new()
    }
}
