//! Builder for assembling state machines.
//!
//! Startup is two-phase: declare every transition on the builder, then a
//! single `build()` validates and freezes the registry before the machine
//! serves any invocation.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::State;
use crate::engine::{Fsm, StateField};
use crate::events::{EventBus, TransitionSink};
use crate::registry::TransitionRegistry;
use crate::transition::TransitionTable;
use std::sync::Arc;

/// Builder for constructing an [`Fsm`] with a fluent API.
pub struct FsmBuilder<E, S: State> {
    field: StateField<E, S>,
    registry: TransitionRegistry<E, S>,
    bus: EventBus<E, S>,
}

impl<E, S: State> FsmBuilder<E, S> {
    /// Start a machine governing `field`.
    pub fn new(field: StateField<E, S>) -> Self {
        Self {
            field,
            registry: TransitionRegistry::new(),
            bus: EventBus::new(),
        }
    }

    /// Declare a transition using a builder.
    /// Returns an error if the declaration fails validation.
    pub fn transition(mut self, builder: TransitionBuilder<E, S>) -> Result<Self, BuildError> {
        self.registry.declare(builder.build()?)?;
        Ok(self)
    }

    /// Declare a pre-built transition table.
    pub fn add_table(mut self, table: TransitionTable<E, S>) -> Result<Self, BuildError> {
        self.registry.declare(table)?;
        Ok(self)
    }

    /// Subscribe a notification sink. Subscription order is delivery order.
    pub fn subscribe(mut self, sink: Arc<dyn TransitionSink<E, S>>) -> Self {
        self.bus.subscribe(sink);
        self
    }

    /// Finalize every table and assemble the machine.
    /// Returns an error if no transitions were declared.
    pub fn build(mut self) -> Result<Fsm<E, S>, BuildError> {
        self.registry.finalize()?;
        Ok(Fsm::assemble(self.field, self.registry, self.bus))
    }
}
