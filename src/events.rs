//! Transition notifications.
//!
//! The engine broadcasts events synchronously, in subscription order,
//! before control returns to the caller. Delivery is a boundary contract:
//! this crate defines the [`TransitionSink`] trait and an in-process
//! [`EventBus`]; how notifications travel further is the subscriber's
//! business.

use crate::core::State;
use crate::error::DynError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The four notification kinds emitted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// About to invoke the business method for a sanctioned transition.
    PreTransition,
    /// A transition completed, recovered to its error target, or was a
    /// validate-only transition that ran to completion.
    PostTransition,
    /// A transition matched the current state but its conditions failed.
    TransitionNotAllowed,
    /// No registered transition matches the current state.
    NoTransition,
}

impl EventKind {
    /// Wire name of the event, stable across releases.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PreTransition => "pre_transition",
            EventKind::PostTransition => "post_transition",
            EventKind::TransitionNotAllowed => "transition_not_allowed",
            EventKind::NoTransition => "no_transition",
        }
    }
}

/// Invocation arguments carried into event payloads and computed-target
/// resolvers.
///
/// Arguments are modelled as JSON values so payloads stay serializable
/// without forcing a generic parameter per call site.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CallArgs {
    /// Positional arguments, in call order.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    /// No arguments at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Append one positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Insert one keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// Payload delivered with every notification.
///
/// Borrows from the invocation; subscribers that need to keep data past
/// the callback must clone the pieces they care about.
pub struct TransitionEvent<'a, E, S: State> {
    /// The entity whose state field is transitioning.
    pub entity: &'a E,
    /// Name of the declared transition.
    pub transition: &'a str,
    /// Name of the governed state field.
    pub field: &'a str,
    /// State before the transition.
    pub source: &'a S,
    /// Target state, when known. `None` for validate-only transitions and
    /// for pre-transition events of dynamically resolved targets.
    pub target: Option<&'a S>,
    /// Invocation arguments.
    pub args: &'a CallArgs,
    /// The captured business-method failure, on error-flavored
    /// post-transition events.
    pub error: Option<&'a DynError>,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

/// Subscriber contract for transition notifications.
pub trait TransitionSink<E, S: State>: Send + Sync {
    /// Handle one event. Called synchronously; must not block for long.
    fn emit(&self, kind: EventKind, event: &TransitionEvent<'_, E, S>);
}

/// Every `Fn(kind, &event)` closure is a sink.
impl<E, S, F> TransitionSink<E, S> for F
where
    S: State,
    F: Fn(EventKind, &TransitionEvent<'_, E, S>) + Send + Sync,
{
    fn emit(&self, kind: EventKind, event: &TransitionEvent<'_, E, S>) {
        self(kind, event)
    }
}

/// In-process fan-out to subscribers, in subscription order.
pub struct EventBus<E, S: State> {
    sinks: Vec<Arc<dyn TransitionSink<E, S>>>,
}

impl<E, S: State> EventBus<E, S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register a subscriber. Order of registration is delivery order.
    pub fn subscribe(&mut self, sink: Arc<dyn TransitionSink<E, S>>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver one event to every subscriber.
    pub fn emit(&self, kind: EventKind, event: &TransitionEvent<'_, E, S>) {
        tracing::trace!(
            event = kind.name(),
            transition = event.transition,
            field = event.field,
            source = event.source.name(),
            "emitting transition event"
        );
        for sink in &self.sinks {
            sink.emit(kind, event);
        }
    }
}

impl<E, S: State> Default for EventBus<E, S> {
    fn default() -> Self {
        Self::new()
    }
}
