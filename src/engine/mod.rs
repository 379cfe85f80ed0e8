//! Execution engine: runs one transition invocation end to end.
//!
//! The protocol for every invocation is fixed: read the current state,
//! match it against the operation's transition table, evaluate guard
//! conditions, emit the pre-transition event, invoke the business method
//! body, resolve the target, apply type specialization, write the state
//! field, emit the post-transition event. On a body failure the matched
//! descriptor's error target is applied (when configured) and the failure
//! propagates unchanged.

mod field;

pub use field::StateField;

use crate::access::Actor;
use crate::builder::FsmBuilder;
use crate::core::State;
use crate::error::{Denial, DynError, FsmError};
use crate::events::{CallArgs, EventBus, EventKind, TransitionEvent};
use crate::registry::TransitionRegistry;
use crate::transition::{StateResult, Transition};
use chrono::Utc;

/// A finalized state machine for one (entity type, state field) pair.
///
/// Built once at startup through [`FsmBuilder`]; read-only afterwards and
/// safe for unsynchronized concurrent reads.
///
/// # Example
///
/// ```rust
/// use stateflow::builder::{FsmBuilder, TransitionBuilder};
/// use stateflow::engine::StateField;
/// use stateflow::events::CallArgs;
///
/// struct Post {
///     state: String,
/// }
///
/// let fsm = FsmBuilder::new(StateField::new(
///     "state",
///     |post: &Post| post.state.clone(),
///     |post: &mut Post, state| post.state = state,
/// ))
/// .transition(
///     TransitionBuilder::new("publish")
///         .source("new".to_string())
///         .target("published".to_string()),
/// )
/// .unwrap()
/// .build()
/// .unwrap();
///
/// let mut post = Post { state: "new".to_string() };
/// fsm.change_state(&mut post, "publish", &CallArgs::none(), |_post| Ok(()))
///     .unwrap();
/// assert_eq!(post.state, "published");
/// ```
pub struct Fsm<E, S: State> {
    field: StateField<E, S>,
    registry: TransitionRegistry<E, S>,
    bus: EventBus<E, S>,
}

/// One (machine, operation) pair of a shared invocation.
///
/// A business method bound to several independent state fields declares
/// one binding per field; [`change_states`] runs the full protocol once
/// per binding while invoking the method body only once.
pub struct Binding<'a, E, S: State> {
    pub fsm: &'a Fsm<E, S>,
    pub transition: &'a str,
}

impl<E, S: State> Fsm<E, S> {
    /// Start declaring a machine for `field`.
    pub fn builder(field: StateField<E, S>) -> FsmBuilder<E, S> {
        FsmBuilder::new(field)
    }

    pub(crate) fn assemble(
        field: StateField<E, S>,
        registry: TransitionRegistry<E, S>,
        bus: EventBus<E, S>,
    ) -> Self {
        Self {
            field,
            registry,
            bus,
        }
    }

    /// The governed state field.
    pub fn field(&self) -> &StateField<E, S> {
        &self.field
    }

    /// The frozen registry of declared operations.
    pub fn registry(&self) -> &TransitionRegistry<E, S> {
        &self.registry
    }

    /// Every registered descriptor, in declaration order. Read-only, for
    /// diagnostic graphs and tooling.
    pub fn all_transitions(&self) -> impl Iterator<Item = &Transition<E, S>> {
        self.registry.all_transitions()
    }

    /// Run one transition invocation end to end.
    ///
    /// `body` is the business method; it runs exactly once, after the
    /// transition has been validated and announced. Its failure propagates
    /// unchanged (wrapped transparently) after error-target handling.
    pub fn change_state<T, F>(
        &self,
        entity: &mut E,
        transition: &str,
        args: &CallArgs,
        body: F,
    ) -> Result<T, FsmError>
    where
        T: StateResult<S>,
        F: FnOnce(&mut E) -> Result<T, DynError>,
    {
        change_states(
            &[Binding {
                fsm: self,
                transition,
            }],
            entity,
            args,
            body,
        )
    }

    /// Would invoking `transition` be sanctioned right now?
    ///
    /// Checks the table match and, when `check_conditions` is set, the
    /// guard conditions. Never raises and never mutates.
    pub fn can_proceed(&self, entity: &E, transition: &str, check_conditions: bool) -> bool {
        let Some(table) = self.registry.get(transition) else {
            return false;
        };
        let current = self.field.get(entity);
        table.has_transition(&current)
            && (!check_conditions || table.conditions_met(entity, &current))
    }

    /// Would `actor` be allowed to invoke `transition` right now?
    ///
    /// Table match, guard conditions and the access requirement must all
    /// hold.
    pub fn has_transition_perm(&self, entity: &E, transition: &str, actor: &dyn Actor<E>) -> bool {
        let Some(table) = self.registry.get(transition) else {
            return false;
        };
        let current = self.field.get(entity);
        table.has_transition(&current)
            && table.conditions_met(entity, &current)
            && table.has_perm(entity, &current, actor)
    }

    /// Descriptors invocable from the entity's current state with all
    /// conditions met.
    pub fn available_transitions(&self, entity: &E) -> Vec<&Transition<E, S>> {
        let current = self.field.get(entity);
        self.registry
            .tables()
            .filter(|table| {
                table.has_transition(&current) && table.conditions_met(entity, &current)
            })
            .filter_map(|table| table.lookup(&current))
            .collect()
    }

    /// Like [`Fsm::available_transitions`], additionally filtered by the
    /// actor's access.
    pub fn available_actor_transitions(
        &self,
        entity: &E,
        actor: &dyn Actor<E>,
    ) -> Vec<&Transition<E, S>> {
        self.available_transitions(entity)
            .into_iter()
            .filter(|t| t.has_perm(entity, actor))
            .collect()
    }

    /// Subscribe a notification sink. Delivery follows subscription order.
    pub fn subscribe(&mut self, sink: std::sync::Arc<dyn crate::events::TransitionSink<E, S>>) {
        self.bus.subscribe(sink);
    }
}

struct Matched<'a, E, S: State> {
    field: &'a StateField<E, S>,
    bus: &'a EventBus<E, S>,
    table_name: &'a str,
    current: S,
    descriptor: &'a Transition<E, S>,
}

impl<E, S: State> Matched<'_, E, S> {
    fn emit(
        &self,
        kind: EventKind,
        entity: &E,
        args: &CallArgs,
        target: Option<&S>,
        error: Option<&DynError>,
    ) {
        self.bus.emit(
            kind,
            &TransitionEvent {
                entity,
                transition: self.table_name,
                field: self.field.name(),
                source: &self.current,
                target,
                args,
                error,
                timestamp: Utc::now(),
            },
        );
    }
}

/// Run one shared invocation across several bindings.
///
/// The full protocol executes once per binding, in declaration order; the
/// body runs exactly once. All bindings are validated before anything is
/// announced or invoked, so a refusal on any binding leaves every state
/// field untouched.
pub fn change_states<E, S, T, F>(
    bindings: &[Binding<'_, E, S>],
    entity: &mut E,
    args: &CallArgs,
    body: F,
) -> Result<T, FsmError>
where
    S: State,
    T: StateResult<S>,
    F: FnOnce(&mut E) -> Result<T, DynError>,
{
    let mut matched = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let fsm = binding.fsm;
        let name = binding.transition;
        let Some(table) = fsm.registry.get(name) else {
            return Err(FsmError::UnknownTransition {
                name: name.to_string(),
            });
        };
        let current = fsm.field.get(entity);

        if !table.has_transition(&current) {
            fsm.bus.emit(
                EventKind::NoTransition,
                &TransitionEvent {
                    entity,
                    transition: table.name(),
                    field: fsm.field.name(),
                    source: &current,
                    target: None,
                    args,
                    error: None,
                    timestamp: Utc::now(),
                },
            );
            return Err(FsmError::TransitionNotAllowed {
                name: name.to_string(),
                from: current.name().to_string(),
                reason: Denial::NoTransition,
            });
        }

        let Some(descriptor) = table.lookup(&current) else {
            // has_transition() held, so a descriptor must match
            return Err(FsmError::TransitionNotAllowed {
                name: name.to_string(),
                from: current.name().to_string(),
                reason: Denial::NoTransition,
            });
        };

        let m = Matched {
            field: &fsm.field,
            bus: &fsm.bus,
            table_name: table.name(),
            current,
            descriptor,
        };

        if !descriptor.conditions_met(entity) {
            m.emit(EventKind::TransitionNotAllowed, entity, args, None, None);
            return Err(FsmError::TransitionNotAllowed {
                name: name.to_string(),
                from: m.current.name().to_string(),
                reason: Denial::ConditionsNotMet,
            });
        }

        matched.push(m);
    }

    for m in &matched {
        // dynamic targets are only known after the body runs
        let best_effort = m.descriptor.target().and_then(|t| t.fixed());
        m.emit(EventKind::PreTransition, entity, args, best_effort, None);
        tracing::debug!(
            transition = m.table_name,
            field = m.field.name(),
            source = m.current.name(),
            "entering transition"
        );
    }

    match body(entity) {
        Ok(value) => {
            for m in &matched {
                match m.descriptor.target() {
                    Some(target) => {
                        let next = target.resolve(entity, &value, args, m.table_name)?;
                        m.field.specialize(entity, &next);
                        m.field.set(entity, next.clone());
                        m.emit(EventKind::PostTransition, entity, args, Some(&next), None);
                    }
                    // validate-only: never mutates, still announced
                    None => m.emit(EventKind::PostTransition, entity, args, None, None),
                }
            }
            Ok(value)
        }
        Err(error) => {
            for m in &matched {
                if let Some(error_state) = m.descriptor.on_error() {
                    m.field.specialize(entity, error_state);
                    m.field.set(entity, error_state.clone());
                    m.emit(
                        EventKind::PostTransition,
                        entity,
                        args,
                        Some(error_state),
                        Some(&error),
                    );
                    tracing::debug!(
                        transition = m.table_name,
                        error_state = error_state.name(),
                        "transition failed, applied error target"
                    );
                }
            }
            Err(FsmError::Invocation(error))
        }
    }
}



#[cfg(test)]
mod multi_binding_tests {
    use super::*;
    use crate::builder::{FsmBuilder, TransitionBuilder};
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum Stage {
        Waiting,
        Done,
        Failed,
    }

    impl State for Stage {
        fn name(&self) -> &str {
            match self {
                Self::Waiting => "Waiting",
                Self::Done => "Done",
                Self::Failed => "Failed",
            }
        }
    }

    struct Pipeline {
        build: Stage,
        deploy: Stage,
        runs: usize,
    }

    fn machine(field: &'static str) -> Fsm<Pipeline, Stage> {
        let accessor = match field {
            "build" => StateField::new(
                "build",
                |p: &Pipeline| p.build.clone(),
                |p: &mut Pipeline, s| p.build = s,
            ),
            _ => StateField::new(
                "deploy",
                |p: &Pipeline| p.deploy.clone(),
                |p: &mut Pipeline, s| p.deploy = s,
            ),
        };
        FsmBuilder::new(accessor)
            .transition(
                TransitionBuilder::new("run")
                    .source(Stage::Waiting)
                    .target(Stage::Done)
                    .on_error(Stage::Failed),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn shared_invocation_moves_every_bound_field() {
        let build = machine("build");
        let deploy = machine("deploy");
        let mut pipeline = Pipeline {
            build: Stage::Waiting,
            deploy: Stage::Waiting,
            runs: 0,
        };

        change_states(
            &[
                Binding {
                    fsm: &build,
                    transition: "run",
                },
                Binding {
                    fsm: &deploy,
                    transition: "run",
                },
            ],
            &mut pipeline,
            &CallArgs::none(),
            |p| {
                p.runs += 1;
                Ok(())
            },
        )
        .unwrap();

        // the body ran once; the protocol ran per binding
        assert_eq!(pipeline.runs, 1);
        assert_eq!(pipeline.build, Stage::Done);
        assert_eq!(pipeline.deploy, Stage::Done);
    }

    #[test]
    fn refusal_on_any_binding_blocks_the_invocation() {
        let build = machine("build");
        let deploy = machine("deploy");
        let mut pipeline = Pipeline {
            build: Stage::Waiting,
            deploy: Stage::Done,
            runs: 0,
        };

        let err = change_states(
            &[
                Binding {
                    fsm: &build,
                    transition: "run",
                },
                Binding {
                    fsm: &deploy,
                    transition: "run",
                },
            ],
            &mut pipeline,
            &CallArgs::none(),
            |p: &mut Pipeline| {
                p.runs += 1;
                Ok(())
            },
        )
        .unwrap_err();

        assert!(err.is_not_allowed());
        assert_eq!(pipeline.runs, 0);
        assert_eq!(pipeline.build, Stage::Waiting);
    }

    #[test]
    fn body_failure_applies_every_error_target() {
        let build = machine("build");
        let deploy = machine("deploy");
        let mut pipeline = Pipeline {
            build: Stage::Waiting,
            deploy: Stage::Waiting,
            runs: 0,
        };

        let err = change_states::<_, _, (), _>(
            &[
                Binding {
                    fsm: &build,
                    transition: "run",
                },
                Binding {
                    fsm: &deploy,
                    transition: "run",
                },
            ],
            &mut pipeline,
            &CallArgs::none(),
            |_| Err("runner crashed".into()),
        )
        .unwrap_err();

        assert!(matches!(err, FsmError::Invocation(_)));
        assert_eq!(pipeline.build, Stage::Failed);
        assert_eq!(pipeline.deploy, Stage::Failed);
    }
}
