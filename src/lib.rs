//! Stateflow: a declarative transition engine for entity state fields
//!
//! Stateflow governs how a persistent entity's state field may change over
//! its lifetime. Operations are declared up front with their allowed source
//! state(s), a target state (or a strategy for computing one), guard
//! conditions and an access requirement; the engine enforces that a state
//! change only ever happens through a sanctioned transition, and an
//! optimistic concurrency guard keeps the field consistent across
//! independently loaded copies of the same stored entity.
//!
//! # Core Concepts
//!
//! - **State**: opaque comparable tokens via the `State` trait
//! - **Transitions**: declared edges with sources, targets, guards and
//!   permissions, looked up through per-operation tables
//! - **Engine**: the fixed validate/notify/invoke/resolve/write protocol
//! - **Concurrency guard**: state fields double as the optimistic-lock token
//!
//! # Example
//!
//! ```rust
//! use stateflow::builder::{FsmBuilder, TransitionBuilder};
//! use stateflow::engine::StateField;
//! use stateflow::events::CallArgs;
//! use stateflow::state_enum;
//!
//! state_enum! {
//!     enum PostState {
//!         New,
//!         Published,
//!         Destroyed,
//!     }
//! }
//!
//! struct Post {
//!     state: PostState,
//!     moderated: bool,
//! }
//!
//! let fsm = FsmBuilder::new(StateField::new(
//!     "state",
//!     |post: &Post| post.state.clone(),
//!     |post: &mut Post, state| post.state = state,
//! ))
//! .transition(
//!     TransitionBuilder::new("publish")
//!         .source(PostState::New)
//!         .target(PostState::Published)
//!         .when(|post: &Post| post.moderated),
//! )
//! .unwrap()
//! .transition(
//!     TransitionBuilder::new("destroy")
//!         .source(PostState::Published)
//!         .target(PostState::Destroyed),
//! )
//! .unwrap()
//! .build()
//! .unwrap();
//!
//! let mut post = Post {
//!     state: PostState::New,
//!     moderated: true,
//! };
//! fsm.change_state(&mut post, "publish", &CallArgs::none(), |_post| Ok(()))
//!     .unwrap();
//! assert_eq!(post.state, PostState::Published);
//! ```

pub mod access;
pub mod builder;
pub mod core;
pub mod engine;
pub mod error;
pub mod events;
pub mod persist;
pub mod registry;
pub mod transition;

// Re-export commonly used types
pub use access::{Actor, Permission};
pub use builder::{BuildError, FsmBuilder, TransitionBuilder};
pub use core::{Condition, Source, State};
pub use engine::{change_states, Binding, Fsm, StateField};
pub use error::{Denial, DynError, FsmError};
pub use events::{CallArgs, EventBus, EventKind, TransitionEvent, TransitionSink};
pub use persist::{ConcurrencyGuard, ConditionalStore, StateSnapshot};
pub use registry::TransitionRegistry;
pub use transition::{StateResult, Target, Transition, TransitionTable};
