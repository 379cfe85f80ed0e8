//! Blog Workflow
//!
//! This example demonstrates a blog post lifecycle governed by declared
//! transitions, with event subscribers and an optimistic concurrency
//! guard over persistence.
//!
//! Key concepts:
//! - Post states (New -> Published -> Hidden / Removed)
//! - Guard conditions on transitions
//! - Error targets applied when the business method fails
//! - Pre/post transition notifications
//! - Stale-copy detection through the concurrency guard
//!
//! Run with: cargo run --example blog_workflow

use stateflow::builder::{FsmBuilder, TransitionBuilder};
use stateflow::engine::StateField;
use stateflow::error::DynError;
use stateflow::events::{CallArgs, EventKind, TransitionEvent};
use stateflow::persist::{ConcurrencyGuard, ConditionalStore, StateSnapshot};
use stateflow::state_enum;
use stateflow::FsmError;
use std::collections::HashMap;
use std::sync::Arc;

state_enum! {
    pub enum PostState {
        New,
        Published,
        Hidden,
        Removed,
        Failed,
    }
}

#[derive(Clone)]
struct Post {
    id: u64,
    title: String,
    moderated: bool,
    state: PostState,
}

fn post_state() -> StateField<Post, PostState> {
    StateField::new(
        "state",
        |post: &Post| post.state.clone(),
        |post: &mut Post, state| post.state = state,
    )
}

// Plain functions are valid sinks.
fn log_event(kind: EventKind, event: &TransitionEvent<'_, Post, PostState>) {
    println!(
        "  [{}] {} on field '{}' from {:?}",
        kind.name(),
        event.transition,
        event.field,
        event.source
    );
}

/// In-memory stand-in for a database table with a conditional UPDATE.
#[derive(Default)]
struct PostStore {
    rows: HashMap<u64, PostState>,
}

impl ConditionalStore<Post, PostState> for PostStore {
    fn write(&mut self, post: &Post, expected: &StateSnapshot<PostState>) -> Result<u64, DynError> {
        match self.rows.get_mut(&post.id) {
            None => {
                self.rows.insert(post.id, post.state.clone());
                Ok(1)
            }
            Some(stored) => {
                if expected.get("state") == Some(stored) {
                    *stored = post.state.clone();
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
        }
    }

    fn exists(&self, post: &Post) -> bool {
        self.rows.contains_key(&post.id)
    }
}

fn build_machine() -> Result<stateflow::Fsm<Post, PostState>, stateflow::BuildError> {
    FsmBuilder::new(post_state())
        .transition(
            TransitionBuilder::new("publish")
                .source(PostState::New)
                .target(PostState::Published)
                .on_error(PostState::Failed)
                .when(|post: &Post| post.moderated),
        )?
        .transition(
            TransitionBuilder::new("hide")
                .source(PostState::Published)
                .target(PostState::Hidden),
        )?
        .transition(
            TransitionBuilder::new("remove")
                .source_any_other()
                .target(PostState::Removed),
        )?
        .subscribe(Arc::new(log_event))
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fsm = build_machine()?;
    let mut store = PostStore::default();

    let mut post = Post {
        id: 1,
        title: "Hello, world".to_string(),
        moderated: false,
        state: PostState::New,
    };
    let mut guard = ConcurrencyGuard::capture(&post, vec![post_state()]);
    guard.save(&post, &mut store)?;

    println!("Trying to publish an unmoderated post:");
    match fsm.change_state(&mut post, "publish", &CallArgs::none(), |_| Ok(())) {
        Err(err) if err.is_not_allowed() => println!("  refused: {err}"),
        other => other.map(|_: ()| ())?,
    }

    println!("\nModerating, then publishing:");
    post.moderated = true;
    fsm.change_state(&mut post, "publish", &CallArgs::none(), |post: &mut Post| {
        println!("  rendering '{}'", post.title);
        Ok(())
    })?;
    guard.save(&post, &mut store)?;

    println!("\nA stale copy loaded before the publish tries to remove:");
    let mut stale = Post {
        state: PostState::New,
        ..post.clone()
    };
    let mut stale_guard = ConcurrencyGuard::capture(&stale, vec![post_state()]);
    fsm.change_state(&mut stale, "remove", &CallArgs::none(), |_| Ok(()))?;
    match stale_guard.save(&stale, &mut store) {
        Err(FsmError::ConcurrentTransition) => {
            println!("  rejected: the stored state moved on; reload and retry")
        }
        other => other?,
    }

    println!("\nRemoving through the fresh copy:");
    fsm.change_state(&mut post, "remove", &CallArgs::none(), |_| Ok(()))?;
    guard.save(&post, &mut store)?;
    println!("  final state: {:?}", post.state);

    Ok(())
}
