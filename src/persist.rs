//! Optimistic concurrency guard for persisting governed entities.
//!
//! Transitions are the only sanctioned mutation path for state fields, so
//! the fields themselves double as the optimistic-lock token: no separate
//! version counter is needed. The guard snapshots every state field at
//! load time and persists through a conditional write that only succeeds
//! while the stored values still match the snapshot.

use crate::core::State;
use crate::engine::StateField;
use crate::error::{DynError, FsmError};
use std::collections::HashMap;

/// State-field values of one entity at its most recent load/save boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot<S: State> {
    values: HashMap<String, S>,
}

impl<S: State> StateSnapshot<S> {
    /// Snapshot the current values of `fields` on `entity`.
    pub fn capture<E>(entity: &E, fields: &[StateField<E, S>]) -> Self {
        Self {
            values: fields
                .iter()
                .map(|field| (field.name().to_string(), field.get(entity)))
                .collect(),
        }
    }

    /// Snapshotted value of the named field.
    pub fn get(&self, field: &str) -> Option<&S> {
        self.values.get(field)
    }

    /// All snapshotted (field name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Boundary contract onto the persistence collaborator.
///
/// `write` must behave as a conditional upsert: insert when no record
/// with the entity's identity exists; update when one exists *and* every
/// snapshotted state field still holds its expected value; otherwise
/// touch nothing and report zero affected records.
pub trait ConditionalStore<E, S: State> {
    /// Persist `entity`, scoped by `expected`. Returns the number of
    /// affected records (zero means a record exists with changed state).
    fn write(&mut self, entity: &E, expected: &StateSnapshot<S>) -> Result<u64, DynError>;

    /// Does a record with this entity's identity exist in storage?
    fn exists(&self, entity: &E) -> bool;
}

/// Prevents a stale in-memory entity from silently overwriting state
/// changes persisted by another copy.
///
/// One guard belongs to one in-memory entity instance, for that
/// instance's lifetime. Capture it right after loading; persist through
/// [`ConcurrencyGuard::save`]; on [`FsmError::ConcurrentTransition`] the
/// caller is expected to reload and retry at a higher level; the guard
/// never retries on its own.
///
/// # Example
///
/// The two-copy race the guard exists for:
///
/// ```text
/// copy A: load (snapshot: new)    copy B: load (snapshot: new)
/// copy A: publish(), save()  -> stored state becomes published
/// copy B: publish(), save()  -> snapshot 'new' no longer matches
///                               -> ConcurrentTransition
/// ```
pub struct ConcurrencyGuard<E, S: State> {
    fields: Vec<StateField<E, S>>,
    snapshot: StateSnapshot<S>,
}

impl<E, S: State> ConcurrencyGuard<E, S> {
    /// Snapshot `entity`'s state fields as loaded.
    pub fn capture(entity: &E, fields: Vec<StateField<E, S>>) -> Self {
        let snapshot = StateSnapshot::capture(entity, &fields);
        Self { fields, snapshot }
    }

    /// The values the next conditional write will expect.
    pub fn snapshot(&self) -> &StateSnapshot<S> {
        &self.snapshot
    }

    /// Persist `entity` through the conditional write.
    ///
    /// Fails with [`FsmError::ConcurrentTransition`] when the write
    /// affected nothing although a record with this identity exists: the
    /// in-memory copy has gone stale. On success the snapshot is
    /// refreshed to the just-written values.
    pub fn save<St>(&mut self, entity: &E, store: &mut St) -> Result<(), FsmError>
    where
        St: ConditionalStore<E, S>,
    {
        let affected = store
            .write(entity, &self.snapshot)
            .map_err(FsmError::Storage)?;

        if affected == 0 && store.exists(entity) {
            tracing::warn!("conditional write matched nothing: entity is stale");
            return Err(FsmError::ConcurrentTransition);
        }

        self.snapshot = StateSnapshot::capture(entity, &self.fields);
        Ok(())
    }

    /// Re-snapshot after the caller reloaded the entity from storage.
    pub fn refresh(&mut self, entity: &E) {
        self.snapshot = StateSnapshot::capture(entity, &self.fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum PostState {
        New,
        Published,
        Removed,
    }

    impl State for PostState {
        fn name(&self) -> &str {
            match self {
                Self::New => "New",
                Self::Published => "Published",
                Self::Removed => "Removed",
            }
        }
    }

    #[derive(Clone)]
    struct Post {
        id: u64,
        state: PostState,
        review_state: PostState,
    }

    fn state_field() -> StateField<Post, PostState> {
        StateField::new(
            "state",
            |p: &Post| p.state.clone(),
            |p: &mut Post, s| p.state = s,
        )
    }

    fn review_field() -> StateField<Post, PostState> {
        StateField::new(
            "review_state",
            |p: &Post| p.review_state.clone(),
            |p: &mut Post, s| p.review_state = s,
        )
    }

    /// In-memory conditional store: one row of state-field values per id.
    #[derive(Default)]
    struct MemStore {
        rows: HashMap<u64, HashMap<String, PostState>>,
    }

    impl MemStore {
        fn row_for(post: &Post) -> HashMap<String, PostState> {
            [
                ("state".to_string(), post.state.clone()),
                ("review_state".to_string(), post.review_state.clone()),
            ]
            .into_iter()
            .collect()
        }

        fn stored_state(&self, id: u64) -> &PostState {
            &self.rows[&id]["state"]
        }
    }

    impl ConditionalStore<Post, PostState> for MemStore {
        fn write(
            &mut self,
            post: &Post,
            expected: &StateSnapshot<PostState>,
        ) -> Result<u64, DynError> {
            match self.rows.get_mut(&post.id) {
                None => {
                    self.rows.insert(post.id, Self::row_for(post));
                    Ok(1)
                }
                Some(row) => {
                    let matches = expected
                        .iter()
                        .all(|(name, value)| row.get(name) == Some(value));
                    if matches {
                        *row = Self::row_for(post);
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

    fn fresh_post() -> Post {
        Post {
            id: 7,
            state: PostState::New,
            review_state: PostState::New,
        }
    }

    #[test]
    fn first_save_inserts() {
        let mut store = MemStore::default();
        let post = fresh_post();
        let mut guard = ConcurrencyGuard::capture(&post, vec![state_field(), review_field()]);

        guard.save(&post, &mut store).unwrap();
        assert!(store.exists(&post));
    }

    #[test]
    fn save_after_transition_updates_and_refreshes_snapshot() {
        let mut store = MemStore::default();
        let mut post = fresh_post();
        let mut guard = ConcurrencyGuard::capture(&post, vec![state_field(), review_field()]);
        guard.save(&post, &mut store).unwrap();

        post.state = PostState::Published;
        guard.save(&post, &mut store).unwrap();
        assert_eq!(store.stored_state(post.id), &PostState::Published);

        // snapshot was refreshed, so a further change saves cleanly too
        post.state = PostState::Removed;
        guard.save(&post, &mut store).unwrap();
        assert_eq!(store.stored_state(post.id), &PostState::Removed);
    }

    #[test]
    fn stale_copy_is_rejected() {
        let mut store = MemStore::default();
        let copy_a = fresh_post();
        let mut guard_a = ConcurrencyGuard::capture(&copy_a, vec![state_field(), review_field()]);
        guard_a.save(&copy_a, &mut store).unwrap();

        // two independently loaded copies of the same stored entity
        let mut copy_a = copy_a;
        let mut copy_b = copy_a.clone();
        let mut guard_b = ConcurrencyGuard::capture(&copy_b, vec![state_field(), review_field()]);

        copy_a.state = PostState::Published;
        guard_a.save(&copy_a, &mut store).unwrap();

        copy_b.state = PostState::Published;
        let err = guard_b.save(&copy_b, &mut store).unwrap_err();
        assert!(matches!(err, FsmError::ConcurrentTransition));
        // storage keeps the first writer's state
        assert_eq!(store.stored_state(copy_b.id), &PostState::Published);
    }

    #[test]
    fn refresh_after_reload_unsticks_a_stale_guard() {
        let mut store = MemStore::default();
        let original = fresh_post();
        let mut guard_a = ConcurrencyGuard::capture(&original, vec![state_field()]);
        guard_a.save(&original, &mut store).unwrap();

        let mut winner = original.clone();
        winner.state = PostState::Published;
        guard_a.save(&winner, &mut store).unwrap();

        // the losing copy reloads and retries
        let mut loser = original.clone();
        let mut guard_b = ConcurrencyGuard::capture(&loser, vec![state_field()]);
        assert!(matches!(
            guard_b.save(&loser, &mut store),
            Err(FsmError::ConcurrentTransition)
        ));

        loser.state = store.stored_state(loser.id).clone();
        guard_b.refresh(&loser);
        loser.state = PostState::Removed;
        guard_b.save(&loser, &mut store).unwrap();
        assert_eq!(store.stored_state(loser.id), &PostState::Removed);
    }

    #[test]
    fn any_changed_state_field_counts_as_stale() {
        let mut store = MemStore::default();
        let base = fresh_post();
        let mut guard = ConcurrencyGuard::capture(&base, vec![state_field(), review_field()]);
        guard.save(&base, &mut store).unwrap();

        let mut copy_a = base.clone();
        let mut guard_a = ConcurrencyGuard::capture(&copy_a, vec![state_field(), review_field()]);
        copy_a.review_state = PostState::Removed;
        guard_a.save(&copy_a, &mut store).unwrap();

        let mut copy_b = base.clone();
        let mut guard_b = ConcurrencyGuard::capture(&copy_b, vec![state_field(), review_field()]);
        copy_b.state = PostState::Published;
        assert!(matches!(
            guard_b.save(&copy_b, &mut store),
            Err(FsmError::ConcurrentTransition)
        ));
    }

    #[test]
    fn snapshot_captures_every_field() {
        let post = fresh_post();
        let snapshot = StateSnapshot::capture(&post, &[state_field(), review_field()]);
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.get("state"), Some(&PostState::New));
        assert_eq!(snapshot.get("review_state"), Some(&PostState::New));
        assert_eq!(snapshot.get("missing"), None);
    }
}
