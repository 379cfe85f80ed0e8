//! Accessor onto an entity's governed state field.

use crate::core::State;
use std::collections::HashMap;
use std::sync::Arc;

type Getter<E, S> = Arc<dyn Fn(&E) -> S + Send + Sync>;
type Setter<E, S> = Arc<dyn Fn(&mut E, S) + Send + Sync>;
type VariantHook<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Named accessor for one state field of an entity type.
///
/// The engine never touches entity struct fields directly; it reads and
/// writes through the closures captured here. A field may also carry
/// state-keyed variant hooks (type specialization): after a transition
/// resolves its target, the hook registered for that state runs before
/// the field itself is written, re-binding whichever behavior-set the
/// entity exposes per state.
///
/// # Example
///
/// ```rust
/// use stateflow::engine::StateField;
///
/// struct Post {
///     state: String,
/// }
///
/// let field = StateField::new(
///     "state",
///     |post: &Post| post.state.clone(),
///     |post: &mut Post, state| post.state = state,
/// );
///
/// let mut post = Post { state: "new".to_string() };
/// assert_eq!(field.get(&post), "new");
/// field.set(&mut post, "published".to_string());
/// assert_eq!(post.state, "published");
/// ```
pub struct StateField<E, S: State> {
    name: String,
    get: Getter<E, S>,
    set: Setter<E, S>,
    variants: HashMap<S, VariantHook<E>>,
}

impl<E, S: State> StateField<E, S> {
    /// Create an accessor for the field called `name`.
    pub fn new<G, T>(name: impl Into<String>, get: G, set: T) -> Self
    where
        G: Fn(&E) -> S + Send + Sync + 'static,
        T: Fn(&mut E, S) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(get),
            set: Arc::new(set),
            variants: HashMap::new(),
        }
    }

    /// Register a variant hook applied whenever the field enters `state`.
    pub fn with_variant<F>(mut self, state: S, hook: F) -> Self
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.variants.insert(state, Arc::new(hook));
        self
    }

    /// Name of the governed field, as used in snapshots and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value of the field.
    pub fn get(&self, entity: &E) -> S {
        (self.get)(entity)
    }

    /// Write the field. Prefer going through the engine; this is the raw
    /// accessor the engine itself uses.
    pub fn set(&self, entity: &mut E, state: S) {
        (self.set)(entity, state)
    }

    /// Apply the variant hook registered for `state`, if any.
    pub fn specialize(&self, entity: &mut E, state: &S) {
        if let Some(hook) = self.variants.get(state) {
            tracing::debug!(field = %self.name, state = state.name(), "applying state variant");
            hook(entity);
        }
    }
}

impl<E, S: State> Clone for StateField<E, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
            variants: self.variants.clone(),
        }
    }
}
