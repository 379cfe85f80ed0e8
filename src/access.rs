//! Access evaluation for permission-guarded transitions.
//!
//! A transition may carry a [`Permission`]: either a predicate callback or a
//! named permission resolved through the [`Actor`] boundary trait. The
//! access-control subsystem itself lives outside this crate; only its
//! contract is defined here.

use std::sync::Arc;

/// Boundary contract onto the external access-control subsystem.
///
/// Implementors answer whether the subject holds a named permission, either
/// scoped to one entity (`entity = Some(..)`) or globally (`entity = None`).
pub trait Actor<E> {
    /// Does this subject hold `permission`, at the given scope?
    fn has_perm(&self, permission: &str, entity: Option<&E>) -> bool;
}

/// Access requirement attached to a transition.
pub enum Permission<E> {
    /// Arbitrary predicate over (entity, actor).
    Check(Arc<dyn Fn(&E, &dyn Actor<E>) -> bool + Send + Sync>),
    /// Named permission resolved through the actor, first at entity scope,
    /// then at global scope. Either grant satisfies the requirement.
    Named(String),
}

impl<E> Permission<E> {
    /// Build a callback permission from a closure.
    pub fn check<F>(predicate: F) -> Self
    where
        F: Fn(&E, &dyn Actor<E>) -> bool + Send + Sync + 'static,
    {
        Permission::Check(Arc::new(predicate))
    }

    /// Build a named permission.
    pub fn named(permission: impl Into<String>) -> Self {
        Permission::Named(permission.into())
    }

    /// Evaluate whether `actor` may invoke the transition on `entity`.
    pub fn grants(&self, entity: &E, actor: &dyn Actor<E>) -> bool {
        match self {
            Permission::Check(predicate) => predicate(entity, actor),
            Permission::Named(name) => {
                actor.has_perm(name, Some(entity)) || actor.has_perm(name, None)
            }
        }
    }
}

impl<E> Clone for Permission<E> {
    fn clone(&self) -> Self {
        match self {
            Permission::Check(p) => Permission::Check(Arc::clone(p)),
            Permission::Named(n) => Permission::Named(n.clone()),
        }
    }
}

impl<E> std::fmt::Debug for Permission<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Check(_) => f.write_str("Permission::Check(..)"),
            Permission::Named(n) => write!(f, "Permission::Named({n:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Post {
        author: &'static str,
    }

    /// Test double resolving named grants from two flat sets.
    struct Grants {
        global: HashSet<&'static str>,
        on_object: HashSet<&'static str>,
    }

    impl Actor<Post> for Grants {
        fn has_perm(&self, permission: &str, entity: Option<&Post>) -> bool {
            match entity {
                Some(_) => self.on_object.contains(permission),
                None => self.global.contains(permission),
            }
        }
    }

    fn moderator() -> Grants {
        Grants {
            global: ["posts.remove"].into_iter().collect(),
            on_object: HashSet::new(),
        }
    }

    #[test]
    fn named_permission_checks_global_scope() {
        let perm = Permission::named("posts.remove");
        let post = Post { author: "alice" };
        assert!(perm.grants(&post, &moderator()));
    }

    #[test]
    fn named_permission_checks_object_scope_first() {
        let perm = Permission::<Post>::named("posts.edit");
        let actor = Grants {
            global: HashSet::new(),
            on_object: ["posts.edit"].into_iter().collect(),
        };
        assert!(perm.grants(&Post { author: "bob" }, &actor));
    }

    #[test]
    fn missing_grant_denies() {
        let perm = Permission::<Post>::named("posts.publish");
        assert!(!perm.grants(&Post { author: "eve" }, &moderator()));
    }

    #[test]
    fn callback_permission_sees_entity_and_actor() {
        let perm = Permission::check(|post: &Post, actor: &dyn Actor<Post>| {
            post.author == "mod" || actor.has_perm("posts.remove", None)
        });
        assert!(perm.grants(&Post { author: "alice" }, &moderator()));
    }
}
