//! Callable identity.
//!
//! Registries key all per-callable state by [`Target`] identity. Identity
//! is the allocation address of the shared callable, never its behavior:
//! two `Target::new` calls over byte-identical closures produce two
//! independent keys, while clones of one `Target` share a key. Closures are
//! not hashable by value, so identity collapses onto the `Arc` allocation
//! address.

use crate::domain::value::ArgValue;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe callable shape shared by all strategies.
///
/// Deduplicated targets receive the merged repeat count as their first
/// argument; all other strategies forward the caller's arguments verbatim.
pub type TargetFn = dyn Fn(&[ArgValue]) + Send + Sync + 'static;

/// A target function with reference identity.
///
/// # Examples
///
/// ```
/// use performer::Target;
///
/// let a = Target::new(|_args| {});
/// let b = Target::new(|_args| {});
/// let a2 = a.clone();
///
/// assert_ne!(a, b); // distinct bindings, distinct identity
/// assert_eq!(a, a2); // clones share identity
/// ```
#[derive(Clone)]
pub struct Target {
    f: Arc<TargetFn>,
}

impl Target {
    /// Wrap a callable, giving it a fresh identity.
    pub fn new(f: impl Fn(&[ArgValue]) + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Invoke the underlying callable.
    pub fn invoke(&self, arguments: &[ArgValue]) {
        (self.f)(arguments);
    }

    // Thin address of the Arc allocation; stable for the life of the
    // callable because every clone holds the allocation alive.
    fn key(&self) -> usize {
        Arc::as_ptr(&self.f) as *const () as usize
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Target {}

impl Hash for Target {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:#x})", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_distinct_bindings_distinct_identity() {
        let a = Target::new(|_| {});
        let b = Target::new(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_shares_identity() {
        let a = Target::new(|_| {});
        let a2 = a.clone();
        assert_eq!(a, a2);

        let mut map = HashMap::new();
        map.insert(a, 1);
        assert_eq!(map.get(&a2), Some(&1));
    }

    #[test]
    fn test_invoke_forwards_arguments() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let target = Target::new(move |args| {
            assert_eq!(args.len(), 2);
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        target.invoke(&crate::args![1, 2]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_sized_closures_distinct() {
        // Captureless closures are zero-sized; Arc still allocates an
        // inner block per Target, so identities never collide.
        fn noop(_: &[ArgValue]) {}
        let a = Target::new(noop);
        let b = Target::new(noop);
        assert_ne!(a, b);
    }
}
