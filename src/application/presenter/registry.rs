use crate::error::{CheckoutError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Stable id of a presenter slot, typed with the presenter stored there.
pub struct PresenterKey<P> {
    id: &'static str,
    _presenter: PhantomData<fn() -> P>,
}

impl<P> PresenterKey<P> {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _presenter: PhantomData,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }
}

impl<P> Clone for PresenterKey<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PresenterKey<P> {}

impl<P> fmt::Debug for PresenterKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PresenterKey").field(&self.id).finish()
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Keeps presenters alive across view recreation.
///
/// Entries are never evicted on their own; [`clear`](Self::clear) at the end
/// of the checkout flow is the only way out.
#[derive(Default)]
pub struct PresenterRegistry {
    entries: Mutex<HashMap<&'static str, Entry>>,
}

impl PresenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the presenter stored under `key`, building it with `factory`
    /// the first time.
    ///
    /// The factory runs without the registry lock held, so it may itself
    /// look up other presenters.
    pub fn get_or_create<P, F>(&self, key: PresenterKey<P>, factory: F) -> Result<Arc<P>>
    where
        P: Send + Sync + 'static,
        F: FnOnce() -> P,
    {
        if let Some(existing) = self.lock().get(key.id).cloned() {
            return downcast(key, existing);
        }

        let created: Entry = Arc::new(factory());
        let entry = Arc::clone(self.lock().entry(key.id).or_insert_with(|| {
            tracing::debug!(presenter = key.id, "presenter created");
            created
        }));
        downcast(key, entry)
    }

    pub fn get<P: Send + Sync + 'static>(&self, key: PresenterKey<P>) -> Option<Arc<P>> {
        let entry = self.lock().get(key.id).cloned()?;
        downcast(key, entry).ok()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every presenter. Views still holding an `Arc` keep theirs alive,
    /// but the next lookup builds a fresh one.
    pub fn clear(&self) {
        let mut entries = self.lock();
        tracing::debug!(count = entries.len(), "presenter registry cleared");
        entries.clear();
    }
}

fn downcast<P: Send + Sync + 'static>(key: PresenterKey<P>, entry: Entry) -> Result<Arc<P>> {
    entry
        .downcast::<P>()
        .map_err(|_| CheckoutError::PresenterTypeMismatch(key.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    const FIRST: PresenterKey<Counter> = PresenterKey::new("first");
    const SECOND: PresenterKey<Counter> = PresenterKey::new("second");

    #[test]
    fn test_same_key_same_instance() {
        let registry = PresenterRegistry::new();
        let a = registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(0)))
            .unwrap();
        a.0.fetch_add(1, Ordering::SeqCst);
        let b = registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(100)))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_keys_distinct_instances() {
        let registry = PresenterRegistry::new();
        let a = registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(0)))
            .unwrap();
        let b = registry
            .get_or_create(SECOND, || Counter(AtomicUsize::new(0)))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_forces_recreation() {
        let registry = PresenterRegistry::new();
        let a = registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(0)))
            .unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(FIRST).is_none());
        let b = registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(0)))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let registry = PresenterRegistry::new();
        registry
            .get_or_create(FIRST, || Counter(AtomicUsize::new(0)))
            .unwrap();
        let clash: PresenterKey<String> = PresenterKey::new("first");
        assert!(matches!(
            registry.get_or_create(clash, String::new),
            Err(CheckoutError::PresenterTypeMismatch("first"))
        ));
    }

    #[test]
    fn test_factory_may_use_registry() {
        let registry = PresenterRegistry::new();
        let outer = registry
            .get_or_create(FIRST, || {
                let inner = registry
                    .get_or_create(SECOND, || Counter(AtomicUsize::new(7)))
                    .unwrap();
                Counter(AtomicUsize::new(inner.0.load(Ordering::SeqCst)))
            })
            .unwrap();
        assert_eq!(outer.0.load(Ordering::SeqCst), 7);
        assert!(registry.contains("second"));
    }
}
