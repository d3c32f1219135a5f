use crate::domain::form::{BillingSnapshot, Field, FormState, normalize};
use crate::domain::ports::FormStore;
use crate::domain::validation::{FormScope, ValidationResult, Validator};
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    state: FormState,
    last_valid_billing: Option<BillingSnapshot>,
}

/// A thread-safe in-memory form store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same form: every presenter and
/// the request pipeline see one `FormState` for the embedding session.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFormStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryFormStore {
    /// Creates a new store with every field empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `state`, bypassing normalization.
    pub fn with_state(state: FormState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state,
                last_valid_billing: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FormStore for InMemoryFormStore {
    fn get(&self, field: Field) -> String {
        self.read().state.get(field).to_string()
    }

    fn set(&self, field: Field, value: &str) -> Result<()> {
        let normalized = normalize(field, value).inspect_err(|e| {
            tracing::debug!(%field, error = %e, "rejected form value");
        })?;
        self.write().state.put(field, normalized);
        Ok(())
    }

    fn snapshot(&self) -> FormState {
        self.read().state.clone()
    }

    fn clear(&self, fields: &[Field]) {
        self.write().state.clear(fields);
    }

    fn commit_billing(&self, validator: &Validator) -> ValidationResult {
        let mut inner = self.write();
        let result = validator.validate(&inner.state, FormScope::Billing);
        if result.all_valid() {
            inner.last_valid_billing = Some(BillingSnapshot::capture(&inner.state));
            tracing::debug!("billing snapshot committed");
        }
        result
    }

    fn last_valid_billing(&self) -> Option<BillingSnapshot> {
        self.read().last_valid_billing.clone()
    }

    fn restore_billing(&self) -> Option<BillingSnapshot> {
        let mut inner = self.write();
        let snapshot = inner.last_valid_billing.clone()?;
        snapshot.restore_into(&mut inner.state);
        tracing::debug!("billing snapshot restored");
        Some(snapshot)
    }

    fn reset(&self) {
        *self.write() = Inner::default();
    }
}
