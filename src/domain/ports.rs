use super::form::{BillingSnapshot, Field, FormState};
use super::token::{
    CardTokenizationRequest, RawResponse, TokenResult, TransportError, WalletTokenizationRequest,
};
use super::validation::{ValidationResult, Validator};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The shared form store.
///
/// Writes go through field normalization; a value that fails it is rejected
/// and the stored value is left untouched. Writes never trigger validation.
pub trait FormStore: Send + Sync {
    fn get(&self, field: Field) -> String;
    fn set(&self, field: Field, value: &str) -> Result<()>;
    fn snapshot(&self) -> FormState;
    /// Resets the given fields to the empty sentinel.
    fn clear(&self, fields: &[Field]);
    /// Validates the billing scope of the current form and, only when every
    /// billing field passes, captures it as the last valid snapshot. Both
    /// happen against the same state.
    fn commit_billing(&self, validator: &Validator) -> ValidationResult;
    fn last_valid_billing(&self) -> Option<BillingSnapshot>;
    /// Writes the last valid snapshot back into the form.
    fn restore_billing(&self) -> Option<BillingSnapshot>;
    /// Empties every field and drops the snapshot.
    fn reset(&self);
}

pub type FormStoreRef = Arc<dyn FormStore>;

/// Remote tokenization endpoint, as seen by the request pipeline.
///
/// `Ok` means a response was received, whatever its status. `Err` means no
/// usable response was obtained.
#[async_trait]
pub trait TokenTransport: Send + Sync {
    async fn submit_card(
        &self,
        api_key: &str,
        request: &CardTokenizationRequest,
    ) -> std::result::Result<RawResponse, TransportError>;

    async fn submit_wallet(
        &self,
        api_key: &str,
        request: &WalletTokenizationRequest,
    ) -> std::result::Result<RawResponse, TransportError>;
}

pub type TokenTransportRef = Arc<dyn TokenTransport>;

/// Receives exactly one result per submission.
pub trait TokenCallback: Send + Sync {
    fn on_token_result(&self, result: TokenResult);
}

impl<F> TokenCallback for F
where
    F: Fn(TokenResult) + Send + Sync,
{
    fn on_token_result(&self, result: TokenResult) {
        self(result)
    }
}

/// Raised with `true` before a dispatch, `false` once it has resolved.
pub trait ProgressCallback: Send + Sync {
    fn on_progress_changed(&self, in_progress: bool);
}

impl<F> ProgressCallback for F
where
    F: Fn(bool) + Send + Sync,
{
    fn on_progress_changed(&self, in_progress: bool) {
        self(in_progress)
    }
}

/// Notified with the normalized value once a field's input is complete,
/// e.g. a month picked from the month picker.
pub trait FieldCompletionListener: Send + Sync {
    fn on_field_completed(&self, field: Field, value: &str);
}

impl<F> FieldCompletionListener for F
where
    F: Fn(Field, &str) + Send + Sync,
{
    fn on_field_completed(&self, field: Field, value: &str) {
        self(field, value)
    }
}
