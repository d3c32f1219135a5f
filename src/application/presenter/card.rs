use super::registry::PresenterKey;
use super::{Presenter, PresenterCore};
use crate::application::pipeline::{DispatchHandle, TokenizationPipeline};
use crate::application::use_case::{self, Outcome, UseCase};
use crate::domain::card::CardScheme;
use crate::domain::form::Field;
use crate::domain::ports::{FormStoreRef, ProgressCallback};
use crate::domain::token::CardTokenizationRequest;
use crate::domain::validation::{FormScope, ValidationResult, Validator};
use std::sync::Arc;

pub const CARD_DETAILS: PresenterKey<CardDetailsPresenter> = PresenterKey::new("card_details");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetailsUiState {
    pub card_number: String,
    pub scheme: Option<CardScheme>,
    /// CVV length the detected scheme expects.
    pub cvv_length: usize,
    /// One-line billing address, once billing has been filled in.
    pub billing_summary: Option<String>,
    /// Present after the first pay attempt.
    pub validity: Option<ValidationResult>,
    pub in_progress: bool,
}

/// What a pay click led to.
pub enum SubmitOutcome {
    /// The form is incomplete; nothing was sent.
    Invalid(ValidationResult),
    /// A previous submission has not resolved yet; nothing was sent.
    InFlight,
    Dispatched(DispatchHandle),
}

/// Controller of the card details screen.
///
/// Register it as a progress callback of the pipeline it submits through so
/// `in_progress` is cleared when the result arrives.
pub struct CardDetailsPresenter {
    core: PresenterCore<CardDetailsUiState>,
    store: FormStoreRef,
    validator: Arc<Validator>,
}

impl CardDetailsPresenter {
    pub fn new(store: FormStoreRef, validator: Arc<Validator>) -> Self {
        let initial = CardDetailsUiState {
            card_number: String::new(),
            scheme: None,
            cvv_length: 3,
            billing_summary: None,
            validity: None,
            in_progress: false,
        };
        let presenter = Self {
            core: PresenterCore::new(initial),
            store,
            validator,
        };
        let state = presenter.recompute(&presenter.core.state());
        presenter.core.publish(state);
        presenter
    }

    pub fn card_number_changed(&self, value: &str) -> bool {
        self.field_changed(Field::CardNumber, value)
    }

    pub fn cvv_changed(&self, value: &str) -> bool {
        self.field_changed(Field::Cvv, value)
    }

    pub fn field_changed(&self, field: Field, value: &str) -> bool {
        let outcome = UseCase::FieldChanged {
            field,
            value: value.to_string(),
        }
        .execute(self.store.as_ref(), &self.validator);
        self.core.update(|current| self.recompute(current));
        outcome == Outcome::FieldChanged { accepted: true }
    }

    /// Validates the whole form and, when it is valid, hands the request to
    /// `pipeline`. Refuses while a previous submission is in flight.
    pub fn pay_clicked(&self, pipeline: &TokenizationPipeline) -> SubmitOutcome {
        if self.core.state().in_progress {
            tracing::debug!("pay clicked while a submission is in flight");
            return SubmitOutcome::InFlight;
        }

        let form = match use_case::submit_card(self.store.as_ref(), &self.validator) {
            Ok(form) => form,
            Err(result) => {
                self.core.update(|current| CardDetailsUiState {
                    validity: Some(result.clone()),
                    ..self.recompute(current)
                });
                return SubmitOutcome::Invalid(result);
            }
        };
        self.core.update(|current| CardDetailsUiState {
            validity: Some(form.validation().clone()),
            in_progress: true,
            ..self.recompute(current)
        });
        let request = CardTokenizationRequest::from_validated(&form);
        SubmitOutcome::Dispatched(pipeline.dispatch_card(request))
    }
}

impl ProgressCallback for CardDetailsPresenter {
    fn on_progress_changed(&self, in_progress: bool) {
        if self.core.state().in_progress != in_progress {
            self.core.update(|current| CardDetailsUiState {
                in_progress,
                ..current.clone()
            });
        }
    }
}

impl Presenter for CardDetailsPresenter {
    type UiState = CardDetailsUiState;

    fn core(&self) -> &PresenterCore<CardDetailsUiState> {
        &self.core
    }

    fn recompute(&self, current: &CardDetailsUiState) -> CardDetailsUiState {
        let snapshot = self.store.snapshot();
        let card_number = snapshot.get(Field::CardNumber).to_string();
        let scheme = CardScheme::detect(&card_number);
        let billing_valid = self
            .validator
            .validate(&snapshot, FormScope::Billing)
            .all_valid();
        let billing_summary = billing_valid.then(|| {
            [
                snapshot.get(Field::AddressOne),
                snapshot.get(Field::City),
                snapshot.get(Field::Postcode),
                snapshot.get(Field::Country),
            ]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
        });
        let validity = current
            .validity
            .as_ref()
            .map(|_| self.validator.validate(&snapshot, FormScope::Full));
        CardDetailsUiState {
            card_number,
            scheme,
            cvv_length: scheme.map(|s| s.cvv_length()).unwrap_or(3),
            billing_summary,
            validity,
            in_progress: current.in_progress,
        }
    }
}
