use super::registry::PresenterKey;
use super::{Presenter, PresenterCore};
use crate::application::use_case::{self, Outcome, UseCase};
use crate::domain::form::{BillingSnapshot, Field};
use crate::domain::ports::FormStoreRef;
use crate::domain::validation::{FormScope, ValidationResult, Validator};
use std::sync::Arc;

pub const BILLING_DETAILS: PresenterKey<BillingDetailsPresenter> =
    PresenterKey::new("billing_details");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetailsUiState {
    /// Country picker labels; index 0 is the placeholder.
    pub countries: Vec<String>,
    pub position: usize,
    pub billing: BillingSnapshot,
    /// Present once the user asked for validation with "done".
    pub validity: Option<ValidationResult>,
    /// The form was accepted, either by "done" or by restoring a snapshot.
    pub completed: bool,
    /// The user backed out with no valid snapshot to fall back on.
    pub canceled: bool,
}

/// How the user left the billing form through "cancel".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingExit {
    Restored(BillingSnapshot),
    Canceled,
}

/// Controller of the billing details screen.
pub struct BillingDetailsPresenter {
    core: PresenterCore<BillingDetailsUiState>,
    store: FormStoreRef,
    validator: Arc<Validator>,
}

impl BillingDetailsPresenter {
    pub fn new(store: FormStoreRef, validator: Arc<Validator>) -> Self {
        let snapshot = store.snapshot();
        let initial = BillingDetailsUiState {
            countries: validator.countries().labels(),
            position: validator.countries().position_of(snapshot.get(Field::Country)),
            billing: BillingSnapshot::capture(&snapshot),
            validity: None,
            completed: false,
            canceled: false,
        };
        Self {
            core: PresenterCore::new(initial),
            store,
            validator,
        }
    }

    fn run(&self, use_case: UseCase) -> Outcome {
        use_case.execute(self.store.as_ref(), &self.validator)
    }

    /// Re-reads the form; revalidates only if errors are already on screen.
    fn refreshed(&self, current: &BillingDetailsUiState) -> BillingDetailsUiState {
        let snapshot = self.store.snapshot();
        let validity = current
            .validity
            .as_ref()
            .map(|_| self.validator.validate(&snapshot, FormScope::Billing));
        BillingDetailsUiState {
            position: self
                .validator
                .countries()
                .position_of(snapshot.get(Field::Country)),
            billing: BillingSnapshot::capture(&snapshot),
            validity,
            ..current.clone()
        }
    }

    pub fn field_changed(&self, field: Field, value: &str) -> bool {
        let accepted = matches!(
            self.run(UseCase::FieldChanged {
                field,
                value: value.to_string(),
            }),
            Outcome::FieldChanged { accepted: true }
        );
        self.core.update(|current| BillingDetailsUiState {
            completed: false,
            canceled: false,
            ..self.refreshed(current)
        });
        accepted
    }

    pub fn country_selected(&self, position: usize) {
        self.run(UseCase::CountrySelected { position });
        self.core.update(|current| BillingDetailsUiState {
            completed: false,
            canceled: false,
            ..self.refreshed(current)
        });
    }

    pub fn done_clicked(&self) -> ValidationResult {
        let result = use_case::billing_done(self.store.as_ref(), &self.validator);
        self.core.update(|current| BillingDetailsUiState {
            validity: Some(result.clone()),
            completed: result.all_valid(),
            canceled: false,
            ..self.refreshed(current)
        });
        result
    }

    pub fn cancel_clicked(&self) -> BillingExit {
        let exit = match self.run(UseCase::BillingCanceled) {
            Outcome::BillingRestored(snapshot) => BillingExit::Restored(snapshot),
            _ => BillingExit::Canceled,
        };
        let restored = matches!(exit, BillingExit::Restored(_));
        self.core.update(|current| BillingDetailsUiState {
            validity: None,
            completed: restored,
            canceled: !restored,
            ..self.refreshed(current)
        });
        exit
    }

    pub fn clear_clicked(&self) {
        self.run(UseCase::BillingCleared);
        self.core.update(|current| BillingDetailsUiState {
            validity: None,
            completed: false,
            canceled: false,
            ..self.refreshed(current)
        });
    }

    /// Resets the exit flags when the screen is shown again.
    pub fn begin_editing(&self) {
        self.core.update(|current| BillingDetailsUiState {
            completed: false,
            canceled: false,
            ..self.refreshed(current)
        });
    }
}

impl Presenter for BillingDetailsPresenter {
    type UiState = BillingDetailsUiState;

    fn core(&self) -> &PresenterCore<BillingDetailsUiState> {
        &self.core
    }

    fn recompute(&self, current: &BillingDetailsUiState) -> BillingDetailsUiState {
        self.refreshed(current)
    }
}
