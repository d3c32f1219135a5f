use crate::domain::form::{BillingSnapshot, Field};
use crate::domain::ports::FormStore;
use crate::domain::validation::{ValidatedForm, ValidationResult, Validator};

/// Number of selectable years in the expiry year picker.
pub const YEAR_PICKER_SPAN: usize = 21;

/// Every atomic form operation.
///
/// Use-cases are synchronous, perform no I/O and never fail on bad user
/// input: invalidity shows up in the returned [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseCase {
    FieldChanged { field: Field, value: String },
    CountrySelected { position: usize },
    MonthSelected { position: usize },
    YearSelected { position: usize },
    SubmitCard,
    BillingDone,
    BillingCanceled,
    BillingCleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `accepted` is false when normalization rejected the value.
    FieldChanged { accepted: bool },
    /// Country code now in the store, `None` for the placeholder.
    CountrySelected { code: Option<String> },
    /// Normalized month or year, `None` for the placeholder.
    DateSelected { value: Option<String> },
    Validated(ValidationResult),
    BillingRestored(BillingSnapshot),
    BillingCanceled,
    BillingCleared,
}

impl UseCase {
    pub fn execute(self, store: &dyn FormStore, validator: &Validator) -> Outcome {
        match self {
            UseCase::FieldChanged { field, value } => Outcome::FieldChanged {
                accepted: store.set(field, &value).is_ok(),
            },
            UseCase::CountrySelected { position } => {
                let Some(country) = validator.countries().at(position) else {
                    store.clear(&[Field::Country, Field::PhoneCountryCode]);
                    return Outcome::CountrySelected { code: None };
                };
                write_known(store, Field::Country, country.code);
                write_known(store, Field::PhoneCountryCode, country.dialing_code);
                Outcome::CountrySelected {
                    code: Some(country.code.to_string()),
                }
            }
            UseCase::MonthSelected { position } => {
                let value = month_for_position(position);
                select(store, Field::ExpiryMonth, value)
            }
            UseCase::YearSelected { position } => {
                let value = year_for_position(validator, position);
                select(store, Field::ExpiryYear, value)
            }
            UseCase::SubmitCard => Outcome::Validated(match submit_card(store, validator) {
                Ok(form) => form.validation().clone(),
                Err(result) => result,
            }),
            UseCase::BillingDone => Outcome::Validated(billing_done(store, validator)),
            UseCase::BillingCanceled => match store.restore_billing() {
                Some(snapshot) => Outcome::BillingRestored(snapshot),
                None => Outcome::BillingCanceled,
            },
            UseCase::BillingCleared => {
                store.clear(&Field::BILLING);
                Outcome::BillingCleared
            }
        }
    }
}

/// Validates the full form for submission. `Ok` carries the witness the
/// request pipeline accepts; `Err` the result to display.
pub fn submit_card(
    store: &dyn FormStore,
    validator: &Validator,
) -> Result<ValidatedForm, ValidationResult> {
    validator.validate_for_submission(&store.snapshot())
}

/// Validates the billing scope and commits the snapshot when it passes.
pub fn billing_done(store: &dyn FormStore, validator: &Validator) -> ValidationResult {
    store.commit_billing(validator)
}

/// Month picker entry: position 0 is the placeholder, 1..=12 the months.
pub fn month_for_position(position: usize) -> Option<String> {
    (1..=12)
        .contains(&position)
        .then(|| format!("{position:02}"))
}

/// Year picker entry: position 0 is the placeholder, then the reference year
/// and the following years.
pub fn year_for_position(validator: &Validator, position: usize) -> Option<String> {
    if position == 0 || position > YEAR_PICKER_SPAN {
        return None;
    }
    Some((validator.reference().year + position as i32 - 1).to_string())
}

fn select(store: &dyn FormStore, field: Field, value: Option<String>) -> Outcome {
    match value {
        Some(value) => {
            write_known(store, field, &value);
            Outcome::DateSelected { value: Some(value) }
        }
        None => {
            store.clear(&[field]);
            Outcome::DateSelected { value: None }
        }
    }
}

// Values produced here always normalize; a failure would be a defect.
fn write_known(store: &dyn FormStore, field: Field, value: &str) {
    if let Err(e) = store.set(field, value) {
        tracing::error!(%field, error = %e, "generated value rejected by store");
    }
}
