//! Pure validation of form snapshots.
//!
//! Nothing in here mutates state or performs I/O: the same [`FormState`]
//! validated against the same [`Validator`] always yields an identical
//! [`ValidationResult`].

use super::card::{CardScheme, luhn_valid};
use super::country::CountryList;
use super::form::{Field, FormState};
use chrono::Datelike;
use serde::Serialize;

/// Number of years ahead of the reference year a card expiry may be.
pub const EXPIRY_YEAR_SPAN: i32 = 20;

/// A calendar month, used as the reference point for expiry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        let today = chrono::Utc::now().date_naive();
        Self::new(today.year(), today.month())
    }
}

/// The subset of fields a screen validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormScope {
    Card,
    Billing,
    Full,
}

impl FormScope {
    pub fn fields(&self) -> &'static [Field] {
        match self {
            FormScope::Card => &Field::CARD,
            FormScope::Billing => &Field::BILLING,
            FormScope::Full => &Field::ALL,
        }
    }
}

/// Immutable per-field validity for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    scope: FormScope,
    flags: Vec<(Field, bool)>,
    all_valid: bool,
}

impl ValidationResult {
    /// Builds a result from explicit flags; `all_valid` is derived.
    pub(crate) fn from_flags(
        scope: FormScope,
        flags: impl IntoIterator<Item = (Field, bool)>,
    ) -> Self {
        let flags: Vec<(Field, bool)> = flags.into_iter().collect();
        let all_valid = flags.iter().all(|(_, valid)| *valid);
        Self {
            scope,
            flags,
            all_valid,
        }
    }

    pub fn scope(&self) -> FormScope {
        self.scope
    }

    pub fn all_valid(&self) -> bool {
        self.all_valid
    }

    /// Validity of one field, or `None` if the field is not in this result.
    pub fn field(&self, field: Field) -> Option<bool> {
        self.flags
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, valid)| *valid)
    }

    /// True when the field is in scope and valid.
    pub fn is_valid(&self, field: Field) -> bool {
        self.field(field).unwrap_or(false)
    }

    pub fn flags(&self) -> &[(Field, bool)] {
        &self.flags
    }

    pub fn invalid_fields(&self) -> Vec<Field> {
        self.flags
            .iter()
            .filter(|(_, valid)| !valid)
            .map(|(field, _)| *field)
            .collect()
    }
}

/// A form snapshot that passed full validation.
///
/// Only [`Validator::validate_for_submission`] can produce one, so a
/// tokenization request can never be built from an invalid form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    state: FormState,
    scheme: CardScheme,
    validation: ValidationResult,
}

impl ValidatedForm {
    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn scheme(&self) -> CardScheme {
        self.scheme
    }

    /// The full-scope result the form passed.
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }
}

/// Stateless rule set. Holds only its inputs: the reference month for
/// expiry checks and the selectable countries.
#[derive(Debug, Clone)]
pub struct Validator {
    reference: YearMonth,
    countries: CountryList,
}

impl Validator {
    pub fn new(reference: YearMonth, countries: CountryList) -> Self {
        Self {
            reference,
            countries,
        }
    }

    pub fn reference(&self) -> YearMonth {
        self.reference
    }

    pub fn countries(&self) -> &CountryList {
        &self.countries
    }

    pub fn validate(&self, state: &FormState, scope: FormScope) -> ValidationResult {
        ValidationResult::from_flags(
            scope,
            scope
                .fields()
                .iter()
                .map(|field| (*field, self.field_valid(*field, state))),
        )
    }

    /// Validates the whole form and, on success, hands back the witness
    /// required to build a tokenization request.
    pub fn validate_for_submission(
        &self,
        state: &FormState,
    ) -> Result<ValidatedForm, ValidationResult> {
        let result = self.validate(state, FormScope::Full);
        match CardScheme::detect(state.get(Field::CardNumber)) {
            Some(scheme) if result.all_valid() => Ok(ValidatedForm {
                state: state.clone(),
                scheme,
                validation: result,
            }),
            _ => Err(result),
        }
    }

    pub fn field_valid(&self, field: Field, state: &FormState) -> bool {
        let value = state.get(field);
        match field {
            Field::CardNumber => card_number_valid(value),
            Field::ExpiryMonth => parse_month(value).is_some(),
            Field::ExpiryYear => self.expiry_year_valid(value, state.get(Field::ExpiryMonth)),
            Field::Cvv => cvv_valid(value, CardScheme::detect(state.get(Field::CardNumber))),
            Field::Country => !value.is_empty() && self.countries.by_code(value).is_some(),
            Field::PhoneCountryCode | Field::PhoneNumber => {
                !state.get(Field::PhoneCountryCode).trim().is_empty()
                    && !state.get(Field::PhoneNumber).trim().is_empty()
            }
            // Second address line is optional.
            Field::AddressTwo => true,
            Field::Name | Field::AddressOne | Field::City | Field::State | Field::Postcode => {
                !value.trim().is_empty()
            }
        }
    }

    fn expiry_year_valid(&self, year: &str, month: &str) -> bool {
        if year.len() != 4 {
            return false;
        }
        let Ok(year) = year.parse::<i32>() else {
            return false;
        };
        let earliest = self.reference.year;
        if !(earliest..=earliest + EXPIRY_YEAR_SPAN).contains(&year) {
            return false;
        }
        match parse_month(month) {
            Some(month) if year == self.reference.year => month >= self.reference.month,
            _ => true,
        }
    }
}

/// Parses an expiry month, accepting only 1 through 12.
pub fn parse_month(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .map(|m| m as u32)
}

fn card_number_valid(number: &str) -> bool {
    match CardScheme::detect(number) {
        Some(scheme) => scheme.valid_lengths().contains(&number.len()) && luhn_valid(number),
        None => false,
    }
}

fn cvv_valid(cvv: &str, scheme: Option<CardScheme>) -> bool {
    if !cvv.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match scheme {
        Some(scheme) => cvv.len() == scheme.cvv_length(),
        None => cvv.len() == 3 || cvv.len() == 4,
    }
}
