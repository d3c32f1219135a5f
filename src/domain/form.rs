use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TEXT_LEN: usize = 255;

/// Identifies one entry of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CardNumber,
    ExpiryMonth,
    ExpiryYear,
    Cvv,
    Name,
    AddressOne,
    AddressTwo,
    City,
    State,
    Postcode,
    Country,
    PhoneCountryCode,
    PhoneNumber,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::CardNumber,
        Field::ExpiryMonth,
        Field::ExpiryYear,
        Field::Cvv,
        Field::Name,
        Field::AddressOne,
        Field::AddressTwo,
        Field::City,
        Field::State,
        Field::Postcode,
        Field::Country,
        Field::PhoneCountryCode,
        Field::PhoneNumber,
    ];

    pub const CARD: [Field; 4] = [
        Field::CardNumber,
        Field::ExpiryMonth,
        Field::ExpiryYear,
        Field::Cvv,
    ];

    pub const BILLING: [Field; 9] = [
        Field::Name,
        Field::AddressOne,
        Field::AddressTwo,
        Field::City,
        Field::State,
        Field::Postcode,
        Field::Country,
        Field::PhoneCountryCode,
        Field::PhoneNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CardNumber => "card_number",
            Field::ExpiryMonth => "expiry_month",
            Field::ExpiryYear => "expiry_year",
            Field::Cvv => "cvv",
            Field::Name => "name",
            Field::AddressOne => "address_one",
            Field::AddressTwo => "address_two",
            Field::City => "city",
            Field::State => "state",
            Field::Postcode => "postcode",
            Field::Country => "country",
            Field::PhoneCountryCode => "phone_country_code",
            Field::PhoneNumber => "phone_number",
        }
    }

    /// Whether the raw value of this field must never reach the logs.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Field::CardNumber | Field::Cvv)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current raw values of every form field.
///
/// Every field is always present: an empty string is the "no value" sentinel.
/// `FormState` itself performs no normalization, it is a plain value; the
/// [`FormStore`](crate::domain::ports::FormStore) is the gatekeeper that only
/// lets normalized values in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    card_number: String,
    expiry_month: String,
    expiry_year: String,
    cvv: String,
    name: String,
    address_one: String,
    address_two: String,
    city: String,
    state: String,
    postcode: String,
    country: String,
    phone_country_code: String,
    phone_number: String,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        self.slot(field)
    }

    /// Builder-style setter. Stores the value as given.
    pub fn with_value(mut self, field: Field, value: impl Into<String>) -> Self {
        self.put(field, value.into());
        self
    }

    pub(crate) fn put(&mut self, field: Field, value: String) {
        *self.slot_mut(field) = value;
    }

    /// Resets the given fields to the empty sentinel.
    pub(crate) fn clear(&mut self, fields: &[Field]) {
        for field in fields {
            self.slot_mut(*field).clear();
        }
    }

    fn slot(&self, field: Field) -> &String {
        match field {
            Field::CardNumber => &self.card_number,
            Field::ExpiryMonth => &self.expiry_month,
            Field::ExpiryYear => &self.expiry_year,
            Field::Cvv => &self.cvv,
            Field::Name => &self.name,
            Field::AddressOne => &self.address_one,
            Field::AddressTwo => &self.address_two,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Postcode => &self.postcode,
            Field::Country => &self.country,
            Field::PhoneCountryCode => &self.phone_country_code,
            Field::PhoneNumber => &self.phone_number,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::CardNumber => &mut self.card_number,
            Field::ExpiryMonth => &mut self.expiry_month,
            Field::ExpiryYear => &mut self.expiry_year,
            Field::Cvv => &mut self.cvv,
            Field::Name => &mut self.name,
            Field::AddressOne => &mut self.address_one,
            Field::AddressTwo => &mut self.address_two,
            Field::City => &mut self.city,
            Field::State => &mut self.state,
            Field::Postcode => &mut self.postcode,
            Field::Country => &mut self.country,
            Field::PhoneCountryCode => &mut self.phone_country_code,
            Field::PhoneNumber => &mut self.phone_number,
        }
    }
}

/// Copy of the billing fields taken the last time the billing form was valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub name: String,
    pub address_one: String,
    pub address_two: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub phone_country_code: String,
    pub phone_number: String,
}

impl BillingSnapshot {
    pub fn capture(state: &FormState) -> Self {
        Self {
            name: state.name.clone(),
            address_one: state.address_one.clone(),
            address_two: state.address_two.clone(),
            city: state.city.clone(),
            state: state.state.clone(),
            postcode: state.postcode.clone(),
            country: state.country.clone(),
            phone_country_code: state.phone_country_code.clone(),
            phone_number: state.phone_number.clone(),
        }
    }

    /// Writes every captured field back, verbatim.
    pub fn restore_into(&self, state: &mut FormState) {
        state.name = self.name.clone();
        state.address_one = self.address_one.clone();
        state.address_two = self.address_two.clone();
        state.city = self.city.clone();
        state.state = self.state.clone();
        state.postcode = self.postcode.clone();
        state.country = self.country.clone();
        state.phone_country_code = self.phone_country_code.clone();
        state.phone_number = self.phone_number.clone();
    }
}

/// Applies the field-level normalization that must succeed before a value
/// may be written to the shared store.
pub fn normalize(field: Field, raw: &str) -> Result<String> {
    match field {
        Field::CardNumber => digits_with_separators(field, raw, &[' ', '-'], 19),
        Field::ExpiryMonth => digits_only(field, raw, 2),
        Field::ExpiryYear => digits_only(field, raw, 4),
        Field::Cvv => digits_only(field, raw, 4),
        Field::PhoneNumber => digits_with_separators(field, raw, &[' ', '-', '(', ')'], 15),
        Field::PhoneCountryCode => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(String::new());
            }
            let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
            if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit())
            {
                return Err(CheckoutError::rejected(field, "expected '+' followed by 1-4 digits"));
            }
            Ok(format!("+{digits}"))
        }
        Field::Country => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(String::new());
            }
            if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CheckoutError::rejected(field, "expected a two-letter country code"));
            }
            Ok(trimmed.to_ascii_uppercase())
        }
        Field::Name
        | Field::AddressOne
        | Field::AddressTwo
        | Field::City
        | Field::State
        | Field::Postcode => {
            if raw.chars().any(char::is_control) {
                return Err(CheckoutError::rejected(field, "control characters are not allowed"));
            }
            if raw.chars().count() > MAX_TEXT_LEN {
                return Err(CheckoutError::rejected(
                    field,
                    format!("longer than {MAX_TEXT_LEN} characters"),
                ));
            }
            Ok(raw.to_string())
        }
    }
}

fn digits_only(field: Field, raw: &str, max_len: usize) -> Result<String> {
    let trimmed = raw.trim();
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(CheckoutError::rejected(field, "only digits are allowed"));
    }
    if trimmed.len() > max_len {
        return Err(CheckoutError::rejected(
            field,
            format!("more than {max_len} digits"),
        ));
    }
    Ok(trimmed.to_string())
}

fn digits_with_separators(
    field: Field,
    raw: &str,
    separators: &[char],
    max_len: usize,
) -> Result<String> {
    let mut digits = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !separators.contains(&c) {
            return Err(CheckoutError::rejected(field, format!("unexpected character '{c}'")));
        }
    }
    if digits.len() > max_len {
        return Err(CheckoutError::rejected(
            field,
            format!("more than {max_len} digits"),
        ));
    }
    Ok(digits)
}
