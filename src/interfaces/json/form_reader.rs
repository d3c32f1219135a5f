use crate::application::use_case::UseCase;
use crate::domain::country::CountryList;
use crate::domain::form::Field;
use crate::domain::token::GooglePayTokenData;
use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// A checkout form as supplied by the host, keyed by field name.
///
/// ```json
/// { "form": { "card_number": "4242 4242 4242 4242", "country": "GB" },
///   "google_pay": null }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDocument {
    #[serde(default)]
    pub form: BTreeMap<Field, String>,
    /// When present, the wallet path is taken instead of the card form.
    #[serde(default)]
    pub google_pay: Option<GooglePayTokenData>,
}

impl FormDocument {
    /// Replays the document as the use-cases a user would have triggered.
    ///
    /// A known country code becomes a picker selection, which also fills in
    /// the dialing code; an explicit phone country code in the document is
    /// applied afterwards and wins.
    pub fn use_cases(&self, countries: &CountryList) -> Vec<UseCase> {
        let mut use_cases = Vec::with_capacity(self.form.len());
        if let Some(code) = self.form.get(&Field::Country) {
            let position = countries.position_of(&code.trim().to_ascii_uppercase());
            if position != CountryList::PLACEHOLDER_POSITION {
                use_cases.push(UseCase::CountrySelected { position });
            } else {
                tracing::warn!(code = code.as_str(), "unknown country code in form");
                use_cases.push(UseCase::FieldChanged {
                    field: Field::Country,
                    value: code.clone(),
                });
            }
        }
        use_cases.extend(
            self.form
                .iter()
                .filter(|(field, _)| **field != Field::Country)
                .map(|(field, value)| UseCase::FieldChanged {
                    field: *field,
                    value: value.clone(),
                }),
        );
        use_cases
    }
}

/// Reads a [`FormDocument`] from any `Read` source (e.g., File, Stdin).
pub struct FormReader<R: Read> {
    source: R,
}

impl<R: Read> FormReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn read(self) -> Result<FormDocument> {
        Ok(serde_json::from_reader(self.source)?)
    }
}
