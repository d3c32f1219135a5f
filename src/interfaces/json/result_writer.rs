use crate::domain::form::Field;
use crate::domain::token::{Rejection, TokenDetails, TokenResult};
use crate::domain::validation::{FormScope, ValidationResult};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ResultReport<'a> {
    Success {
        #[serde(flatten)]
        details: &'a TokenDetails,
    },
    Rejected { rejection: &'a Rejection },
    TransportError {
        error: String,
    },
}

#[derive(Serialize)]
struct ValidationReport {
    status: &'static str,
    scope: FormScope,
    invalid_fields: Vec<Field>,
}

#[derive(Serialize)]
struct DryRunReport<'a, T> {
    status: &'static str,
    request: &'a T,
}

/// Writes reports as pretty-printed JSON, one document per call.
pub struct ResultWriter<W: Write> {
    sink: W,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_result(&mut self, result: &TokenResult) -> Result<()> {
        let report = match result {
            TokenResult::Success(details) => ResultReport::Success { details },
            TokenResult::BusinessRejection(rejection) => ResultReport::Rejected { rejection },
            TokenResult::TransportError(e) => ResultReport::TransportError {
                error: e.to_string(),
            },
        };
        self.write(&report)
    }

    pub fn write_validation(&mut self, result: &ValidationResult) -> Result<()> {
        self.write(&ValidationReport {
            status: if result.all_valid() { "valid" } else { "invalid" },
            scope: result.scope(),
            invalid_fields: result.invalid_fields(),
        })
    }

    /// Writes the request body that would have been sent.
    pub fn write_dry_run<T: Serialize>(&mut self, request: &T) -> Result<()> {
        self.write(&DryRunReport {
            status: "dry_run",
            request,
        })
    }

    fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.sink, value)?;
        writeln!(self.sink)?;
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::{SchemeMetadata, TransportError};
    use serde_json::Value;

    fn written(f: impl FnOnce(&mut ResultWriter<&mut Vec<u8>>)) -> Value {
        let mut buffer = Vec::new();
        f(&mut ResultWriter::new(&mut buffer));
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_success_report() {
        let details = TokenDetails {
            token: "tok_1".to_string(),
            live_mode: Some(false),
            expires_on: None,
            scheme: SchemeMetadata {
                last4: Some("4242".to_string()),
                ..SchemeMetadata::default()
            },
        };
        let value = written(|w| {
            w.write_result(&TokenResult::Success(details)).unwrap();
        });
        assert_eq!(value["status"], "success");
        assert_eq!(value["token"], "tok_1");
        assert_eq!(value["scheme"]["last4"], "4242");
    }

    #[test]
    fn test_transport_error_report() {
        let value = written(|w| {
            w.write_result(&TokenResult::TransportError(TransportError::Connection(
                "refused".to_string(),
            )))
            .unwrap();
        });
        assert_eq!(value["status"], "transport_error");
        assert!(value["error"].as_str().unwrap().contains("refused"));
    }

    #[test]
    fn test_validation_report_lists_invalid_fields() {
        let result = ValidationResult::from_flags(
            FormScope::Card,
            [(Field::CardNumber, false), (Field::Cvv, true)],
        );
        let value = written(|w| w.write_validation(&result).unwrap());
        assert_eq!(value["status"], "invalid");
        assert_eq!(value["scope"], "card");
        assert_eq!(value["invalid_fields"], serde_json::json!(["card_number"]));
    }
}
