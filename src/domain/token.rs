//! Wire shapes exchanged with the tokenization endpoint and the closed
//! outcome reported back to the host.

use super::form::Field;
use super::validation::ValidatedForm;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    pub country_code: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetails {
    pub address_line1: String,
    pub address_line2: String,
    pub postcode: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub phone: Phone,
}

/// Card tokenization request body.
///
/// Built once per submission, and only from a [`ValidatedForm`].
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTokenizationRequest {
    number: String,
    expiry_month: String,
    expiry_year: String,
    cvv: String,
    name: String,
    billing_details: BillingDetails,
}

impl CardTokenizationRequest {
    pub fn from_validated(form: &ValidatedForm) -> Self {
        let state = form.state();
        let value = |field: Field| state.get(field).trim().to_string();
        Self {
            number: value(Field::CardNumber),
            expiry_month: format!("{:0>2}", value(Field::ExpiryMonth)),
            expiry_year: value(Field::ExpiryYear),
            cvv: value(Field::Cvv),
            name: value(Field::Name),
            billing_details: BillingDetails {
                address_line1: value(Field::AddressOne),
                address_line2: value(Field::AddressTwo),
                postcode: value(Field::Postcode),
                country: value(Field::Country),
                city: value(Field::City),
                state: value(Field::State),
                phone: Phone {
                    country_code: value(Field::PhoneCountryCode),
                    number: value(Field::PhoneNumber),
                },
            },
        }
    }

    pub fn last4(&self) -> &str {
        &self.number[self.number.len().saturating_sub(4)..]
    }

    pub fn billing_details(&self) -> &BillingDetails {
        &self.billing_details
    }
}

// Card number and CVV stay out of debug output.
impl fmt::Debug for CardTokenizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardTokenizationRequest")
            .field("last4", &self.last4())
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("name", &self.name)
            .field("billing_details", &self.billing_details)
            .finish_non_exhaustive()
    }
}

/// Google Pay payment data handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePayTokenData {
    pub signature: String,
    pub protocol_version: String,
    pub signed_message: String,
}

/// Wallet tokenization request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletTokenizationRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    token_data: GooglePayTokenData,
}

impl WalletTokenizationRequest {
    pub fn google_pay(token_data: GooglePayTokenData) -> Self {
        Self {
            kind: "googlepay",
            token_data,
        }
    }
}

/// Status and body of a response, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that happen before a usable response is obtained, plus
/// responses whose body cannot be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed response (HTTP {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
}

/// Card details the scheme returned alongside the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemeMetadata {
    pub scheme: Option<String>,
    pub last4: Option<String>,
    pub bin: Option<String>,
    pub expiry_month: Option<u32>,
    pub expiry_year: Option<u32>,
    pub name: Option<String>,
    pub fingerprint: Option<String>,
    pub card_type: Option<String>,
    pub card_category: Option<String>,
    pub issuer: Option<String>,
    pub issuer_country: Option<String>,
    pub product_id: Option<String>,
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDetails {
    pub token: String,
    pub live_mode: Option<bool>,
    pub expires_on: Option<String>,
    pub scheme: SchemeMetadata,
}

/// Structured reasons the remote service gave for declining a request.
/// Codes are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub status: u16,
    pub request_id: Option<String>,
    pub error_type: Option<String>,
    pub message: Option<String>,
    pub codes: Vec<String>,
}

/// Terminal outcome of one tokenization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResult {
    Success(TokenDetails),
    BusinessRejection(Rejection),
    TransportError(TransportError),
}

impl TokenResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TokenResult::Success(_))
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            TokenResult::Success(details) => Some(&details.token),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardResponseBody {
    id: String,
    #[serde(default)]
    live_mode: Option<bool>,
    card: Option<CardBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardBody {
    #[serde(default, deserialize_with = "lenient_u32")]
    expiry_month: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    expiry_year: Option<u32>,
    name: Option<String>,
    last4: Option<String>,
    bin: Option<String>,
    payment_method: Option<String>,
    fingerprint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WalletResponseBody {
    token: String,
    expires_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    expiry_month: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    expiry_year: Option<u32>,
    scheme: Option<String>,
    last4: Option<String>,
    bin: Option<String>,
    card_type: Option<String>,
    card_category: Option<String>,
    issuer: Option<String>,
    issuer_country: Option<String>,
    product_id: Option<String>,
    product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default, alias = "eventId")]
    request_id: Option<String>,
    #[serde(default, alias = "errorCode")]
    error_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "errorMessageCodes")]
    error_codes: Vec<String>,
}

/// Accepts `12`, `"12"` or `null`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) => {
            s.trim().parse().map(Some).map_err(serde::de::Error::custom)
        }
    }
}

fn malformed(status: u16, reason: impl fmt::Display) -> TransportError {
    TransportError::MalformedResponse {
        status,
        reason: reason.to_string(),
    }
}

/// Parses a successful card tokenization body.
pub fn parse_card_success(response: &RawResponse) -> Result<TokenDetails, TransportError> {
    let body: CardResponseBody =
        serde_json::from_str(&response.body).map_err(|e| malformed(response.status, e))?;
    if body.id.trim().is_empty() {
        return Err(malformed(response.status, "empty token"));
    }
    let card = body.card.unwrap_or_default();
    Ok(TokenDetails {
        token: body.id,
        live_mode: body.live_mode,
        expires_on: None,
        scheme: SchemeMetadata {
            scheme: card.payment_method,
            last4: card.last4,
            bin: card.bin,
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            name: card.name,
            fingerprint: card.fingerprint,
            ..SchemeMetadata::default()
        },
    })
}

/// Parses a successful wallet tokenization body.
pub fn parse_wallet_success(response: &RawResponse) -> Result<TokenDetails, TransportError> {
    let body: WalletResponseBody =
        serde_json::from_str(&response.body).map_err(|e| malformed(response.status, e))?;
    if body.token.trim().is_empty() {
        return Err(malformed(response.status, "empty token"));
    }
    Ok(TokenDetails {
        token: body.token,
        live_mode: None,
        expires_on: body.expires_on,
        scheme: SchemeMetadata {
            scheme: body.scheme,
            last4: body.last4,
            bin: body.bin,
            expiry_month: body.expiry_month,
            expiry_year: body.expiry_year,
            name: None,
            fingerprint: None,
            card_type: body.card_type,
            card_category: body.card_category,
            issuer: body.issuer,
            issuer_country: body.issuer_country,
            product_id: body.product_id,
            product_type: body.product_type,
        },
    })
}

/// Parses an error body into structured rejection reasons.
///
/// A body that is not JSON, or carries neither an error type nor any codes,
/// is reported as malformed.
pub fn parse_rejection(response: &RawResponse) -> Result<Rejection, TransportError> {
    let body: RejectionBody =
        serde_json::from_str(&response.body).map_err(|e| malformed(response.status, e))?;
    if body.error_type.is_none() && body.error_codes.is_empty() {
        return Err(malformed(response.status, "error body carries no rejection reason"));
    }
    Ok(Rejection {
        status: response.status,
        request_id: body.request_id,
        error_type: body.error_type,
        message: body.message,
        codes: body.error_codes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_success_body() {
        let response = RawResponse::new(
            201,
            json!({
                "id": "tok_123",
                "liveMode": false,
                "created": "2026-10-15T10:00:00Z",
                "used": false,
                "card": {
                    "expiryMonth": "09",
                    "expiryYear": "2028",
                    "last4": "4242",
                    "bin": "424242",
                    "paymentMethod": "Visa"
                }
            })
            .to_string(),
        );
        let details = parse_card_success(&response).unwrap();
        assert_eq!(details.token, "tok_123");
        assert_eq!(details.scheme.scheme.as_deref(), Some("Visa"));
        assert_eq!(details.scheme.expiry_month, Some(9));
        assert_eq!(details.scheme.last4.as_deref(), Some("4242"));
    }

    #[test]
    fn test_wallet_success_body() {
        let response = RawResponse::new(
            201,
            json!({
                "type": "googlepay",
                "token": "tok_wallet",
                "expires_on": "2026-10-15T10:15:00Z",
                "expiry_month": 12,
                "expiry_year": 2030,
                "scheme": "VISA",
                "last4": "1111",
                "issuer_country": "GB"
            })
            .to_string(),
        );
        let details = parse_wallet_success(&response).unwrap();
        assert_eq!(details.token, "tok_wallet");
        assert_eq!(details.expires_on.as_deref(), Some("2026-10-15T10:15:00Z"));
        assert_eq!(details.scheme.expiry_year, Some(2030));
        assert_eq!(details.scheme.issuer_country.as_deref(), Some("GB"));
    }

    #[test]
    fn test_success_body_without_token_is_malformed() {
        let response = RawResponse::new(200, r#"{"card": {}}"#);
        assert!(matches!(
            parse_card_success(&response),
            Err(TransportError::MalformedResponse { status: 200, .. })
        ));
    }

    #[test]
    fn test_rejection_accepts_both_body_styles() {
        let legacy = RawResponse::new(
            400,
            json!({
                "eventId": "evt_1",
                "errorCode": "70000",
                "message": "Validation error",
                "errorMessageCodes": ["70003", "82010"]
            })
            .to_string(),
        );
        let rejection = parse_rejection(&legacy).unwrap();
        assert_eq!(rejection.request_id.as_deref(), Some("evt_1"));
        assert_eq!(rejection.codes, vec!["70003", "82010"]);

        let current = RawResponse::new(
            422,
            json!({
                "request_id": "req_1",
                "error_type": "request_invalid",
                "error_codes": ["card_number_invalid"]
            })
            .to_string(),
        );
        let rejection = parse_rejection(&current).unwrap();
        assert_eq!(rejection.status, 422);
        assert_eq!(rejection.error_type.as_deref(), Some("request_invalid"));
        assert_eq!(rejection.codes, vec!["card_number_invalid"]);
    }

    #[test]
    fn test_unparseable_rejection_is_malformed() {
        for body in ["<html>bad gateway</html>", "{}", ""] {
            let response = RawResponse::new(502, body);
            assert!(parse_rejection(&response).is_err(), "{body:?}");
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(RawResponse::new(201, "").is_success());
        assert!(!RawResponse::new(401, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
    }
}
