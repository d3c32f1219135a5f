#![allow(dead_code)]

use async_trait::async_trait;
use card_tokenizer::application::use_case::UseCase;
use card_tokenizer::domain::country::CountryList;
use card_tokenizer::domain::form::Field;
use card_tokenizer::domain::ports::{FormStore, ProgressCallback, TokenCallback, TokenTransport};
use card_tokenizer::domain::token::{
    CardTokenizationRequest, RawResponse, TokenResult, TransportError, WalletTokenizationRequest,
};
use card_tokenizer::domain::validation::{Validator, YearMonth};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_KEY: &str = "pk_test_6ff46046-30af-41d9-bf58-929022d2cd14";

pub fn validator() -> Validator {
    Validator::new(YearMonth::new(2026, 6), CountryList::default())
}

/// A complete, valid form as a user would enter it.
pub fn valid_form() -> Vec<(Field, &'static str)> {
    vec![
        (Field::CardNumber, "4242 4242 4242 4242"),
        (Field::ExpiryMonth, "9"),
        (Field::ExpiryYear, "2028"),
        (Field::Cvv, "100"),
        (Field::Name, "Jane Doe"),
        (Field::AddressOne, "1 Main Street"),
        (Field::AddressTwo, "Flat 2"),
        (Field::City, "London"),
        (Field::State, "Greater London"),
        (Field::Postcode, "N1 9GU"),
        (Field::Country, "GB"),
        (Field::PhoneCountryCode, "+44"),
        (Field::PhoneNumber, "7700 900123"),
    ]
}

pub fn fill(store: &dyn FormStore, validator: &Validator) {
    for (field, value) in valid_form() {
        let outcome = UseCase::FieldChanged {
            field,
            value: value.to_string(),
        }
        .execute(store, validator);
        assert_eq!(
            outcome,
            card_tokenizer::application::use_case::Outcome::FieldChanged { accepted: true },
            "{field} rejected"
        );
    }
}

pub fn valid_request() -> CardTokenizationRequest {
    let validator = validator();
    let store = card_tokenizer::infrastructure::in_memory::InMemoryFormStore::new();
    fill(&store, &validator);
    let form = validator
        .validate_for_submission(&store.snapshot())
        .expect("valid form");
    CardTokenizationRequest::from_validated(&form)
}

/// What the transport was asked to send.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub endpoint: &'static str,
    pub api_key: String,
    pub body: serde_json::Value,
}

/// Replays scripted outcomes in order, each after an optional delay.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<(Duration, Result<RawResponse, TransportError>)>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, outcome: Result<RawResponse, TransportError>) -> Self {
        self.respond_after(Duration::ZERO, outcome)
    }

    pub fn respond_after(
        self,
        delay: Duration,
        outcome: Result<RawResponse, TransportError>,
    ) -> Self {
        self.script.lock().unwrap().push_back((delay, outcome));
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    async fn next(
        &self,
        endpoint: &'static str,
        api_key: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            endpoint,
            api_key: api_key.to_string(),
            body,
        });
        let (delay, outcome) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

#[async_trait]
impl TokenTransport for ScriptedTransport {
    async fn submit_card(
        &self,
        api_key: &str,
        request: &CardTokenizationRequest,
    ) -> Result<RawResponse, TransportError> {
        let body = serde_json::to_value(request).unwrap();
        self.next("card", api_key, body).await
    }

    async fn submit_wallet(
        &self,
        api_key: &str,
        request: &WalletTokenizationRequest,
    ) -> Result<RawResponse, TransportError> {
        let body = serde_json::to_value(request).unwrap();
        self.next("wallet", api_key, body).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(bool),
    Token(TokenResult),
}

/// Records token and progress callbacks in the order they fired.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<TokenResult> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Token(result) => Some(result),
                Event::Progress(_) => None,
            })
            .collect()
    }

    pub fn progress_count(&self, in_progress: bool) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == Event::Progress(in_progress))
            .count()
    }
}

impl TokenCallback for EventLog {
    fn on_token_result(&self, result: TokenResult) {
        self.events.lock().unwrap().push(Event::Token(result));
    }
}

impl ProgressCallback for EventLog {
    fn on_progress_changed(&self, in_progress: bool) {
        self.events.lock().unwrap().push(Event::Progress(in_progress));
    }
}

pub fn card_success_body(token: &str) -> String {
    serde_json::json!({
        "id": token,
        "liveMode": false,
        "card": {
            "expiryMonth": 9,
            "expiryYear": 2028,
            "name": "Jane Doe",
            "last4": "4242",
            "bin": "424242",
            "paymentMethod": "Visa"
        }
    })
    .to_string()
}

pub fn rejection_body() -> String {
    serde_json::json!({
        "request_id": "0HL80RJLS76I7",
        "error_type": "request_invalid",
        "error_codes": ["card_number_invalid", "cvv_invalid"]
    })
    .to_string()
}
