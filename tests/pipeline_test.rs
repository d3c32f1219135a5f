mod common;

use card_tokenizer::application::delivery::{DeliveryLoop, delivery_channel};
use card_tokenizer::application::pipeline::TokenizationPipeline;
use async_trait::async_trait;
use card_tokenizer::domain::ports::{
    ProgressCallback, TokenCallback, TokenTransport, TokenTransportRef,
};
use card_tokenizer::domain::token::{
    CardTokenizationRequest, GooglePayTokenData, RawResponse, TokenResult, TransportError,
    WalletTokenizationRequest,
};
use common::{Event, EventLog, ScriptedTransport, TEST_KEY};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn pipeline(
    transport: TokenTransportRef,
    log: &Arc<EventLog>,
) -> (TokenizationPipeline, DeliveryLoop) {
    let (delivery, delivery_loop) = delivery_channel();
    let pipeline = TokenizationPipeline::new(
        TEST_KEY,
        transport,
        Handle::current(),
        delivery,
        Arc::clone(log) as Arc<dyn TokenCallback>,
    )
    .with_progress_callback(Arc::clone(log) as Arc<dyn ProgressCallback>);
    (pipeline, delivery_loop)
}

struct PanickingTransport;

#[async_trait]
impl TokenTransport for PanickingTransport {
    async fn submit_card(
        &self,
        _api_key: &str,
        _request: &CardTokenizationRequest,
    ) -> Result<RawResponse, TransportError> {
        panic!("transport bug");
    }

    async fn submit_wallet(
        &self,
        _api_key: &str,
        _request: &WalletTokenizationRequest,
    ) -> Result<RawResponse, TransportError> {
        panic!("transport bug");
    }
}

#[tokio::test]
async fn test_success_delivers_token_then_progress_off() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(Ok(RawResponse::new(201, common::card_success_body("tok_abc")))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(Arc::<ScriptedTransport>::clone(&transport), &log);

    let handle = pipeline.dispatch_card(common::valid_request());
    // Progress is raised before dispatch returns.
    assert_eq!(log.events(), vec![Event::Progress(true)]);

    handle.completed().await;
    // Nothing reaches the host until the delivery context runs.
    assert_eq!(log.events(), vec![Event::Progress(true)]);
    assert!(delivery.run_next().await);

    let events = log.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], Event::Progress(true));
    let Event::Token(TokenResult::Success(details)) = &events[1] else {
        panic!("expected a success, got {:?}", events[1]);
    };
    assert_eq!(details.token, "tok_abc");
    assert_eq!(details.scheme.scheme.as_deref(), Some("Visa"));
    assert_eq!(details.scheme.last4.as_deref(), Some("4242"));
    assert_eq!(events[2], Event::Progress(false));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].endpoint, "card");
    assert_eq!(sent[0].api_key, TEST_KEY);
    assert_eq!(sent[0].body["number"], "4242424242424242");
    assert_eq!(sent[0].body["expiryMonth"], "09");
    assert_eq!(sent[0].body["billingDetails"]["phone"]["countryCode"], "+44");
}

#[tokio::test]
async fn test_rejection_carries_codes() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(Ok(RawResponse::new(422, common::rejection_body()))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(transport, &log);

    pipeline.dispatch_card(common::valid_request()).completed().await;
    delivery.run_next().await;

    let results = log.results();
    assert_eq!(results.len(), 1);
    let TokenResult::BusinessRejection(rejection) = &results[0] else {
        panic!("expected a rejection, got {:?}", results[0]);
    };
    assert_eq!(rejection.status, 422);
    assert_eq!(rejection.request_id.as_deref(), Some("0HL80RJLS76I7"));
    assert_eq!(rejection.codes, vec!["card_number_invalid", "cvv_invalid"]);
    assert_eq!(log.progress_count(false), 1);
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(Err(TransportError::Connection("refused".to_string()))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(transport, &log);

    pipeline.dispatch_card(common::valid_request()).completed().await;
    delivery.run_next().await;

    assert_eq!(
        log.results(),
        vec![TokenResult::TransportError(TransportError::Connection(
            "refused".to_string()
        ))]
    );
    assert_eq!(log.progress_count(true), 1);
    assert_eq!(log.progress_count(false), 1);
}

#[tokio::test]
async fn test_unreadable_error_body_is_transport_error() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(Ok(RawResponse::new(502, "<html>Bad Gateway</html>"))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(transport, &log);

    pipeline.dispatch_card(common::valid_request()).completed().await;
    delivery.run_next().await;

    let results = log.results();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        TokenResult::TransportError(TransportError::MalformedResponse { status: 502, .. })
    ));
    assert_eq!(log.progress_count(false), 1);
}

#[tokio::test]
async fn test_wallet_result_uses_same_callbacks() {
    let body = serde_json::json!({
        "type": "googlepay",
        "token": "tok_wallet",
        "expires_on": "2026-10-15T10:15:00Z",
        "scheme": "VISA",
        "last4": "1111"
    })
    .to_string();
    let transport = Arc::new(ScriptedTransport::new().respond(Ok(RawResponse::new(201, body))));
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(Arc::<ScriptedTransport>::clone(&transport), &log);

    let request = WalletTokenizationRequest::google_pay(GooglePayTokenData {
        signature: "MEUCIQ".to_string(),
        protocol_version: "ECv1".to_string(),
        signed_message: "{\"encryptedMessage\":\"...\"}".to_string(),
    });
    pipeline.dispatch_wallet(request).completed().await;
    delivery.run_next().await;

    let results = log.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].token(), Some("tok_wallet"));
    assert_eq!(log.events().last(), Some(&Event::Progress(false)));

    let sent = transport.sent();
    assert_eq!(sent[0].endpoint, "wallet");
    assert_eq!(sent[0].body["type"], "googlepay");
    assert_eq!(sent[0].body["token_data"]["protocolVersion"], "ECv1");
}

#[tokio::test]
async fn test_deliveries_follow_completion_order() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond_after(
                Duration::from_millis(150),
                Ok(RawResponse::new(201, common::card_success_body("tok_slow"))),
            )
            .respond(Ok(RawResponse::new(201, common::card_success_body("tok_fast")))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(transport, &log);

    let slow = pipeline.dispatch_card(common::valid_request());
    let fast = pipeline.dispatch_card(common::valid_request());
    fast.completed().await;
    slow.completed().await;
    assert_eq!(delivery.run_pending(), 2);

    let tokens: Vec<_> = log
        .results()
        .iter()
        .map(|result| result.token().map(str::to_string))
        .collect();
    assert_eq!(
        tokens,
        vec![Some("tok_fast".to_string()), Some("tok_slow".to_string())]
    );
    assert_eq!(log.progress_count(true), 2);
    assert_eq!(log.progress_count(false), 2);
}

#[tokio::test]
async fn test_result_waits_for_delivery_loop() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(Ok(RawResponse::new(201, common::card_success_body("tok_1")))),
    );
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(transport, &log);

    let handle = pipeline.dispatch_card(common::valid_request());
    let runner = tokio::spawn(async move {
        delivery.run_next().await;
    });
    handle.completed().await;
    runner.await.unwrap();
    assert_eq!(log.results().len(), 1);
}

#[tokio::test]
async fn test_panicking_transport_still_reports_once() {
    let log = EventLog::new();
    let (pipeline, mut delivery) = pipeline(Arc::new(PanickingTransport), &log);

    pipeline.dispatch_card(common::valid_request()).completed().await;
    assert_eq!(delivery.run_pending(), 1);

    let results = log.results();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        TokenResult::TransportError(TransportError::Request(_))
    ));
    assert_eq!(log.progress_count(true), 1);
    assert_eq!(log.progress_count(false), 1);
}
