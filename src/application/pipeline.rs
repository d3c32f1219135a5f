use super::delivery::DeliveryContext;
use crate::domain::ports::{ProgressCallback, TokenCallback, TokenTransportRef};
use crate::domain::token::{
    CardTokenizationRequest, RawResponse, TokenResult, TransportError, WalletTokenizationRequest,
    parse_card_success, parse_rejection, parse_wallet_success,
};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Which endpoint a dispatch targets; decides how a success body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Card,
    Wallet,
}

/// Turns validated requests into exactly one [`TokenResult`] each.
///
/// Dispatches run on the `dispatcher` runtime; results and the closing
/// progress event are posted to the [`DeliveryContext`], never invoked on
/// the I/O task. There is no retry and no cancellation: a dispatch runs to
/// completion and reports once, even when the transport panics.
pub struct TokenizationPipeline {
    api_key: String,
    transport: TokenTransportRef,
    dispatcher: Handle,
    delivery: DeliveryContext,
    token_callback: Arc<dyn TokenCallback>,
    progress_callbacks: Vec<Arc<dyn ProgressCallback>>,
}

impl TokenizationPipeline {
    pub fn new(
        api_key: impl Into<String>,
        transport: TokenTransportRef,
        dispatcher: Handle,
        delivery: DeliveryContext,
        token_callback: Arc<dyn TokenCallback>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
            dispatcher,
            delivery,
            token_callback,
            progress_callbacks: Vec::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callbacks.push(callback);
        self
    }

    /// Starts a card tokenization. Progress is raised before this returns.
    pub fn dispatch_card(&self, request: CardTokenizationRequest) -> DispatchHandle {
        tracing::info!(last4 = request.last4(), "dispatching card tokenization");
        let transport = Arc::clone(&self.transport);
        let api_key = self.api_key.clone();
        self.dispatch(RequestKind::Card, async move {
            transport.submit_card(&api_key, &request).await
        })
    }

    /// Starts a wallet tokenization, reported through the same callbacks.
    pub fn dispatch_wallet(&self, request: WalletTokenizationRequest) -> DispatchHandle {
        tracing::info!("dispatching wallet tokenization");
        let transport = Arc::clone(&self.transport);
        let api_key = self.api_key.clone();
        self.dispatch(RequestKind::Wallet, async move {
            transport.submit_wallet(&api_key, &request).await
        })
    }

    fn dispatch<F>(&self, kind: RequestKind, exchange: F) -> DispatchHandle
    where
        F: Future<Output = Result<RawResponse, TransportError>> + Send + 'static,
    {
        notify_progress(&self.progress_callbacks, true);

        let delivery = self.delivery.clone();
        let token_callback = Arc::clone(&self.token_callback);
        let progress_callbacks = self.progress_callbacks.clone();
        let exchange = self.dispatcher.spawn(exchange);
        let task = self.dispatcher.spawn(async move {
            // A panicking transport still resolves the dispatch.
            let outcome = exchange.await.unwrap_or_else(|e| {
                tracing::error!(?kind, error = %e, "exchange task failed");
                Err(TransportError::Request(format!("exchange task failed: {e}")))
            });
            let result = classify(kind, outcome);
            log_result(kind, &result);
            delivery.post(move || {
                token_callback.on_token_result(result);
                notify_progress(&progress_callbacks, false);
            });
        });
        DispatchHandle { task }
    }
}

/// Resolves once the network side of a dispatch is over and its delivery
/// job has been queued.
pub struct DispatchHandle {
    task: JoinHandle<()>,
}

impl DispatchHandle {
    pub async fn completed(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "dispatch task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Maps the raw exchange outcome onto the closed result set.
///
/// A body that cannot be read, on either the success or the error path,
/// becomes a [`TokenResult::TransportError`].
pub fn classify(kind: RequestKind, outcome: Result<RawResponse, TransportError>) -> TokenResult {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => return TokenResult::TransportError(e),
    };
    if response.is_success() {
        let parsed = match kind {
            RequestKind::Card => parse_card_success(&response),
            RequestKind::Wallet => parse_wallet_success(&response),
        };
        match parsed {
            Ok(details) => TokenResult::Success(details),
            Err(e) => TokenResult::TransportError(e),
        }
    } else {
        match parse_rejection(&response) {
            Ok(rejection) => TokenResult::BusinessRejection(rejection),
            Err(e) => TokenResult::TransportError(e),
        }
    }
}

fn notify_progress(callbacks: &[Arc<dyn ProgressCallback>], in_progress: bool) {
    for callback in callbacks {
        callback.on_progress_changed(in_progress);
    }
}

fn log_result(kind: RequestKind, result: &TokenResult) {
    match result {
        TokenResult::Success(details) => tracing::info!(
            ?kind,
            scheme = details.scheme.scheme.as_deref().unwrap_or("unknown"),
            "tokenization succeeded"
        ),
        TokenResult::BusinessRejection(rejection) => tracing::warn!(
            ?kind,
            status = rejection.status,
            codes = ?rejection.codes,
            "tokenization rejected"
        ),
        TokenResult::TransportError(e) => {
            tracing::error!(?kind, error = %e, "tokenization failed")
        }
    }
}
