use card_tokenizer::application::context::CheckoutContext;
use card_tokenizer::config::{CheckoutConfig, DEFAULT_TIMEOUT, Environment};
use card_tokenizer::domain::token::{
    CardTokenizationRequest, TokenResult, WalletTokenizationRequest,
};
use card_tokenizer::domain::validation::ValidationResult;
use card_tokenizer::interfaces::json::form_reader::{FormDocument, FormReader};
use card_tokenizer::interfaces::json::result_writer::ResultWriter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkout form as JSON
    input: PathBuf,

    /// Public key used to authorize tokenization requests
    #[arg(long, env = "CHECKOUT_PUBLIC_KEY")]
    public_key: Option<String>,

    #[arg(long, value_enum, default_value_t = Environment::Sandbox)]
    environment: Environment,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Send requests to this host instead of the environment's
    #[arg(long, hide = true)]
    base_url: Option<String>,

    /// Repeat for more verbose logs on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// The request a form resolves to once it is complete.
enum Submission {
    Card(CardTokenizationRequest),
    Wallet(WalletTokenizationRequest),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file = File::open(&cli.input).into_diagnostic()?;
    let document = FormReader::new(file).read().into_diagnostic()?;

    let context = CheckoutContext::in_memory();
    let stdout = io::stdout();
    let mut writer = ResultWriter::new(stdout.lock());

    let submission = match prepare(&context, document) {
        Ok(submission) => submission,
        Err(result) => {
            tracing::warn!(invalid = ?result.invalid_fields(), "form is incomplete");
            writer.write_validation(&result).into_diagnostic()?;
            return Ok(ExitCode::from(2));
        }
    };

    let Some(result) = tokenize(&cli, submission, &mut writer).await? else {
        return Ok(ExitCode::SUCCESS);
    };
    writer.write_result(&result).into_diagnostic()?;
    context.end_flow();

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Replays the form through the use-cases and validates it.
fn prepare(
    context: &CheckoutContext,
    document: FormDocument,
) -> std::result::Result<Submission, ValidationResult> {
    if let Some(token_data) = document.google_pay {
        return Ok(Submission::Wallet(WalletTokenizationRequest::google_pay(token_data)));
    }

    for use_case in document.use_cases(context.validator().countries()) {
        use_case.execute(context.store().as_ref(), context.validator());
    }
    let form = context
        .validator()
        .validate_for_submission(&context.store().snapshot())?;
    Ok(Submission::Card(CardTokenizationRequest::from_validated(&form)))
}

#[cfg(feature = "transport-http")]
async fn tokenize(
    cli: &Cli,
    submission: Submission,
    _writer: &mut ResultWriter<io::StdoutLock<'_>>,
) -> Result<Option<TokenResult>> {
    use card_tokenizer::application::delivery::delivery_channel;
    use card_tokenizer::application::pipeline::TokenizationPipeline;
    use card_tokenizer::infrastructure::http::HttpTokenTransport;
    use std::sync::{Arc, Mutex, PoisonError};

    let config = CheckoutConfig::new(cli.public_key.clone().unwrap_or_default(), cli.environment)
        .into_diagnostic()?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let mut transport = HttpTokenTransport::new(&config).into_diagnostic()?;
    if let Some(base_url) = &cli.base_url {
        transport = transport.with_base_url(base_url);
    }

    let slot: Arc<Mutex<Option<TokenResult>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&slot);
    let (delivery, mut delivery_loop) = delivery_channel();
    let pipeline = TokenizationPipeline::new(
        config.public_key.clone(),
        Arc::new(transport),
        tokio::runtime::Handle::current(),
        delivery,
        Arc::new(move |result: TokenResult| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        }),
    )
    .with_progress_callback(Arc::new(|in_progress: bool| {
        tracing::info!(in_progress, "tokenization progress");
    }));

    let handle = match submission {
        Submission::Card(request) => pipeline.dispatch_card(request),
        Submission::Wallet(request) => pipeline.dispatch_wallet(request),
    };
    handle.completed().await;
    delivery_loop.run_pending();

    let result = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    result
        .map(Some)
        .ok_or_else(|| miette::miette!("dispatch ended without delivering a result"))
}

#[cfg(not(feature = "transport-http"))]
async fn tokenize(
    cli: &Cli,
    submission: Submission,
    writer: &mut ResultWriter<io::StdoutLock<'_>>,
) -> Result<Option<TokenResult>> {
    if let Some(key) = &cli.public_key {
        let config = CheckoutConfig::new(key.clone(), cli.environment)
            .into_diagnostic()?
            .with_timeout(Duration::from_secs(cli.timeout_secs));
        tracing::debug!(environment = ?config.environment, "public key accepted");
    }
    eprintln!(
        "WARNING: Tokenization requested, but 'transport-http' feature is not enabled. \
         Printing the request instead."
    );
    if cli.base_url.is_some() {
        tracing::warn!("--base-url ignored without an HTTP transport");
    }
    match submission {
        Submission::Card(request) => writer.write_dry_run(&request).into_diagnostic()?,
        Submission::Wallet(request) => writer.write_dry_run(&request).into_diagnostic()?,
    }
    Ok(None)
}
