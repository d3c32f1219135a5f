use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which tokenization service to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.checkout.com/api2/",
            Environment::Live => "https://api2.checkout.com/",
        }
    }

    pub fn card_token_url(&self) -> String {
        format!("{}v2/tokens/card", self.base_url())
    }

    pub fn wallet_token_url(&self) -> String {
        format!("{}tokens", self.base_url())
    }
}

/// Settings for one embedding session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub public_key: String,
    pub environment: Environment,
    pub timeout: Duration,
}

impl CheckoutConfig {
    /// Validates the key against the environment and builds the config.
    ///
    /// Public keys start with `pk_`; test keys (`pk_test_`, `pk_sbox_`) are
    /// refused for the live environment.
    pub fn new(public_key: impl Into<String>, environment: Environment) -> Result<Self> {
        let public_key = public_key.into().trim().to_string();
        if public_key.is_empty() {
            return Err(CheckoutError::Config("public key is empty".to_string()));
        }
        if !public_key.starts_with("pk_") {
            return Err(CheckoutError::Config(
                "public key must start with 'pk_'".to_string(),
            ));
        }
        let is_test_key = public_key.starts_with("pk_test_") || public_key.starts_with("pk_sbox_");
        if environment == Environment::Live && is_test_key {
            return Err(CheckoutError::Config(
                "a test public key cannot be used against the live environment".to_string(),
            ));
        }
        Ok(Self {
            public_key,
            environment,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
