use crate::domain::form::Field;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Rejected value for {field}: {reason}")]
    Normalization { field: Field, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Presenter key '{0}' is registered with a different presenter type")]
    PresenterTypeMismatch(&'static str),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CheckoutError {
    pub(crate) fn rejected(field: Field, reason: impl Into<String>) -> Self {
        Self::Normalization {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
