//! Error types for hc-payments

use thiserror::Error;

/// hc-payments error type
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Unknown service: {0}")]
    ServiceNotFound(String),

    #[error("Stripe API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] hc_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;
