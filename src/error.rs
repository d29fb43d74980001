//! Transfer Error Types
//!
//! One taxonomy for every way a submission can fail, from local input
//! validation through transport failures to rejected responses. Callers
//! branch on the variant; the rendered message is what the user sees.

use rust_decimal::Decimal;
use thiserror::Error;

/// Transfer client error types
///
/// Validation variants are raised before any network activity. The
/// operational variants are only produced after the retry budget is spent.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be positive, got: {0}")]
    InvalidAmount(Decimal),

    #[error("Account identifiers cannot be empty")]
    EmptyAccount,

    #[error("Cannot transfer to the same account")]
    SameAccount,

    #[error("Invalid amount: '{0}'. Please enter a valid number.")]
    MalformedAmount(String),

    // === Configuration Errors ===
    #[error("Invalid config value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },

    // === Operational Errors ===
    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Connection error - unable to reach API at {0}")]
    ConnectionFailed(String),

    #[error("Failed to parse response JSON: {0}")]
    ResponseParse(String),

    #[error("Unexpected error: {kind} - {message}")]
    Unexpected { kind: String, message: String },
}

impl TransferError {
    /// Get the stable error code for logs and scripted callers
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount(_) => "INVALID_AMOUNT",
            TransferError::EmptyAccount => "EMPTY_ACCOUNT",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::MalformedAmount(_) => "MALFORMED_AMOUNT",
            TransferError::InvalidConfig { .. } => "INVALID_CONFIG",
            TransferError::HttpError { .. } => "HTTP_ERROR",
            TransferError::Timeout(_) => "TIMEOUT",
            TransferError::ConnectionFailed(_) => "CONNECTION_FAILED",
            TransferError::ResponseParse(_) => "RESPONSE_PARSE",
            TransferError::Unexpected { .. } => "UNEXPECTED",
        }
    }

    /// True for failures raised by the local input gate.
    ///
    /// These are guaranteed to have issued no HTTP request, so resubmitting
    /// with corrected input is always safe.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidAmount(_)
                | TransferError::EmptyAccount
                | TransferError::SameAccount
                | TransferError::MalformedAmount(_)
        )
    }
}
