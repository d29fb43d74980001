//! Input validation
//!
//! Pure checks that gate every submission before any network activity.
//! Deterministic and side-effect free, so callers may re-run them freely.

use rust_decimal::Decimal;

use crate::error::TransferError;

/// Validate the inputs of one transfer.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. amount must be strictly positive
/// 2. neither account identifier may be empty or blank
/// 3. source and destination must differ
pub fn validate_transfer_inputs(
    from_acc: &str,
    to_acc: &str,
    amount: Decimal,
) -> Result<(), TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount(amount));
    }
    if from_acc.trim().is_empty() || to_acc.trim().is_empty() {
        return Err(TransferError::EmptyAccount);
    }
    if from_acc == to_acc {
        return Err(TransferError::SameAccount);
    }
    Ok(())
}

/// Parse a user-supplied amount string into a [`Decimal`].
///
/// Surrounding whitespace is tolerated. The error message carries the
/// original text so the prompt can echo it back.
pub fn parse_amount(amount_str: &str) -> Result<Decimal, TransferError> {
    amount_str
        .trim()
        .parse::<Decimal>()
        .map_err(|_| TransferError::MalformedAmount(amount_str.to_string()))
}
