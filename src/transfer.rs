//! Transfer submission
//!
//! The submitter orchestrates one transfer end to end: validate the inputs,
//! resolve configuration, build the wire request, push it through a
//! resilient session, then classify whatever came back.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::client::{HttpRequest, TransferSession, classify_transport_failure};
use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::validators::validate_transfer_inputs;

/// Client identifier sent with every submission.
pub const USER_AGENT: &str = "MoneyTransferClient/1.0";

/// Reported when a success response carries no `transactionId` field.
pub const TRANSACTION_ID_PLACEHOLDER: &str = "N/A";

/// A transfer instruction that passed the input gate.
///
/// Fields are private and only set by [`TransferRequest::new`], so an
/// invalid instance cannot exist.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    from_account: String,
    to_account: String,
    amount: Decimal,
}

impl TransferRequest {
    /// Validate and construct. Purely local; no network activity.
    pub fn new(from_acc: &str, to_acc: &str, amount: Decimal) -> Result<Self, TransferError> {
        validate_transfer_inputs(from_acc, to_acc, amount)?;
        Ok(Self {
            from_account: from_acc.to_string(),
            to_account: to_acc.to_string(),
            amount,
        })
    }

    pub fn from_account(&self) -> &str {
        &self.from_account
    }

    pub fn to_account(&self) -> &str {
        &self.to_account
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Wire body for `POST /transfer`. Field names and the numeric `amount`
/// are part of the API contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferBody<'a> {
    from_account: &'a str,
    to_account: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

/// Outcome of an accepted transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Server-assigned id, or [`TRANSACTION_ID_PLACEHOLDER`] when the
    /// response body had none.
    pub transaction_id: String,
    /// Full parsed response body for callers that need more than the id.
    pub raw: Value,
}

/// Submit one transfer with a session scoped to this call.
///
/// `config: None` resolves configuration from the environment. The session
/// and its pooled connections are released when this returns, on success
/// and failure paths alike.
pub async fn transfer_money(
    from_acc: &str,
    to_acc: &str,
    amount: Decimal,
    config: Option<TransferConfig>,
    token: Option<&str>,
) -> Result<TransferReceipt, TransferError> {
    // Fail fast: nothing below runs for invalid input
    let request = TransferRequest::new(from_acc, to_acc, amount)?;

    let config = match config {
        Some(config) => config,
        None => TransferConfig::from_env()?,
    };

    let session = TransferSession::new(&config)?;
    send_request(&session, &config, &request, token).await
}

/// Submit one transfer over a caller-owned session.
///
/// Validation still runs first, so an invalid input never reaches the
/// transport. This is the entry point for callers that reuse one session
/// across many transfers.
pub async fn submit_transfer(
    session: &TransferSession,
    config: &TransferConfig,
    from_acc: &str,
    to_acc: &str,
    amount: Decimal,
    token: Option<&str>,
) -> Result<TransferReceipt, TransferError> {
    let request = TransferRequest::new(from_acc, to_acc, amount)?;
    send_request(session, config, &request, token).await
}

async fn send_request(
    session: &TransferSession,
    config: &TransferConfig,
    request: &TransferRequest,
    token: Option<&str>,
) -> Result<TransferReceipt, TransferError> {
    let url = format!("{}/transfer", config.api_base_url);
    let body = serde_json::to_string(&TransferBody {
        from_account: &request.from_account,
        to_account: &request.to_account,
        amount: request.amount,
    })
    .map_err(|e| TransferError::Unexpected {
        kind: "serialize".to_string(),
        message: e.to_string(),
    })?;

    let mut headers = vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), USER_AGENT.to_string()),
    ];
    if let Some(token) = token {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }

    info!(
        from = %request.from_account,
        to = %request.to_account,
        amount = %request.amount,
        "Initiating transfer"
    );

    let response = session
        .send(HttpRequest {
            method: "POST".to_string(),
            url: url.clone(),
            headers,
            body,
        })
        .await
        .map_err(|failure| classify_transport_failure(failure, &url, config.timeout_secs))?;

    if !response.is_success() {
        error!(
            status = response.status,
            body = %response.body,
            "Transfer rejected"
        );
        return Err(TransferError::HttpError {
            status: response.status,
            body: response.body,
        });
    }

    let raw: Value = serde_json::from_str(&response.body)
        .map_err(|e| TransferError::ResponseParse(e.to_string()))?;
    let transaction_id = raw
        .get("transactionId")
        .and_then(Value::as_str)
        .unwrap_or(TRANSACTION_ID_PLACEHOLDER)
        .to_string();

    info!(transaction_id = %transaction_id, "Transfer successful");

    Ok(TransferReceipt {
        transaction_id,
        raw,
    })
}
