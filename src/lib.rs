//! remit - resilient money transfer client
//!
//! A client library and CLI for a remote money-transfer API: validate
//! inputs locally, submit over HTTP, retry transient failures with binary
//! exponential backoff, and classify every outcome into one error taxonomy.
//!
//! # Modules
//!
//! - [`error`] - the failure taxonomy shared by every layer
//! - [`config`] - defaults plus environment overrides
//! - [`validators`] - pure input checks, run before any network activity
//! - [`client`] - transport seam, retry policy and resilient session
//! - [`transfer`] - the submitter: build, send, classify
//! - [`auth`] - bearer-token handshake
//! - [`cli`] - interactive prompt loop
//! - [`logging`] - tracing setup, installed explicitly from `main`

// Error taxonomy - must be first!
pub mod error;

// Configuration and validation
pub mod config;
pub mod validators;

// HTTP client stack
pub mod auth;
pub mod cli;
pub mod client;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use client::{
    HttpRequest, HttpResponse, HttpTransport, MockTransport, RETRYABLE_STATUSES, ReqwestTransport,
    RetryPolicy, TransferSession, TransportError,
};
pub use config::TransferConfig;
pub use error::TransferError;
pub use transfer::{
    TRANSACTION_ID_PLACEHOLDER, TransferReceipt, TransferRequest, submit_transfer, transfer_money,
};
pub use validators::{parse_amount, validate_transfer_inputs};
