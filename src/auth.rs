//! Bearer-token handshake
//!
//! One-shot POST to `/authToken`. No retry policy applies here; the
//! handshake is cheap to redo and always runs before any transfer.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{HttpRequest, HttpTransport, ReqwestTransport, classify_transport_failure};
use crate::config::TransferConfig;
use crate::error::TransferError;

#[derive(Debug, Serialize)]
struct AuthBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// Obtain a bearer token scoped to `claim` (for example `enquiry` or
/// `transfer`).
pub async fn get_token(
    config: &TransferConfig,
    username: &str,
    password: &str,
    claim: &str,
) -> Result<String, TransferError> {
    let transport = ReqwestTransport::new(config.timeout())?;
    fetch_token(&transport, config, username, password, claim).await
}

async fn fetch_token(
    transport: &dyn HttpTransport,
    config: &TransferConfig,
    username: &str,
    password: &str,
    claim: &str,
) -> Result<String, TransferError> {
    let url = format!("{}/authToken?claim={}", config.api_base_url, claim);
    let body = serde_json::to_string(&AuthBody { username, password }).map_err(|e| {
        TransferError::Unexpected {
            kind: "serialize".to_string(),
            message: e.to_string(),
        }
    })?;

    let request = HttpRequest {
        method: "POST".to_string(),
        url: url.clone(),
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body,
    };

    let response = transport
        .send(&request)
        .await
        .map_err(|failure| classify_transport_failure(failure, &url, config.timeout_secs))?;

    if !response.is_success() {
        return Err(TransferError::HttpError {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: AuthResponse = serde_json::from_str(&response.body)
        .map_err(|e| TransferError::ResponseParse(e.to_string()))?;

    info!(claim, "Authentication succeeded");
    Ok(parsed.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HttpResponse, MockTransport, TransportError};

    fn test_config() -> TransferConfig {
        TransferConfig {
            api_base_url: "http://testserver".to_string(),
            ..TransferConfig::default()
        }
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let config = test_config();
        let mock = MockTransport::new();
        mock.enqueue(Ok(HttpResponse {
            status: 200,
            body: r#"{"token":"jwt-abc"}"#.to_string(),
        }));

        let token = fetch_token(&mock, &config, "alice", "s3cret", "enquiry")
            .await
            .unwrap();
        assert_eq!(token, "jwt-abc");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].url, "http://testserver/authToken?claim=enquiry");
        let sent: serde_json::Value = serde_json::from_str(&calls[0].body).unwrap();
        assert_eq!(sent["username"], "alice");
        assert_eq!(sent["password"], "s3cret");
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let config = test_config();
        let mock = MockTransport::new();
        mock.enqueue(Ok(HttpResponse {
            status: 401,
            body: "bad credentials".to_string(),
        }));

        let err = fetch_token(&mock, &config, "alice", "wrong", "enquiry")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::HttpError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_missing_token_field() {
        let config = test_config();
        let mock = MockTransport::new();
        mock.enqueue(Ok(HttpResponse {
            status: 200,
            body: r#"{"expiresIn":3600}"#.to_string(),
        }));

        let err = fetch_token(&mock, &config, "alice", "s3cret", "enquiry")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_auth_endpoint() {
        let config = test_config();
        let mock = MockTransport::new();
        mock.enqueue(Err(TransportError::Connect("refused".into())));

        let err = fetch_token(&mock, &config, "alice", "s3cret", "enquiry")
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::ConnectionFailed(_)));
    }
}
