//! Errors surfaced by [`super::ApiClient`].

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Message used when every attempt failed at the transport level.
pub const RETRIES_EXHAUSTED: &str = "Max retry attempts exceeded";

#[derive(Error, Debug)]
pub enum ClientError {
    /// The final attempt did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with a non-2xx status, or no attempt got an answer at all
    #[error("{message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        response_body: Option<Value>,
    },

    /// A 2xx response whose body is not the expected document, or a body that could not be
    /// encoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built, e.g. an API key that is not a valid header value
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn retries_exhausted() -> Self {
        ClientError::Api {
            message: RETRIES_EXHAUSTED.to_string(),
            status_code: None,
            response_body: None,
        }
    }

    /// Error for a non-2xx response. The message is the body's `detail`, else its `error`, else
    /// `HTTP <status>`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let response_body = serde_json::from_str::<Value>(body).ok();
        let field = |name: &str| {
            response_body
                .as_ref()
                .and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let message = field("detail")
            .or_else(|| field("error"))
            .unwrap_or_else(|| format!("HTTP {status}"));
        ClientError::Api {
            message,
            status_code: Some(status),
            response_body,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"detail": "Brak uprawnień", "error": "Forbidden"}"#, "Brak uprawnień")]
    #[case(r#"{"error": "Law firm with ID x not found"}"#, "Law firm with ID x not found")]
    #[case(r#"{"error": {"code": 1}}"#, "HTTP 404")]
    #[case("<html>gateway</html>", "HTTP 404")]
    #[case("", "HTTP 404")]
    fn test_message_precedence(#[case] body: &str, #[case] expected: &str) {
        let err = ClientError::from_response(404, body);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_response_body_kept_when_json() {
        match ClientError::from_response(400, r#"{"error": "Validation failed", "details": []}"#) {
            ClientError::Api { response_body, .. } => {
                assert_eq!(response_body.unwrap()["details"], serde_json::json!([]));
            }
            other => panic!("unexpected error {other:?}"),
        }
        match ClientError::from_response(502, "Bad Gateway") {
            ClientError::Api { response_body, .. } => assert!(response_body.is_none()),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
