//! Error taxonomy shared by the auth and API layers.
//!
//! Transport code never recovers errors - it normalizes server responses
//! into these variants and forwards them. Recovery policy (forced logout on
//! refresh failure, suppressed logout errors) lives in the session manager.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials or token rejected by the server (401/403).
    /// The message is shown verbatim to the user.
    #[error("{0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Secure storage error: {0}")]
    Storage(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<keyring::Error> for Error {
    fn from(err: keyring::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Error responses carry an optional `message` field in the JSON body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl Error {
    /// Map a non-success HTTP status to an error variant.
    ///
    /// The server-provided `message` is used when present, otherwise the
    /// fixed per-operation default.
    pub fn from_status(status: reqwest::StatusCode, body: &str, default_message: &str) -> Self {
        let message = server_message(body, default_message);
        match status.as_u16() {
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            500..=599 => Error::Server(message),
            _ => Error::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}

/// Extract the `message` field from an error body, falling back to a default.
fn server_message(body: &str, default: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a JSON response body, labelling parse failures with the operation.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::InvalidResponse(format!("{}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_server_message() {
        let err = Error::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid email or password"}"#,
            "Login failed",
        );
        match err {
            Error::Auth(msg) => assert_eq!(msg, "Invalid email or password"),
            other => panic!("expected Auth, got {:?}", other),
        }
    }

    #[test]
    fn test_from_status_falls_back_to_default() {
        // Empty body, non-JSON body, and empty message all fall back
        for body in ["", "<html>bad gateway</html>", r#"{"message":""}"#] {
            let err = Error::from_status(StatusCode::UNAUTHORIZED, body, "Login failed");
            match err {
                Error::Auth(msg) => assert_eq!(msg, "Login failed"),
                other => panic!("expected Auth, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            Error::from_status(StatusCode::NOT_FOUND, "{}", "Book not found"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::INTERNAL_SERVER_ERROR, "{}", "oops"),
            Error::Server(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::FORBIDDEN, "{}", "denied"),
            Error::Auth(_)
        ));
        // Anything unexpected keeps the status visible
        match Error::from_status(StatusCode::IM_A_TEAPOT, "{}", "odd") {
            Error::InvalidResponse(msg) => assert!(msg.contains("418")),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }
}
