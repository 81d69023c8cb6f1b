//! HTTP transport for the auth endpoints.
//!
//! Each call sends one request and normalizes the response into the crate
//! error taxonomy. No retries and no recovery here - the session manager
//! owns that policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{parse_json, Error, Result};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token pair returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Transport seam for the session manager. One method per auth operation
/// the session lifecycle depends on; each is independently retriable by
/// the caller.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Exchange credentials for a token pair.
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair>;

    /// Invalidate the session server-side. Callers treat failure as
    /// non-fatal.
    async fn logout(&self, access_token: &str) -> Result<()>;

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Auth transport backed by the DineBook auth endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAuthTransport {
    client: Client,
    base_url: String,
}

impl HttpAuthTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Build on an existing client, sharing its connection pool.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and return the raw response body, mapping
    /// non-success statuses through the error taxonomy.
    async fn post_checked<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_error: &str,
    ) -> Result<String> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::from_status(status, &text, default_error));
        }
        Ok(text)
    }

    /// POST for endpoints that only return a human-readable message.
    async fn post_for_message<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        default_error: &str,
    ) -> Result<String> {
        let text = self.post_checked(path, body, default_error).await?;
        let parsed: MessageResponse = parse_json(&text, path)?;
        Ok(parsed.message.unwrap_or_default())
    }

    // ===== Account management (outside the session lifecycle) =====

    /// Register a new user account.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        self.post_for_message("/register", &body, "Registration failed")
            .await
    }

    /// Verify an email address using the token from the verification link.
    pub async fn verify_email(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url("/verify-email"))
            .query(&[("token", token)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::from_status(status, &text, "Email verification failed"));
        }
        let parsed: MessageResponse = parse_json(&text, "/verify-email")?;
        Ok(parsed.message.unwrap_or_default())
    }

    /// Resend the email verification link.
    pub async fn resend_verification(&self, email: &str) -> Result<String> {
        let body = serde_json::json!({ "email": email });
        self.post_for_message("/resend-verification", &body, "Resend verification failed")
            .await
    }

    /// Request a password reset email.
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let body = serde_json::json!({ "email": email });
        self.post_for_message("/forgot-password", &body, "Password reset request failed")
            .await
    }

    /// Reset the password using the token from the reset email.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String> {
        let body = serde_json::json!({
            "token": token,
            "newPassword": new_password,
        });
        self.post_for_message("/reset-password", &body, "Reset password failed")
            .await
    }
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });
        let text = self.post_checked("/login", &body, "Login failed").await?;
        let tokens: TokenResponse = parse_json(&text, "/login")?;
        Ok(TokenPair {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn logout(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/logout"))
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, &text, "Logout failed"));
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let text = self
            .post_checked("/refresh-token", &body, "Token refresh failed")
            .await?;
        let parsed: RefreshResponse = parse_json(&text, "/refresh-token")?;
        Ok(parsed.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"accessToken":"tok2","refreshToken":"ref2","user":{"id":6}}"#;
        let parsed: TokenResponse = parse_json(json, "/login").unwrap();
        assert_eq!(parsed.access_token, "tok2");
        assert_eq!(parsed.refresh_token, "ref2");
    }

    #[test]
    fn test_parse_refresh_response() {
        let json = r#"{"accessToken":"tok3"}"#;
        let parsed: RefreshResponse = parse_json(json, "/refresh-token").unwrap();
        assert_eq!(parsed.access_token, "tok3");
    }

    #[test]
    fn test_malformed_login_response_is_invalid() {
        let err = parse_json::<TokenResponse>(r#"{"token":"only-one"}"#, "/login").unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
