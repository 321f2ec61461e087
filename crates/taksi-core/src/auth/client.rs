//! Login client for the user service.
//!
//! Performs the authentication request and classifies the outcome. The
//! client never touches durable storage; persistence belongs to the
//! [`SessionStore`](super::store::SessionStore) so login logic stays
//! testable on its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NormalizedPhone, Session, UserProfile};
use crate::config::Config;

/// Path of the authentication endpoint on the API gateway.
const LOGIN_PATH: &str = "/api/users/login";

/// Shown when the server declines credentials without a message body.
const DEFAULT_REJECTION_MESSAGE: &str = "Login failed";

/// Login failure, split by who can fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Server declined the credentials. Carries the server-supplied
    /// message when present. User-correctable.
    Rejected(String),
    /// Network unreachable, timeout, or malformed response body.
    /// Retryable.
    Transport(String),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::Rejected(message) => write!(f, "{message}"),
            LoginError::Transport(message) => {
                write!(f, "Connection error, please try again: {message}")
            }
        }
    }
}

impl std::error::Error for LoginError {}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    phone: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

/// Authentication client for the user service.
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthClient {
    /// Creates a client from the resolved configuration.
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if the base URL is the
    ///   production default.
    /// - At runtime, panics if `TAKSI_BLOCK_REAL_API=1` and the base URL
    ///   is the production default.
    ///
    /// This prevents tests from accidentally making real network requests.
    /// Point `TAKSI_API_BASE_URL` at a mock server instead.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = config.resolve_api_base_url()?;

        #[cfg(test)]
        assert!(
            base_url != Config::DEFAULT_API_BASE_URL,
            "Tests must not use the default API gateway!\n\
             Set TAKSI_API_BASE_URL to a mock server (e.g., wiremock).\n\
             Found base_url: {base_url}"
        );

        #[cfg(not(test))]
        if std::env::var("TAKSI_BLOCK_REAL_API").is_ok_and(|v| v == "1")
            && base_url == Config::DEFAULT_API_BASE_URL
        {
            panic!(
                "TAKSI_BLOCK_REAL_API=1 but trying to use the default API gateway!\n\
                 Set TAKSI_API_BASE_URL to a mock server.\n\
                 Found base_url: {base_url}"
            );
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { base_url, http })
    }

    /// Sends the login request and interprets the response.
    ///
    /// Success decodes `{token, user}` into a [`Session`]. A non-2xx
    /// status becomes [`LoginError::Rejected`] with the server message;
    /// anything transport-shaped becomes [`LoginError::Transport`].
    pub async fn login(
        &self,
        phone: &NormalizedPhone,
        password: &str,
    ) -> Result<Session, LoginError> {
        let url = format!("{}{LOGIN_PATH}", self.base_url);
        tracing::debug!(phone = %phone, "sending login request");

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                phone: phone.as_str(),
                password,
            })
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.is_success() {
            let body: LoginResponse = response
                .json()
                .await
                .map_err(|e| LoginError::Transport(format!("Malformed login response: {e}")))?;
            tracing::debug!(token = %mask_token(&body.token), "login accepted");
            return Ok(Session {
                token: body.token,
                user: body.user,
            });
        }

        // Rejection bodies are `{message}`; tolerate anything else.
        let message = response
            .json::<RejectionBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string());
        tracing::debug!(status = %status, "login rejected");
        Err(LoginError::Rejected(message))
    }
}

fn classify_send_error(e: reqwest::Error) -> LoginError {
    if e.is_timeout() {
        LoginError::Transport(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        LoginError::Transport(format!("Connection failed: {e}"))
    } else {
        LoginError::Transport(format!("Network error: {e}"))
    }
}

/// Returns a masked version of a token for display (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    format!("{}...", &token[..8])
}
