//! Delegated teacher authentication.
//!
//! The service does not authenticate callers itself. It forwards the
//! caller's request headers to the users service's check-login endpoint
//! and trusts the teacher id it answers with.
//!
//! # Contract
//!
//! - `2xx` with `{ "user": { "id": <number or string> } }`: authenticated.
//! - any other status with `{ "error": <payload> }`: rejected. Status and
//!   payload are relayed to the caller unchanged.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ExerciseError, Result};
use crate::exercise::TeacherId;

/// Resolves request credentials to a teacher.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Identifies the teacher behind `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`ExerciseError::Auth`] if the caller is not an authenticated
    /// teacher, or [`ExerciseError::IdentityUnavailable`] if the identity
    /// service cannot answer.
    async fn identify(&self, credentials: &HeaderMap) -> Result<TeacherId>;
}

#[derive(Debug, Deserialize)]
struct CheckLoginResponse {
    user: CheckLoginUser,
}

#[derive(Debug, Deserialize)]
struct CheckLoginUser {
    id: TeacherId,
}

#[derive(Debug, Default, Deserialize)]
struct CheckLoginFailure {
    #[serde(default)]
    error: serde_json::Value,
}

/// [`Authenticator`] backed by the users service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    check_login_url: String,
    http_client: reqwest::Client,
}

impl HttpAuthenticator {
    /// Creates an authenticator calling `check_login_url`, giving up on each
    /// call after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::ConfigValidationError` if the HTTP client
    /// cannot be built.
    pub fn new(check_login_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ExerciseError::config_validation(
                    format!("cannot build the identity service client: {e}"),
                    "Check authTimeoutSeconds and the TLS setup of this host",
                )
            })?;

        Ok(Self {
            check_login_url: check_login_url.into(),
            http_client,
        })
    }

    /// Creates an authenticator from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::ConfigValidationError` if the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.check_login_url(),
            Duration::from_secs(u64::from(config.auth_timeout_seconds)),
        )
    }

    /// The endpoint this authenticator calls.
    #[must_use]
    pub fn check_login_url(&self) -> &str {
        &self.check_login_url
    }
}

/// Copies the caller's headers, minus the ones describing the inbound
/// connection or body.
fn forwarded_headers(credentials: &HeaderMap) -> HeaderMap {
    let mut headers = credentials.clone();
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(&name);
    }
    headers
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn identify(&self, credentials: &HeaderMap) -> Result<TeacherId> {
        let response = self
            .http_client
            .get(&self.check_login_url)
            .headers(forwarded_headers(credentials))
            .send()
            .await
            .map_err(|e| ExerciseError::identity_unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ExerciseError::identity_unavailable(e.to_string()))?;

        if status.is_success() {
            let login: CheckLoginResponse = serde_json::from_slice(&body).map_err(|e| {
                ExerciseError::identity_unavailable(format!("unreadable check-login response: {e}"))
            })?;
            debug!(teacher_id = %login.user.id, "Teacher authenticated");
            return Ok(login.user.id);
        }

        let failure: CheckLoginFailure = serde_json::from_slice(&body).unwrap_or_default();
        warn!(status = status.as_u16(), "Identity service rejected caller");
        Err(ExerciseError::auth(status.as_u16(), failure.error))
    }
}
