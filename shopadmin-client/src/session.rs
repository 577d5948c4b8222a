//! Session resolution and the seam between the auth store and the network.

use async_trait::async_trait;
use shared::models::{ErrorBody, Identity, LoginRequest};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    api::AdminClient,
    error::{ApiError, Operation},
};

/// The backend could not confirm a session.
///
/// Missing cookie, expired session, server error, and unreachable backend all
/// collapse into this one outcome. `reason` is kept for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("not authenticated: {reason}")]
pub struct Unauthenticated {
    /// Why resolution failed.
    pub reason: String,
}

impl Unauthenticated {
    /// Wraps a failure description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure of an explicit sign-in.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The backend refused the credentials; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Another sign-in or session check is still running.
    #[error("another sign-in or session check is already in progress")]
    InProgress,

    /// Credentials were accepted but the follow-up profile lookup failed.
    #[error("signed in, but the session could not be confirmed ({0})")]
    SessionNotEstablished(Unauthenticated),

    /// A newer session change (such as a logout) overtook this sign-in.
    #[error("sign-in was superseded by a newer session change")]
    Superseded,

    /// The request could not be issued at all.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Network operations the auth store depends on.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Asks the backend who the current session belongs to.
    async fn resolve(&self) -> Result<Identity, Unauthenticated>;

    /// Submits credentials; the backend sets the session cookie on success.
    async fn login(&self, credentials: &LoginRequest) -> Result<(), LoginError>;

    /// Invalidates the current session on the backend.
    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl SessionBackend for AdminClient {
    #[instrument(skip(self))]
    async fn resolve(&self) -> Result<Identity, Unauthenticated> {
        let url = self
            .configured_url("admin/profile")
            .map_err(|err| Unauthenticated::new(err.to_string()))?;

        let response = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(|err| Unauthenticated::new(format!("profile request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "profile lookup rejected");
            return Err(Unauthenticated::new(format!(
                "profile request returned {status}"
            )));
        }

        let raw = response
            .bytes()
            .await
            .map_err(|err| Unauthenticated::new(format!("profile body unreadable: {err}")))?;
        serde_json::from_slice::<Identity>(&raw)
            .map_err(|err| Unauthenticated::new(format!("profile body malformed: {err}")))
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &LoginRequest) -> Result<(), LoginError> {
        let operation = Operation::Login;
        let url = self.configured_url("login")?;
        let response = self
            .http()
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let raw = response.bytes().await.unwrap_or_default();
        let body = ErrorBody::parse(&raw);
        let message = body
            .message_text()
            .or_else(|| body.error_text())
            .unwrap_or(operation.fallback_message())
            .to_string();
        debug!(%status, %message, "login rejected");
        Err(LoginError::Rejected(message))
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.configured_url("logout")?;
        Self::send(Operation::Logout, self.http().post(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::Jar;
    use shared::config::ApiConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn resolve_without_base_url_is_unauthenticated() {
        let client = AdminClient::new(&ApiConfig::default(), Arc::new(Jar::default())).unwrap();
        let err = client.resolve().await.unwrap_err();
        assert!(err.reason.contains("is not set"));
    }

    #[tokio::test]
    async fn login_without_base_url_is_configuration_error() {
        let client = AdminClient::new(&ApiConfig::default(), Arc::new(Jar::default())).unwrap();
        let err = client
            .login(&LoginRequest::new("a@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::Api(ApiError::Configuration(_))));
    }

    #[test]
    fn rejected_login_displays_backend_text() {
        let err = LoginError::Rejected("Invalid credentials".into());
        assert_eq!(err.to_string(), "Invalid credentials");
    }
}
