use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated actor returned by `GET /admin/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Backend identifier; accepts the `_id` spelling as well.
    #[serde(alias = "_id")]
    pub id: String,

    /// Display name.
    pub username: String,

    /// Account email address.
    pub email: String,

    /// Role label as issued by the backend (e.g. `admin`).
    pub role: String,
}

/// Credentials submitted to `POST /login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,

    /// Plain-text password, sent only over the login request.
    pub password: String,
}

impl LoginRequest {
    /// Builds a login request from an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
