//! Session cookie redirect filter.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;
use percent_encoding::percent_decode_str;
use shared::config::SessionConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Request data the filter could not read. Either one fails closed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A `Cookie` header held bytes outside visible ASCII.
    #[error("cookie header is not valid UTF-8")]
    CookieNotUtf8,
    /// The request path percent-decodes to invalid UTF-8.
    #[error("request path does not decode to UTF-8")]
    PathNotUtf8,
}

/// Reduces a request path to the form the page server resolves.
///
/// The path is percent-decoded, empty and `.` segments are dropped, and `..`
/// removes the previous segment. A trailing slash is kept.
///
/// # Errors
/// [`FilterError::PathNotUtf8`] when the decoded bytes are not UTF-8.
pub fn normalize_path(raw: &str) -> Result<String, FilterError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| FilterError::PathNotUtf8)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if !segments.is_empty() && (decoded.ends_with('/') || decoded.ends_with("/.")) {
        normalized.push('/');
    }
    Ok(normalized)
}

/// What the filter decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the request through to the page handler.
    Pass,
    /// Send the visitor to this path instead.
    Redirect(String),
}

/// Presence check for the session cookie on protected paths.
#[derive(Debug, Clone)]
pub struct EdgeFilter {
    protected_prefix: String,
    cookie_name: String,
    login_path: String,
}

impl EdgeFilter {
    /// Builds a filter guarding `protected_prefix`.
    pub fn new(
        protected_prefix: impl Into<String>,
        cookie_name: impl Into<String>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            protected_prefix: protected_prefix.into(),
            cookie_name: cookie_name.into(),
            login_path: login_path.into(),
        }
    }

    /// Builds a filter from the session section of the configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.protected_prefix.clone(),
            config.cookie_name.clone(),
            config.login_path.clone(),
        )
    }

    /// `/dashboard` and `/dashboard/...` are protected; `/dashboardx` is not.
    ///
    /// The raw path is normalized first, so `/%64ashboard` and
    /// `//dashboard` are protected too. An undecodable path counts as
    /// protected.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        normalize_path(path).map_or(true, |path| self.covers(&path))
    }

    fn covers(&self, normalized: &str) -> bool {
        normalized
            .strip_prefix(self.protected_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Decides a request from its raw path and headers.
    ///
    /// Any problem reading the path or the cookies counts as "no session".
    #[must_use]
    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> Verdict {
        match normalize_path(path) {
            Ok(normalized) if !self.covers(&normalized) => return Verdict::Pass,
            Ok(_) => {}
            Err(err) => {
                warn!(path, error = %err, "unreadable request path");
                return Verdict::Redirect(self.login_path.clone());
            }
        }

        match self.has_session_cookie(headers) {
            Ok(true) => Verdict::Pass,
            Ok(false) => {
                debug!(path, "no session cookie on protected path");
                Verdict::Redirect(self.login_path.clone())
            }
            Err(err) => {
                warn!(path, error = %err, "unreadable cookies on protected path");
                Verdict::Redirect(self.login_path.clone())
            }
        }
    }

    fn has_session_cookie(&self, headers: &HeaderMap) -> Result<bool, FilterError> {
        for value in headers.get_all(header::COOKIE) {
            let raw = value.to_str().map_err(|_| FilterError::CookieNotUtf8)?;
            if Cookie::split_parse(raw)
                .flatten()
                .any(|cookie| cookie.name() == self.cookie_name)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Middleware answering `307` towards the login page when a protected path
/// arrives without the session cookie.
pub async fn enforce_session_cookie(
    State(filter): State<EdgeFilter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match filter.evaluate(request.uri().path(), request.headers()) {
        Verdict::Pass => next.run(request).await,
        Verdict::Redirect(location) => Redirect::temporary(&location).into_response(),
    }
}
