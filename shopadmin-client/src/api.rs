use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    cookie::{CookieStore, Jar},
    multipart::Part,
};
use serde::de::DeserializeOwned;
use shared::{
    config::{ApiConfig, console::API_URL_ENV},
    models::{ErrorBody, ImageUpload},
};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Operation};

/// Origin used by catalog calls when no base URL is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Credentialed client for the console backend.
///
/// Every request goes through one `reqwest` client bound to a shared cookie
/// jar, so the session cookie set by `POST /login` rides along on every
/// later call.
#[derive(Clone, Debug)]
pub struct AdminClient {
    base_url: Option<String>,
    client: Client,
    jar: Arc<Jar>,
}

impl AdminClient {
    /// Builds a client over the given cookie jar.
    ///
    /// # Errors
    /// Returns [`ApiError::Build`] when the HTTP client cannot be created.
    pub fn new(config: &ApiConfig, jar: Arc<Jar>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self {
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.as_str().trim_end_matches('/').to_string()),
            client,
            jar,
        })
    }

    /// Configured backend origin, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Cookie jar shared by every request.
    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// `Cookie` header value the jar would send to the backend, if any.
    #[must_use]
    pub fn session_cookies(&self) -> Option<String> {
        let origin = Url::parse(self.catalog_base()).ok()?;
        self.jar
            .cookies(&origin)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// URL under the configured origin; fails when no origin is configured.
    pub(crate) fn configured_url(&self, path: &str) -> Result<String, ApiError> {
        self.base_url
            .as_deref()
            .map(|base| join(base, path))
            .ok_or(ApiError::Configuration(API_URL_ENV))
    }

    /// URL under the configured origin or [`DEFAULT_API_URL`].
    pub(crate) fn catalog_url(&self, path: &str) -> String {
        join(self.catalog_base(), path)
    }

    fn catalog_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Sends a request and normalizes any failure status.
    pub(crate) async fn send(
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        Self::check(operation, response).await
    }

    /// Maps 401 to [`ApiError::AuthenticationRequired`] and other failures to
    /// [`ApiError::Backend`] with the backend's `error` text when present.
    pub(crate) async fn check(
        operation: Operation,
        response: Response,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            debug!(?operation, "backend rejected the session");
            return Err(ApiError::AuthenticationRequired);
        }

        let raw = response.bytes().await.unwrap_or_default();
        let body = ErrorBody::parse(&raw);
        let message = body
            .error_text()
            .map_or_else(|| operation.fallback_for_status(status), str::to_string);
        debug!(?operation, %status, %message, "backend call failed");
        Err(ApiError::Backend {
            operation,
            status,
            message,
        })
    }

    /// Reads and decodes a success body.
    pub(crate) async fn decode<T: DeserializeOwned>(
        operation: Operation,
        response: Response,
    ) -> Result<T, ApiError> {
        let raw = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        serde_json::from_slice(&raw).map_err(|source| ApiError::Decode { operation, source })
    }
}

/// Converts an upload into a multipart file part.
pub(crate) fn file_part(upload: &ImageUpload) -> Result<Part, ApiError> {
    Part::bytes(upload.bytes.clone())
        .file_name(upload.file_name.clone())
        .mime_str(&upload.content_type)
        .map_err(ApiError::Build)
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: Option<&str>) -> AdminClient {
        let config = ApiConfig {
            base_url: base.map(|raw| Url::parse(raw).unwrap()),
            ..ApiConfig::default()
        };
        AdminClient::new(&config, Arc::new(Jar::default())).unwrap()
    }

    #[test]
    fn configured_url_joins_without_double_slashes() {
        let client = client(Some("https://api.example.com/v1/"));
        assert_eq!(
            client.configured_url("/blogs").unwrap(),
            "https://api.example.com/v1/blogs"
        );
    }

    #[test]
    fn configured_url_requires_base() {
        let err = client(None).configured_url("blogs").unwrap_err();
        assert!(matches!(err, ApiError::Configuration(name) if name == API_URL_ENV));
    }

    #[test]
    fn catalog_url_falls_back_to_default_origin() {
        assert_eq!(
            client(None).catalog_url("products"),
            "http://localhost:5000/products"
        );
        assert_eq!(
            client(Some("http://shop.test")).catalog_url("products"),
            "http://shop.test/products"
        );
    }

    #[test]
    fn session_cookies_reflect_jar_contents() {
        let client = client(Some("http://shop.test"));
        assert!(client.session_cookies().is_none());

        let origin = Url::parse("http://shop.test").unwrap();
        client.jar().add_cookie_str("token=abc; Path=/", &origin);
        assert_eq!(client.session_cookies().as_deref(), Some("token=abc"));
    }

    #[test]
    fn file_part_accepts_inferred_mime() {
        let upload = ImageUpload::new("cover.png", vec![0x89, 0x50]);
        assert!(file_part(&upload).is_ok());
    }
}
