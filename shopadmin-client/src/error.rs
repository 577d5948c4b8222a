use reqwest::StatusCode;
use thiserror::Error;

/// Message carried by every authentication failure. Views match on it to
/// send the user back to the login page.
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required. Please log in.";

/// Backend operations, used to pick fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /login`
    Login,
    /// `POST /logout`
    Logout,
    /// `GET /blogs`
    FetchBlogs,
    /// `POST /blogs`
    CreateBlog,
    /// `POST /blogs/update/:id`
    UpdateBlog,
    /// `DELETE /blogs/delete/:id`
    DeleteBlog,
    /// `POST /blogs/like/:id`
    ToggleLike,
    /// `GET /products`
    FetchProducts,
    /// `POST /products`
    CreateProduct,
    /// `POST /products/update/:id`
    UpdateProduct,
    /// `DELETE /products/delete/:id`
    DeleteProduct,
}

impl Operation {
    /// Generic message used when the backend gives no usable text.
    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed",
            Self::Logout => "Logout failed",
            Self::FetchBlogs => "Failed to fetch blogs",
            Self::CreateBlog => "Failed to create blog",
            Self::UpdateBlog => "Failed to update blog",
            Self::DeleteBlog => "Failed to delete blog",
            Self::ToggleLike => "Failed to toggle like",
            Self::FetchProducts => "Failed to fetch products",
            Self::CreateProduct => "Failed to create product",
            Self::UpdateProduct => "Failed to update product",
            Self::DeleteProduct => "Failed to delete product",
        }
    }

    /// Fallback for a failed status. Listing products also names the status.
    #[must_use]
    pub fn fallback_for_status(self, status: StatusCode) -> String {
        match self {
            Self::FetchProducts => format!("{}: {}", self.fallback_message(), status.as_u16()),
            _ => self.fallback_message().to_string(),
        }
    }
}

/// Failure of a wrapped backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 401; the caller should route to the login page.
    #[error("Authentication required. Please log in.")]
    AuthenticationRequired,

    /// Any other non-success status, carrying the backend's text when it
    /// sent one.
    #[error("{message}")]
    Backend {
        /// Operation that failed.
        operation: Operation,
        /// Status returned by the backend.
        status: StatusCode,
        /// User-facing message.
        message: String,
    },

    /// The request never produced a response.
    #[error("{}", .operation.fallback_message())]
    Transport {
        /// Operation that failed.
        operation: Operation,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A success response carried a body that did not match the expected
    /// shape.
    #[error("{}", .operation.fallback_message())]
    Decode {
        /// Operation that failed.
        operation: Operation,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The backend base URL is missing. Not recoverable by retrying.
    #[error("{0} is not set")]
    Configuration(&'static str),

    /// The HTTP client or a request part could not be built.
    #[error("failed to build HTTP request: {0}")]
    Build(#[source] reqwest::Error),
}

impl ApiError {
    /// Whether the caller should send the user to the login page.
    #[must_use]
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }

    /// HTTP status behind the failure, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::AuthenticationRequired => Some(StatusCode::UNAUTHORIZED),
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}
