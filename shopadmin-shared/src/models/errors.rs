use serde::{Deserialize, Serialize};

/// Failure body returned by the backend.
///
/// Resource endpoints report their text under `error`; the login endpoint
/// uses `message`. Either may be missing.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Message reported by resource endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Message reported by the login endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parses a raw response body, yielding an empty body for anything that
    /// is not a JSON object.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        serde_json::from_slice(raw).unwrap_or_default()
    }

    /// The `error` field, ignoring blank values.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        non_blank(self.error.as_deref())
    }

    /// The `message` field, ignoring blank values.
    #[must_use]
    pub fn message_text(&self) -> Option<&str> {
        non_blank(self.message.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_error_field() {
        let body = ErrorBody::parse(br#"{"error":"Product not found"}"#);
        assert_eq!(body.error_text(), Some("Product not found"));
        assert_eq!(body.message_text(), None);
    }

    #[test]
    fn parses_message_field() {
        let body = ErrorBody::parse(br#"{"message":"Invalid credentials"}"#);
        assert_eq!(body.message_text(), Some("Invalid credentials"));
    }

    #[test]
    fn non_json_yields_empty_body() {
        let body = ErrorBody::parse(b"<html>502 Bad Gateway</html>");
        assert_eq!(body, ErrorBody::default());
    }

    #[test]
    fn blank_values_are_ignored() {
        let body = ErrorBody::parse(br#"{"error":"   ","message":""}"#);
        assert_eq!(body.error_text(), None);
        assert_eq!(body.message_text(), None);
    }
}
