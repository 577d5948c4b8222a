use serde::{Deserialize, Serialize};

use super::ImageUpload;

/// A blog post as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blog {
    /// Backend identifier.
    #[serde(rename = "_id")]
    pub id: String,

    /// Headline.
    pub title: String,

    /// Body text.
    pub content: String,

    /// Stored filename of the featured image, servable under `/uploads/images/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,

    /// Publication status label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Author account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    /// Like counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,

    /// Accounts that liked the post.
    #[serde(default)]
    pub likers: Vec<String>,

    /// Creation timestamp, as reported.
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,

    /// Last update timestamp, as reported.
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

/// Fields for `POST /blogs`. Every field is required.
#[derive(Debug, Clone)]
pub struct BlogDraft {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Featured image, sent as the `featured_image` part.
    pub featured_image: ImageUpload,
}

/// Partial update for `POST /blogs/update/:id`.
///
/// Empty strings count as unset so an untouched form field never clears a
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    /// New headline.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// Replacement featured image.
    pub featured_image: Option<ImageUpload>,
}

impl BlogPatch {
    /// Scalar multipart fields carried by this patch, in wire order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        [("title", &self.title), ("content", &self.content)]
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .map(|text| (name, text.to_string()))
            })
            .collect()
    }

    /// Whether the patch would send nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.form_fields().is_empty() && self.featured_image.is_none()
    }
}

/// Response of `POST /blogs/like/:id`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeSummary {
    /// Like count after the toggle.
    #[serde(default)]
    pub likes: u64,
}
