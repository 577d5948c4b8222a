//! Blog wrappers. All of them require a configured backend origin.

use reqwest::multipart::Form;
use serde::Deserialize;
use shared::models::{Blog, BlogDraft, BlogPatch, LikeSummary};
use tracing::{debug, info, instrument};

use crate::{
    api::{AdminClient, file_part},
    error::{ApiError, Operation},
};

/// `GET /blogs` answers either a bare array or `{ "blogs": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BlogListing {
    Bare(Vec<Blog>),
    Wrapped {
        #[serde(default)]
        blogs: Vec<Blog>,
    },
}

/// Create and update answer with the record wrapped under `blog`, under
/// `UpdateBlog`, or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum BlogEnvelope {
    Wrapped {
        blog: Blog,
    },
    Updated {
        #[serde(rename = "UpdateBlog")]
        update_blog: Blog,
    },
    Bare(Blog),
}

impl BlogEnvelope {
    fn into_blog(self) -> Blog {
        match self {
            Self::Wrapped { blog } | Self::Bare(blog) => blog,
            Self::Updated { update_blog } => update_blog,
        }
    }
}

fn updated_record(raw: &[u8]) -> Option<Blog> {
    serde_json::from_slice::<BlogEnvelope>(raw)
        .ok()
        .map(BlogEnvelope::into_blog)
}

impl AdminClient {
    /// Lists every blog post.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        let operation = Operation::FetchBlogs;
        let url = self.configured_url("blogs")?;
        let response = Self::send(operation, self.http().get(url)).await?;
        let listing: BlogListing = Self::decode(operation, response).await?;
        Ok(match listing {
            BlogListing::Bare(blogs) | BlogListing::Wrapped { blogs } => blogs,
        })
    }

    /// Creates a post with its featured image.
    ///
    /// The response must carry the stored record, since callers need its id.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_blog(&self, draft: &BlogDraft) -> Result<Blog, ApiError> {
        let operation = Operation::CreateBlog;
        let url = self.configured_url("blogs")?;
        let form = Form::new()
            .text("title", draft.title.clone())
            .text("content", draft.content.clone())
            .part("featured_image", file_part(&draft.featured_image)?);

        let response = Self::send(operation, self.http().post(url).multipart(form)).await?;
        let blog = Self::decode::<BlogEnvelope>(operation, response)
            .await?
            .into_blog();
        info!(blog_id = %blog.id, "blog created");
        Ok(blog)
    }

    /// Applies a partial update; unset and empty fields are left out.
    ///
    /// Returns the updated record when the backend echoes one, and `None`
    /// when a success body carries none (such as a bare `message`).
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self, patch))]
    pub async fn update_blog(
        &self,
        id: &str,
        patch: &BlogPatch,
    ) -> Result<Option<Blog>, ApiError> {
        let operation = Operation::UpdateBlog;
        let url = self.configured_url(&format!("blogs/update/{id}"))?;
        let mut form = patch
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        if let Some(image) = &patch.featured_image {
            form = form.part("featured_image", file_part(image)?);
        }

        let response = Self::send(operation, self.http().post(url).multipart(form)).await?;
        let raw = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        let blog = updated_record(&raw);
        if blog.is_none() {
            debug!(blog_id = %id, "update response carried no record");
        }
        info!(blog_id = %id, "blog updated");
        Ok(blog)
    }

    /// Deletes a post.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn delete_blog(&self, id: &str) -> Result<(), ApiError> {
        let url = self.configured_url(&format!("blogs/delete/{id}"))?;
        Self::send(Operation::DeleteBlog, self.http().delete(url)).await?;
        info!(blog_id = %id, "blog deleted");
        Ok(())
    }

    /// Toggles the current user's like on a post and returns the new count.
    /// A body without a count reads as zero likes.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn toggle_blog_like(&self, id: &str) -> Result<LikeSummary, ApiError> {
        let operation = Operation::ToggleLike;
        let url = self.configured_url(&format!("blogs/like/{id}"))?;
        let response = Self::send(operation, self.http().post(url)).await?;
        let raw = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;
        Ok(serde_json::from_slice(&raw).unwrap_or_default())
    }

    /// Public URL of a stored featured image.
    ///
    /// Empty when there is no image; the bare filename when no origin is
    /// configured.
    #[must_use]
    pub fn blog_image_url(&self, featured_image: Option<&str>) -> String {
        match (featured_image, self.base_url()) {
            (None | Some(""), _) => String::new(),
            (Some(name), None) => name.to_string(),
            (Some(name), Some(base)) => format!("{base}/uploads/images/{name}"),
        }
    }
}
