//! Product wrappers. These fall back to [`crate::api::DEFAULT_API_URL`] when
//! no origin is configured.

use reqwest::multipart::Form;
use serde::Deserialize;
use shared::models::{ImageUpload, Product, ProductDraft, ProductPatch};
use tracing::{info, instrument};

use crate::{
    api::{AdminClient, file_part},
    error::{ApiError, Operation},
};

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

impl AdminClient {
    /// Lists every product.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let operation = Operation::FetchProducts;
        let response =
            Self::send(operation, self.http().get(self.catalog_url("products"))).await?;
        Self::decode(operation, response).await
    }

    /// Creates a product; each image becomes one `images` part.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self, draft, images), fields(name = %draft.name, images = images.len()))]
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        images: &[ImageUpload],
    ) -> Result<Product, ApiError> {
        let operation = Operation::CreateProduct;
        let form = build_form(draft.form_fields(), images)?;
        let request = self
            .http()
            .post(self.catalog_url("products"))
            .multipart(form);

        let response = Self::send(operation, request).await?;
        let ProductEnvelope { product } = Self::decode(operation, response).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Applies a partial update. Only the fields set on `patch` are sent, and
    /// images are only attached when there are some.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self, patch, images), fields(images = images.len()))]
    pub async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
        images: &[ImageUpload],
    ) -> Result<Product, ApiError> {
        let operation = Operation::UpdateProduct;
        let form = build_form(patch.form_fields(), images)?;
        let request = self
            .http()
            .post(self.catalog_url(&format!("products/update/{id}")))
            .multipart(form);

        let response = Self::send(operation, request).await?;
        let ProductEnvelope { product } = Self::decode(operation, response).await?;
        info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    /// Deletes a product.
    ///
    /// # Errors
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        let request = self
            .http()
            .delete(self.catalog_url(&format!("products/delete/{id}")));
        Self::send(Operation::DeleteProduct, request).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Public URL of the product's primary image, if it has one.
    #[must_use]
    pub fn product_primary_image_url(&self, product: &Product) -> Option<String> {
        let image = product.primary_image()?;
        if image.url.is_empty() {
            return None;
        }
        Some(self.catalog_url(&format!("uploads/products/{}", image.url)))
    }
}

fn build_form(
    fields: Vec<(&'static str, String)>,
    images: &[ImageUpload],
) -> Result<Form, ApiError> {
    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));
    images
        .iter()
        .try_fold(form, |form, image| -> Result<Form, ApiError> {
            Ok(form.part("images", file_part(image)?))
        })
}
