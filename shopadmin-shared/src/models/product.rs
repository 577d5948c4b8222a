use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Reads a missing or `null` field as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lifecycle state of a catalog product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Listed and purchasable.
    #[default]
    Active,
    /// Hidden from the storefront.
    Inactive,
    /// Not yet published.
    Draft,
    /// Permanently withdrawn.
    Discontinued,
    /// A state this console does not know; listings keep the record.
    #[serde(other)]
    Unknown,
}

impl ProductStatus {
    /// Wire representation expected by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Draft => "draft",
            Self::Discontinued => "discontinued",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "draft" => Ok(Self::Draft),
            "discontinued" => Ok(Self::Discontinued),
            _ => Err("unknown product status"),
        }
    }
}

/// An image attached to a product. `url` is the stored filename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductImage {
    /// Stored filename, servable under `/uploads/products/`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// Alternative text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Marks the image shown in listings.
    #[serde(
        rename = "isPrimary",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_primary: Option<bool>,
}

/// A catalog product as stored by the backend.
///
/// Only `_id` is required. Other fields that are missing or `null` read as
/// their defaults so one odd record cannot fail a whole listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Backend identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// URL slug, when the backend generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Long description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Unit price.
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    /// Units in stock. Signed: the backend does not forbid oversold counts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i64,
    /// Category label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    /// Lifecycle state.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ProductStatus,
    /// Attached images.
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ProductImage>,
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

impl Product {
    /// The image flagged primary, else the first one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|image| image.is_primary == Some(true))
            .or_else(|| self.images.first())
    }
}

/// Fields for `POST /products`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub stock: u32,
    /// Category label.
    pub category: String,
    /// Initial state; the backend picks one when absent.
    pub status: Option<ProductStatus>,
}

impl ProductDraft {
    /// Stringified multipart fields, in wire order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("price", self.price.to_string()),
            ("stock", self.stock.to_string()),
            ("category", self.category.clone()),
        ];
        if let Some(status) = self.status {
            fields.push(("status", status.to_string()));
        }
        fields
    }
}

/// Partial update for `POST /products/update/:id`. Unset fields are omitted
/// from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New unit price.
    pub price: Option<f64>,
    /// New stock level.
    pub stock: Option<u32>,
    /// New category label.
    pub category: Option<String>,
    /// New lifecycle state.
    pub status: Option<ProductStatus>,
}

impl ProductPatch {
    /// Stringified multipart fields for every set value, in wire order.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(price) = self.price {
            fields.push(("price", price.to_string()));
        }
        if let Some(stock) = self.stock {
            fields.push(("stock", stock.to_string()));
        }
        if let Some(category) = &self.category {
            fields.push(("category", category.clone()));
        }
        if let Some(status) = self.status {
            fields.push(("status", status.to_string()));
        }
        fields
    }
}
