use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use shared::{
    config::ConsoleConfig,
    models::{ImageUpload, ProductDraft, ProductPatch, ProductStatus},
};

use super::{
    blogs::read_image,
    session::{explain, require_session},
};

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// List the catalog
    List,
    /// Add a product
    Create(CreateProductArgs),
    /// Change selected fields of a product
    Update(UpdateProductArgs),
    /// Remove a product
    Delete {
        /// Product identifier
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateProductArgs {
    #[arg(long, short, help = "Product name")]
    pub name: String,

    #[arg(long, short, help = "Product description")]
    pub description: String,

    #[arg(long, short, help = "Unit price (e.g., 19.99)")]
    pub price: f64,

    #[arg(long, short, help = "Units in stock")]
    pub stock: u32,

    #[arg(long, short, help = "Catalog category")]
    pub category: String,

    #[arg(long, help = "One of active, inactive, draft, discontinued")]
    pub status: Option<ProductStatus>,

    #[arg(long, short, help = "Path to a product image; repeat for several")]
    pub image: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UpdateProductArgs {
    /// Product identifier
    pub id: String,

    #[arg(long, short, help = "New name")]
    pub name: Option<String>,

    #[arg(long, short, help = "New description")]
    pub description: Option<String>,

    #[arg(long, short, help = "New unit price")]
    pub price: Option<f64>,

    #[arg(long, short, help = "New stock count")]
    pub stock: Option<u32>,

    #[arg(long, short, help = "New category")]
    pub category: Option<String>,

    #[arg(long, help = "New status")]
    pub status: Option<ProductStatus>,

    #[arg(long, short, help = "Path to an additional image; repeat for several")]
    pub image: Vec<PathBuf>,
}

fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>> {
    paths.iter().map(|path| read_image(path)).collect()
}

pub async fn run(command: ProductCommand, config: &ConsoleConfig) -> Result<()> {
    let session = require_session(config).await?;
    let client = session.client;

    match command {
        ProductCommand::List => {
            let products = client.list_products().await.map_err(explain)?;
            if products.is_empty() {
                println!("No products yet.");
            }
            for product in &products {
                println!(
                    "{}  {}  {:.2}  stock {}  [{}]",
                    product.id, product.name, product.price, product.stock, product.status
                );
                if let Some(url) = client.product_primary_image_url(product) {
                    println!("    image: {url}");
                }
            }
        }
        ProductCommand::Create(args) => {
            let draft = ProductDraft {
                name: args.name,
                description: args.description,
                price: args.price,
                stock: args.stock,
                category: args.category,
                status: args.status,
            };
            let images = read_images(&args.image)?;
            let product = client
                .create_product(&draft, &images)
                .await
                .map_err(explain)?;
            println!("Created product {}", product.id);
        }
        ProductCommand::Update(args) => {
            let patch = ProductPatch {
                name: args.name,
                description: args.description,
                price: args.price,
                stock: args.stock,
                category: args.category,
                status: args.status,
            };
            let images = read_images(&args.image)?;
            if patch.form_fields().is_empty() && images.is_empty() {
                bail!("nothing to update; pass at least one field or --image");
            }
            let product = client
                .update_product(&args.id, &patch, &images)
                .await
                .map_err(explain)?;
            println!("Updated product {}", product.id);
        }
        ProductCommand::Delete { id } => {
            client.delete_product(&id).await.map_err(explain)?;
            println!("Deleted product {id}");
        }
    }
    Ok(())
}
