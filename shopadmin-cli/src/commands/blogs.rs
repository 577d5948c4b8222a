use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use shared::{
    config::ConsoleConfig,
    models::{Blog, BlogDraft, BlogPatch, ImageUpload},
};

use super::session::{explain, require_session};

#[derive(Subcommand, Debug)]
pub enum BlogCommand {
    /// List every post
    List,
    /// Publish a new post with a featured image
    Create(CreateBlogArgs),
    /// Change the title, content, or image of a post
    Update(UpdateBlogArgs),
    /// Delete a post
    Delete {
        /// Post identifier
        id: String,
    },
    /// Toggle your like on a post
    Like {
        /// Post identifier
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateBlogArgs {
    #[arg(long, short, help = "Post title")]
    pub title: String,

    #[arg(long, short, help = "Post body")]
    pub content: String,

    #[arg(long, short, help = "Path to the featured image (png, jpg, gif, or webp)")]
    pub image: PathBuf,
}

#[derive(Args, Debug)]
pub struct UpdateBlogArgs {
    /// Post identifier
    pub id: String,

    #[arg(long, short, help = "New title")]
    pub title: Option<String>,

    #[arg(long, short, help = "New body")]
    pub content: Option<String>,

    #[arg(long, short, help = "Path to a replacement featured image")]
    pub image: Option<PathBuf>,
}

pub async fn run(command: BlogCommand, config: &ConsoleConfig) -> Result<()> {
    let session = require_session(config).await?;
    let client = session.client;

    match command {
        BlogCommand::List => {
            let blogs = client.list_blogs().await.map_err(explain)?;
            if blogs.is_empty() {
                println!("No posts yet.");
            }
            for blog in &blogs {
                print_blog(blog, &client.blog_image_url(blog.featured_image.as_deref()));
            }
        }
        BlogCommand::Create(args) => {
            let draft = BlogDraft {
                title: args.title,
                content: args.content,
                featured_image: read_image(&args.image)?,
            };
            let blog = client.create_blog(&draft).await.map_err(explain)?;
            println!("Created post {}", blog.id);
        }
        BlogCommand::Update(args) => {
            let patch = BlogPatch {
                title: args.title,
                content: args.content,
                featured_image: args.image.as_deref().map(read_image).transpose()?,
            };
            if patch.is_empty() {
                bail!("nothing to update; pass --title, --content, or --image");
            }
            client.update_blog(&args.id, &patch).await.map_err(explain)?;
            println!("Updated post {}", args.id);
        }
        BlogCommand::Delete { id } => {
            client.delete_blog(&id).await.map_err(explain)?;
            println!("Deleted post {id}");
        }
        BlogCommand::Like { id } => {
            let summary = client.toggle_blog_like(&id).await.map_err(explain)?;
            println!("Post {id} now has {} likes", summary.likes);
        }
    }
    Ok(())
}

pub(crate) fn read_image(path: &std::path::Path) -> Result<ImageUpload> {
    ImageUpload::from_path(path).with_context(|| format!("failed to read image {}", path.display()))
}

fn print_blog(blog: &Blog, image_url: &str) {
    println!(
        "{}  {}  ({} likes)",
        blog.id,
        blog.title,
        blog.likes.unwrap_or_default()
    );
    if !image_url.is_empty() {
        println!("    image: {image_url}");
    }
}
