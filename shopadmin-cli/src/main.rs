//! Command-line console for ShopAdmin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ConsoleConfig;
use std::path::PathBuf;

mod commands;

use commands::{blogs::BlogCommand, products::ProductCommand, session::SessionCommand};

/// ShopAdmin CLI
#[derive(Parser)]
#[command(name = "shopadmin")]
#[command(about = "Command-line console for the ShopAdmin backend", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        global = true,
        help = "Path to the configuration file (e.g., shopadmin.yaml or shopadmin.json). If not provided, defaults and SHOPADMIN_* variables are used."
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the ShopAdmin CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in, check, or end the console session
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Manage blog posts
    Blogs {
        #[command(subcommand)]
        command: BlogCommand,
    },

    /// Manage catalog products
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },

    /// Serve the console pages behind the session redirect filter
    Serve {
        /// The port number to bind the edge server to (e.g., 3000).
        #[arg(
            long,
            short,
            help = "The port number to bind the edge server to (e.g., 3000). Overrides the configuration."
        )]
        port: Option<u16>,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,

        /// Where to write the file.
        #[arg(long, short, help = "Where to write the file. Defaults to shopadmin.<format>.")]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>, port: Option<u16>) -> Result<ConsoleConfig> {
    let config = ConsoleConfig::load_config(path, port).context("invalid configuration")?;
    edge::logging::initialize_tracing(&config.logging);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let Cli { config, command } = Cli::parse();

    match command {
        Commands::Session { command } => {
            commands::session::run(command, &load_config(config, None)?).await
        }
        Commands::Blogs { command } => commands::blogs::run(command, &load_config(config, None)?).await,
        Commands::Products { command } => {
            commands::products::run(command, &load_config(config, None)?).await
        }
        Commands::Serve { port } => edge::run(&load_config(config, port)?).await,
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            Ok(())
        }
        Commands::Config { format, output } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            let path = commands::config::generate_config(&format, output)?;
            println!("Configuration file '{}' generated successfully.", path.display());
            Ok(())
        }
    }
}
