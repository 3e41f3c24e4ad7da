//! Alltagsgold CLI - catalog and configuration tools.
//!
//! # Usage
//!
//! ```bash
//! # Dump every product as JSON
//! ag-cli products export -o products.json
//!
//! # List product or collection handles
//! ag-cli products handles
//! ag-cli products handles --collections
//!
//! # Cloudinary URL for a Shopify image
//! ag-cli image https://cdn.shopify.com/s/files/1/honig.jpg --preset product
//!
//! # Validate the environment (and optionally reach Shopify)
//! ag-cli config check --ping
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ag-cli")]
#[command(author, version, about = "Alltagsgold storefront tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the catalog through the Storefront API
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Print the Cloudinary fetch URL for an image
    Image {
        /// Source image URL
        url: String,

        /// Named preset (thumbnail, medium, product, `blog_hero`, ...)
        #[arg(short, long, conflicts_with = "transform")]
        preset: Option<String>,

        /// Raw Cloudinary transformation, e.g. `w_500,h_500,c_fill`
        #[arg(short, long)]
        transform: Option<String>,

        /// Print mobile, tablet and desktop variants instead
        #[arg(long, conflicts_with = "video")]
        responsive: bool,

        /// Treat the source as a video
        #[arg(long)]
        video: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Export all products as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List handles
    Handles {
        /// Collection handles instead of product handles
        #[arg(long)]
        collections: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate the environment
    Check {
        /// Also run a one-product query against Shopify
        #[arg(long)]
        ping: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::Export { output } => {
                commands::products::export(output.as_deref()).await?;
            }
            ProductsAction::Handles { collections } => {
                commands::products::handles(collections).await?;
            }
        },
        Commands::Image {
            url,
            preset,
            transform,
            responsive,
            video,
        } => {
            let output = if responsive {
                commands::image::Output::Responsive
            } else if video {
                commands::image::Output::Video
            } else {
                commands::image::Output::Image
            };
            commands::image::print_url(&url, preset.as_deref(), transform.as_deref(), output)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Check { ping } => commands::config::check(ping).await?,
        },
    }
    Ok(())
}
