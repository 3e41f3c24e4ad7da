//! Catalog export commands.
//!
//! # Usage
//!
//! ```bash
//! ag-cli products export -o products.json
//! ag-cli products handles
//! ag-cli products handles --collections
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE` - Shopify store domain
//! - `SHOPIFY_STOREFRONT_TOKEN` - Storefront API access token

use std::io::Write;

use tracing::info;

use super::client_from_env;

/// Fetch every product and write them as a JSON array.
///
/// # Errors
///
/// Returns an error if configuration is missing, the handle listing fails,
/// or the output can't be written. Individual products that fail to load
/// are skipped.
pub async fn export(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let client = client_from_env()?;

    let handles = client.get_all_product_handles().await?;
    info!(count = handles.len(), "Fetched product handles");

    let products = client.get_products_by_handles(&handles).await;
    if products.len() < handles.len() {
        tracing::warn!(
            missing = handles.len() - products.len(),
            "Some products could not be loaded"
        );
    }

    let json = serde_json::to_string_pretty(&products)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!(path = %path, count = products.len(), "Products exported");
        }
        None => writeln!(std::io::stdout().lock(), "{json}")?,
    }
    Ok(())
}

/// Print one handle per line.
///
/// # Errors
///
/// Returns an error if configuration is missing or any page fails.
pub async fn handles(collections: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = client_from_env()?;
    let handles = if collections {
        client.get_all_collection_handles().await?
    } else {
        client.get_all_product_handles().await?
    };

    let mut stdout = std::io::stdout().lock();
    for handle in &handles {
        writeln!(stdout, "{handle}")?;
    }
    Ok(())
}
