//! Product route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::extract::HandlePath;
use crate::error::Result;
use crate::images::ImageOptimizer;
use crate::shopify::{PageInfo, Product};
use crate::state::AppState;

/// Page size when the client doesn't ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Product with display prices.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Lowest variant price, Swiss formatted (`CHF 47.85*`).
    pub price: String,
    /// Compare-at price when the product is on sale.
    pub compare_at_price: Option<String>,
}

impl ProductView {
    /// Detail view: every image rewritten for product pages.
    #[must_use]
    pub fn detail(product: &Product, images: Option<&ImageOptimizer>) -> Self {
        let mut product = product.clone();
        if let Some(images) = images {
            images.optimize_product(&mut product);
        }
        Self::priced(product)
    }

    /// Card view for listings.
    #[must_use]
    pub fn card(mut product: Product, images: Option<&ImageOptimizer>) -> Self {
        if let Some(images) = images {
            images.optimize_product_card(&mut product);
        }
        Self::priced(product)
    }

    fn priced(product: Product) -> Self {
        Self {
            price: product.display_price(),
            compare_at_price: product.display_compare_at_price(),
            product,
        }
    }
}

/// Cursor pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub first: Option<i64>,
    pub after: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductView>,
    pub page_info: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct HandleList {
    pub handles: Vec<String>,
}

/// Product listing. Degrades to an empty page when Shopify is unreachable.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<ProductList> {
    let first = query.first.unwrap_or(DEFAULT_PAGE_SIZE);
    let connection = match state.storefront().get_products(first, query.after).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!(error = %e, "Failed to fetch products, returning empty list");
            Default::default()
        }
    };

    Json(ProductList {
        products: connection
            .products
            .into_iter()
            .map(|p| ProductView::card(p, state.images()))
            .collect(),
        page_info: connection.page_info,
    })
}

/// Every product handle; empty when Shopify is unreachable.
#[instrument(skip(state))]
pub async fn handles(State(state): State<AppState>) -> Json<HandleList> {
    let handles = state
        .storefront()
        .get_all_product_handles()
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch product handles");
            Vec::new()
        });
    Json(HandleList { handles })
}

/// Product detail.
#[instrument(skip(state), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    HandlePath(handle): HandlePath,
) -> Result<Json<ProductView>> {
    let product = load_product(&state, handle.as_str()).await?;
    Ok(Json(ProductView::detail(&product, state.images())))
}

/// Recommendations for a product.
#[instrument(skip(state), fields(handle = %handle))]
pub async fn recommendations(
    State(state): State<AppState>,
    HandlePath(handle): HandlePath,
) -> Result<Json<Vec<ProductView>>> {
    let product = load_product(&state, handle.as_str()).await?;
    let recommended = state
        .storefront()
        .get_product_recommendations(&product.id)
        .await?;

    Ok(Json(
        recommended
            .into_iter()
            .map(|p| ProductView::card(p, state.images()))
            .collect(),
    ))
}

/// Product from the product cache, falling back to the Storefront API.
pub(crate) async fn load_product(state: &AppState, handle: &str) -> Result<Arc<Product>> {
    if let Some(product) = state.products().get(handle) {
        return Ok(product);
    }
    let product = state.storefront().get_product_by_handle(handle).await?;
    Ok(state.products().insert(product))
}
