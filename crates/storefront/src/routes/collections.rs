//! Collection route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::extract::HandlePath;
use super::products::{DEFAULT_PAGE_SIZE, HandleList, PageQuery, ProductView};
use crate::error::Result;
use crate::images::ImageOptimizer;
use crate::shopify::{Collection, PageInfo};
use crate::state::AppState;

/// Products per collection page when the client doesn't ask.
pub(crate) const DEFAULT_COLLECTION_PRODUCTS: i64 = 24;

/// Collection with priced product cards.
#[derive(Debug, Serialize)]
pub struct CollectionView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub image: Option<crate::shopify::Image>,
    pub seo: Option<crate::shopify::Seo>,
    pub products: Vec<ProductView>,
    pub page_info: Option<PageInfo>,
}

impl CollectionView {
    #[must_use]
    pub fn new(mut collection: Collection, images: Option<&ImageOptimizer>) -> Self {
        if let Some(images) = images {
            images.optimize_collection(&mut collection);
        }

        Self {
            id: collection.id,
            handle: collection.handle,
            title: collection.title,
            description: collection.description,
            description_html: collection.description_html,
            image: collection.image,
            seo: collection.seo,
            // Card images were rewritten with the collection
            products: collection
                .products
                .into_iter()
                .map(|p| ProductView::card(p, None))
                .collect(),
            page_info: collection.page_info,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub first: Option<i64>,
}

/// Collection listing; empty when Shopify is unreachable.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<CollectionView>> {
    let first = query.first.unwrap_or(DEFAULT_PAGE_SIZE);
    let collections = state
        .storefront()
        .get_collections(first)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch collections, returning empty list");
            Vec::new()
        });

    Json(
        collections
            .into_iter()
            .map(|c| CollectionView::new(c, state.images()))
            .collect(),
    )
}

/// Every collection handle; empty when Shopify is unreachable.
#[instrument(skip(state))]
pub async fn handles(State(state): State<AppState>) -> Json<HandleList> {
    let handles = state
        .storefront()
        .get_all_collection_handles()
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch collection handles");
            Vec::new()
        });
    Json(HandleList { handles })
}

/// Collection detail with one page of products.
#[instrument(skip(state), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    HandlePath(handle): HandlePath,
    Query(query): Query<PageQuery>,
) -> Result<Json<CollectionView>> {
    let collection = state
        .storefront()
        .get_collection_by_handle(
            handle.as_str(),
            query.first.unwrap_or(DEFAULT_COLLECTION_PRODUCTS),
            query.after,
        )
        .await?;

    Ok(Json(CollectionView::new(collection, state.images())))
}
