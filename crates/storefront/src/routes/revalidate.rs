//! Cache revalidation endpoint for Shopify webhooks and manual triggers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::collections::DEFAULT_COLLECTION_PRODUCTS;
use super::products::load_product;
use crate::error::{AppError, Result};
use crate::revalidate::{Inferred, ResourceType, RevalidateRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateQuery {
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred: Option<Inferred>,
    pub paths: Vec<String>,
    /// Cached responses dropped.
    pub invalidated: usize,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Authorize, plan and execute a revalidation.
///
/// Drops cached responses and the product-cache entry for the inferred
/// handle plus all cached listings; a revalidation that names neither a
/// resource nor a handle drops everything. Created products and
/// collections are fetched right away so the first visitor doesn't pay
/// for the miss.
#[instrument(skip_all)]
pub async fn revalidate(
    State(state): State<AppState>,
    Query(query): Query<RevalidateQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RevalidateResponse>> {
    let request = RevalidateRequest {
        query_secret: query.secret.as_deref(),
        authorization: header(&headers, "authorization"),
        topic: header(&headers, "x-shopify-topic"),
        hmac: header(&headers, "x-shopify-hmac-sha256"),
        body: &body,
    };

    let plan = state
        .revalidator()
        .plan(&request)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    if plan.duplicate {
        tracing::debug!(paths = ?plan.paths, "Skipping duplicate revalidation");
        return Ok(Json(RevalidateResponse {
            revalidated: false,
            duplicate: true,
            topic: None,
            inferred: None,
            paths: plan.paths,
            invalidated: 0,
        }));
    }

    let storefront = state.storefront();
    let invalidated = match (plan.inferred.resource, plan.inferred.handle.as_deref()) {
        (None, None) => {
            state.products().clear();
            storefront.invalidate_all().await
        }
        (resource, Some(handle)) => {
            if resource == Some(ResourceType::Product) {
                state.products().remove(handle);
            }
            storefront.invalidate_listings().await + storefront.invalidate_handle(handle).await
        }
        (Some(_), None) => storefront.invalidate_listings().await,
    };

    if plan.is_create() {
        warm_up(&state, &plan.inferred).await;
    }

    tracing::info!(
        topic = plan.topic.as_deref().unwrap_or_default(),
        handle = plan.inferred.handle.as_deref().unwrap_or_default(),
        invalidated,
        "Revalidated"
    );

    Ok(Json(RevalidateResponse {
        revalidated: true,
        duplicate: false,
        topic: plan.topic,
        inferred: Some(plan.inferred),
        paths: plan.paths,
        invalidated,
    }))
}

/// Fetch a freshly created product or collection into the caches.
async fn warm_up(state: &AppState, inferred: &Inferred) {
    let Some(handle) = inferred.handle.as_deref() else {
        return;
    };

    let result: Result<()> = match inferred.resource {
        Some(ResourceType::Product) => load_product(state, handle).await.map(drop),
        Some(ResourceType::Collection) => state
            .storefront()
            .get_collection_by_handle(handle, DEFAULT_COLLECTION_PRODUCTS, None)
            .await
            .map(drop)
            .map_err(Into::into),
        None => return,
    };

    if let Err(e) = result {
        tracing::warn!(handle = %handle, error = %e, "Warm-up fetch failed");
    }
}
