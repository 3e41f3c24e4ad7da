//! Server-side Storefront API proxy.
//!
//! Lets the browser run GraphQL queries without ever seeing the access
//! token. Responses are never cached.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::extract::JsonBody;
use crate::error::AppError;
use crate::shopify::ShopifyError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub variables: Value,
}

/// Forward a query and return `{"data": ...}`.
///
/// GraphQL errors come back as 400 with the upstream error list under
/// `details`; transport failures map like any other Shopify error.
#[instrument(skip_all)]
pub async fn forward(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ProxyRequest>,
) -> Response {
    let Some(query) = request.query.filter(|q| !q.trim().is_empty()) else {
        return AppError::BadRequest("GraphQL query required".to_string()).into_response();
    };

    match state.storefront().raw_query(&query, &request.variables).await {
        Ok(data) => Json(json!({ "data": data })).into_response(),
        Err(ShopifyError::GraphQL(errors)) => {
            tracing::warn!(count = errors.len(), "Proxied query returned GraphQL errors");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "GraphQL error",
                    "details": errors,
                })),
            )
                .into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
