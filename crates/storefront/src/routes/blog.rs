//! Blog route handlers.
//!
//! Articles come from Shopify's blogs; the newest posts across all blogs
//! make up the blog index.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::extract::HandlePath;
use crate::error::Result;
use crate::shopify::{Article, Blog};
use crate::state::AppState;

const DEFAULT_POST_COUNT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub first: Option<i64>,
}

/// All blogs.
#[instrument(skip(state))]
pub async fn blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>> {
    Ok(Json(state.storefront().get_blogs().await?))
}

/// Newest posts; empty when Shopify is unreachable.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Json<Vec<Article>> {
    let first = query.first.unwrap_or(DEFAULT_POST_COUNT);
    let mut posts = state
        .storefront()
        .get_blog_posts(first)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch blog posts, returning empty list");
            Vec::new()
        });

    if let Some(images) = state.images() {
        for post in &mut posts {
            images.optimize_article(post, false);
        }
    }
    Json(posts)
}

/// Single post.
#[instrument(skip(state), fields(handle = %handle))]
pub async fn show(
    State(state): State<AppState>,
    HandlePath(handle): HandlePath,
) -> Result<Json<Article>> {
    let mut post = state.storefront().get_blog_post_by_handle(handle.as_str()).await?;
    if let Some(images) = state.images() {
        images.optimize_article(&mut post, true);
    }
    Ok(Json(post))
}
