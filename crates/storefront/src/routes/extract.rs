//! Extractors that reject with the JSON error body.

use alltagsgold_core::Handle;
use axum::{
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

/// `Json<T>` whose syntax and shape errors answer 400 like every other
/// bad input.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// A `{handle}` path segment that is a valid Shopify handle.
#[derive(Debug, Clone)]
pub struct HandlePath(pub Handle);

impl<S> FromRequestParts<S> for HandlePath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        Handle::parse(&raw)
            .map(Self)
            .map_err(|e| AppError::BadRequest(format!("Invalid handle: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new().route(
            "/items/{handle}",
            get(|HandlePath(handle): HandlePath| async move { handle.into_inner() }),
        )
    }

    async fn get_status(uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_handle_path_accepts_shopify_handles() {
        assert_eq!(get_status("/items/bienenwachs-kerze").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handle_path_rejects_invalid_handles() {
        assert_eq!(get_status("/items/Kerze").await, StatusCode::BAD_REQUEST);
        assert_eq!(get_status("/items/-kerze").await, StatusCode::BAD_REQUEST);
        assert_eq!(get_status("/items/..%2Fetc").await, StatusCode::BAD_REQUEST);
    }
}
