//! Session layer and cart-id accessors.
//!
//! Sessions live in memory; the only thing stored is the Shopify cart id,
//! which Shopify itself keeps alive, so losing sessions on restart only
//! means a shopper starts a fresh cart.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ag_session";

/// Session key holding the Shopify cart id.
pub const CART_ID_KEY: &str = "cart_id";

/// Idle session lifetime (30 days, matching Shopify cart expiry).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer backed by an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Cart id stored in the session, if any.
pub async fn cart_id(session: &Session) -> Option<String> {
    session.get::<String>(CART_ID_KEY).await.ok().flatten()
}

/// Remember the cart id for this session.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(CART_ID_KEY, cart_id).await
}

/// Forget the session's cart (e.g. after it expired at Shopify).
pub async fn clear_cart_id(session: &Session) {
    if let Err(e) = session.remove::<String>(CART_ID_KEY).await {
        tracing::warn!(error = %e, "Failed to clear cart id from session");
    }
}
