//! Cart route handlers.
//!
//! Cart IDs are stored in the session and mapped to Shopify carts. Every
//! mutation returns the updated cart so the client never needs a second
//! round trip.

use alltagsgold_core::{CartLineId, GidError, Price, RoundingAdjustment, VariantId};
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::extract::JsonBody;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session::{cart_id, clear_cart_id, set_cart_id};
use crate::shopify::{Cart, CartLine, CartLineInput, CartLineUpdateInput, Money, ShopifyError};
use crate::state::AppState;

/// Shown for an empty or missing cart.
const ZERO_CHF: &str = "CHF 0.00";

/// Cart line with display prices.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub price: String,
    pub line_price: String,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        Self {
            price: line.cost.amount_per_quantity.format_swiss(false),
            line_price: line.cost.total_amount.format_swiss(false),
            line,
        }
    }
}

/// Cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: Option<String>,
    pub checkout_url: Option<String>,
    pub lines: Vec<CartLineView>,
    pub total_quantity: i64,
    pub subtotal: String,
    pub total: String,
    /// Present when the displayed total is rounded to 5 Rappen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounding: Option<RoundingAdjustment>,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: None,
            checkout_url: None,
            lines: Vec::new(),
            total_quantity: 0,
            subtotal: ZERO_CHF.to_string(),
            total: ZERO_CHF.to_string(),
            rounding: None,
        }
    }
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.cost.subtotal.format_swiss(false),
            total: cart.cost.total.format_swiss(false),
            rounding: rounding_of(&cart.cost.total),
            id: Some(cart.id),
            checkout_url: Some(cart.checkout_url),
            total_quantity: cart.total_quantity,
            lines: cart.lines.into_iter().map(Into::into).collect(),
        }
    }
}

fn rounding_of(total: &Money) -> Option<RoundingAdjustment> {
    total
        .to_price()
        .filter(Price::needs_rounding)
        .map(|price| price.swiss_rounding_adjustment())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub line_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub line_id: String,
}

fn invalid_id(field: &str) -> impl FnOnce(GidError) -> AppError + '_ {
    move |e| AppError::BadRequest(format!("Invalid {field}: {e}"))
}

/// Shopify forgets carts after a while; the session may still hold the id.
fn is_missing_cart(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::NotFound(_) => true,
        ShopifyError::UserError(message) => message.to_lowercase().contains("does not exist"),
        _ => false,
    }
}

/// The session's cart, or an empty one.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let Some(cart_id) = cart_id(&session).await else {
        return Json(CartView::empty());
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Json(cart.into()),
        Err(e) => {
            if is_missing_cart(&e) {
                clear_cart_id(&session).await;
            }
            tracing::warn!(cart_id = %cart_id, error = %e, "Failed to fetch cart");
            Json(CartView::empty())
        }
    }
}

/// Add a variant to the cart.
///
/// Creates a new cart if the session has none or Shopify no longer knows
/// the stored one.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<Json<CartView>> {
    if request.variant_id.is_empty() {
        return Err(AppError::BadRequest("variantId is required".to_string()));
    }
    let variant_id = VariantId::parse(&request.variant_id).map_err(invalid_id("variantId"))?;
    let line = CartLineInput {
        merchandise_id: variant_id.into(),
        quantity: i64::from(request.quantity.unwrap_or(1).max(1)),
    };
    add_breadcrumb("cart", "add", Some(&[("variant_id", &line.merchandise_id)]));

    let storefront = state.storefront();
    let cart = match cart_id(&session).await {
        Some(cart_id) => match storefront.add_to_cart(&cart_id, vec![line.clone()]).await {
            Err(e) if is_missing_cart(&e) => {
                tracing::info!(cart_id = %cart_id, "Stored cart expired, creating a new one");
                storefront.create_cart(vec![line]).await?
            }
            result => result?,
        },
        None => storefront.create_cart(vec![line]).await?,
    };

    set_cart_id(&session, &cart.id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save cart ID to session: {e}")))?;

    Ok(Json(cart.into()))
}

/// Change a line's quantity; zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let line_id = CartLineId::parse(&request.line_id).map_err(invalid_id("lineId"))?;
    let cart_id = require_cart(&session).await?;
    let cart = state
        .storefront()
        .update_cart_lines(
            &cart_id,
            vec![CartLineUpdateInput {
                id: line_id.into(),
                quantity: i64::from(request.quantity),
            }],
        )
        .await?;
    Ok(Json(cart.into()))
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    JsonBody(request): JsonBody<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let line_id = CartLineId::parse(&request.line_id).map_err(invalid_id("lineId"))?;
    let cart_id = require_cart(&session).await?;
    let cart = state
        .storefront()
        .remove_from_cart(&cart_id, vec![line_id.into()])
        .await?;
    Ok(Json(cart.into()))
}

async fn require_cart(session: &Session) -> Result<String> {
    cart_id(session)
        .await
        .ok_or_else(|| AppError::NotFound("No cart in session".to_string()))
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let Some(cart_id) = cart_id(&session).await else {
        // No cart, back to the shop
        return Redirect::to("/").into_response();
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => {
            add_breadcrumb("checkout", "redirect", None);
            Redirect::to(&cart.checkout_url).into_response()
        }
        Err(e) => {
            tracing::error!(cart_id = %cart_id, error = %e, "Failed to get cart for checkout");
            Redirect::to("/").into_response()
        }
    }
}
