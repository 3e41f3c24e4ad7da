//! Cart type conversions.

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartCost, CartDiscountCode, CartLine, CartLineCost, CartMerchandise,
    CartMerchandiseProduct,
};

use super::super::queries::fragments::{CartData, CartLineData, UserErrorData};

impl From<CartLineData> for CartLine {
    fn from(line: CartLineData) -> Self {
        let m = line.merchandise;
        Self {
            id: line.id,
            quantity: line.quantity,
            cost: CartLineCost {
                amount_per_quantity: line.cost.amount_per_quantity.into(),
                compare_at_amount_per_quantity: line
                    .cost
                    .compare_at_amount_per_quantity
                    .map(Into::into),
                subtotal_amount: line.cost.subtotal_amount.into(),
                total_amount: line.cost.total_amount.into(),
            },
            merchandise: CartMerchandise {
                id: m.id,
                title: m.title,
                sku: m.sku,
                available_for_sale: m.available_for_sale,
                price: m.price.into(),
                compare_at_price: m.compare_at_price.map(Into::into),
                selected_options: m.selected_options.into_iter().map(Into::into).collect(),
                image: m.image.map(Into::into),
                product: CartMerchandiseProduct {
                    id: m.product.id,
                    handle: m.product.handle,
                    title: m.product.title,
                    vendor: m.product.vendor,
                    featured_image: m.product.featured_image.map(Into::into),
                },
            },
        }
    }
}

pub fn convert_cart(cart: CartData) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
        note: cart.note,
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: cart.cost.subtotal_amount.into(),
            total: cart.cost.total_amount.into(),
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        lines: cart.lines.into_nodes().map(Into::into).collect(),
    }
}

/// Join mutation user errors into one `UserError`.
///
/// Codes and field paths are logged, only the messages reach the client.
pub fn user_errors_to_error(errors: Vec<UserErrorData>) -> ShopifyError {
    let messages: Vec<String> = errors
        .into_iter()
        .map(|e| {
            tracing::debug!(code = ?e.code, field = ?e.field, message = %e.message, "Cart user error");
            e.message
        })
        .collect();
    ShopifyError::UserError(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_joined() {
        let err = user_errors_to_error(vec![
            UserErrorData {
                code: Some("INVALID".to_string()),
                field: Some(vec!["lines".to_string()]),
                message: "Merchandise not available".to_string(),
            },
            UserErrorData {
                code: None,
                field: None,
                message: "Quantity too high".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "User error: Merchandise not available; Quantity too high"
        );
    }
}
