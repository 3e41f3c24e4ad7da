//! Catalog, cart and blog types as the storefront API serves them.
//!
//! Converted from the raw GraphQL shapes in `storefront::queries`; field
//! names are snake case on the wire.

use alltagsgold_core::Price;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money
// =============================================================================

/// Amount exactly as Shopify sent it. Parsed on demand, never re-serialized
/// from a float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

impl Money {
    /// Parse into a decimal [`Price`]; `None` if Shopify sent something odd.
    #[must_use]
    pub fn to_price(&self) -> Option<Price> {
        Price::parse(&self.amount, &self.currency_code).ok()
    }

    /// Swiss display string (`CHF 47.85*`), falling back to the raw amount.
    #[must_use]
    pub fn format_swiss(&self, show_hint: bool) -> String {
        self.to_price().map_or_else(
            || format!("{} {}", self.currency_code, self.amount),
            |price| price.format_swiss(show_hint),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_variant_price: Money,
    pub max_variant_price: Money,
}

// =============================================================================
// Shared
// =============================================================================

/// Image on the Shopify CDN, or its Cloudinary rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Option<String>,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seo {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Cursor pagination of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Option value picked by a variant (`Grösse: 500 g`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub sku: Option<String>,
    pub price: Money,
    /// Price before the reduction, when the variant is reduced.
    pub compare_at_price: Option<Money>,
    pub selected_options: Vec<SelectedOption>,
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: String,
    pub handle: String,
    pub title: String,
}

/// A product with its variants, as cached by handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub available_for_sale: bool,
    #[serde(rename = "product_type")]
    pub kind: String,
    pub vendor: String,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub online_store_url: Option<String>,
    pub seo: Option<Seo>,
    pub price_range: PriceRange,
    pub compare_at_price_range: Option<PriceRange>,
    pub featured_image: Option<Image>,
    pub images: Vec<Image>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<ProductVariant>,
    pub collections: Vec<CollectionRef>,
}

impl Product {
    /// Whether any variant is reduced from its compare-at price.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.variants.iter().any(|v| {
            v.compare_at_price
                .as_ref()
                .and_then(Money::to_price)
                .zip(v.price.to_price())
                .is_some_and(|(compare_at, price)| compare_at.amount > price.amount)
        })
    }

    /// "From" price: the cheapest variant, with the rounding hint.
    #[must_use]
    pub fn display_price(&self) -> String {
        self.price_range.min_variant_price.format_swiss(true)
    }

    /// Highest compare-at price, only while the product is on sale.
    #[must_use]
    pub fn display_compare_at_price(&self) -> Option<String> {
        if !self.on_sale() {
            return None;
        }
        self.compare_at_price_range
            .as_ref()
            .map(|range| range.max_variant_price.format_swiss(true))
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductConnection {
    pub products: Vec<Product>,
    pub page_info: PageInfo,
}

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub updated_at: Option<String>,
    pub online_store_url: Option<String>,
    pub seo: Option<Seo>,
    pub image: Option<Image>,
    /// First page of the collection's products.
    pub products: Vec<Product>,
    /// Pagination of `products`, when the query asked for it.
    pub page_info: Option<PageInfo>,
}

// =============================================================================
// Cart
// =============================================================================

/// The variant behind a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub available_for_sale: bool,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub selected_options: Vec<SelectedOption>,
    pub image: Option<Image>,
    pub product: CartMerchandiseProduct,
}

/// Just enough of the parent product to link back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub featured_image: Option<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCost {
    pub amount_per_quantity: Money,
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Before line-level discounts.
    pub subtotal_amount: Money,
    pub total_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCost,
    pub merchandise: CartMerchandise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    #[serde(rename = "subtotal_amount")]
    pub subtotal: Money,
    #[serde(rename = "total_amount")]
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    pub code: String,
    pub applicable: bool,
}

/// A Shopify cart. Its id is what the session remembers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub checkout_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub note: Option<String>,
    pub total_quantity: i64,
    pub cost: CartCost,
    pub discount_codes: Vec<CartDiscountCode>,
    pub lines: Vec<CartLine>,
}

/// Line to add; `merchandise_id` is a variant gid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

/// New quantity for an existing line; zero removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Blog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: String,
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub excerpt: Option<String>,
    pub excerpt_html: Option<String>,
    pub published_at: String,
    pub tags: Vec<String>,
    /// Hero image.
    pub image: Option<Image>,
    pub seo: Option<Seo>,
    /// Author display name.
    pub author: Option<String>,
    pub blog: Blog,
}
