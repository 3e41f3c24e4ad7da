//! Conversions from raw Storefront API responses to domain types.

mod blog;
mod cart;
mod collections;
mod products;

pub use blog::flatten_articles;
pub use cart::{convert_cart, user_errors_to_error};

use crate::shopify::types::{Image, Money, PageInfo, Seo};

use super::queries::fragments::{ImageData, MoneyData, PageInfoData, SeoData};

impl From<MoneyData> for Money {
    fn from(m: MoneyData) -> Self {
        Self {
            amount: m.amount,
            currency_code: m.currency_code,
        }
    }
}

impl From<ImageData> for Image {
    fn from(img: ImageData) -> Self {
        Self {
            id: img.id,
            url: img.url,
            alt_text: img.alt_text,
            width: img.width,
            height: img.height,
        }
    }
}

impl From<SeoData> for Seo {
    fn from(seo: SeoData) -> Self {
        Self {
            title: seo.title,
            description: seo.description,
        }
    }
}

impl From<PageInfoData> for PageInfo {
    fn from(p: PageInfoData) -> Self {
        Self {
            has_next_page: p.has_next_page,
            has_previous_page: p.has_previous_page,
            start_cursor: p.start_cursor,
            end_cursor: p.end_cursor,
        }
    }
}
