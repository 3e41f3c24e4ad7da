//! Collection type conversions.

use crate::shopify::types::Collection;

use super::super::queries::fragments::CollectionData;

impl From<CollectionData> for Collection {
    fn from(c: CollectionData) -> Self {
        let page_info = c.products.page_info.clone().map(Into::into);
        Self {
            id: c.id,
            handle: c.handle,
            title: c.title,
            description: c.description,
            description_html: c.description_html,
            updated_at: c.updated_at,
            online_store_url: c.online_store_url,
            seo: c.seo.map(Into::into),
            image: c.image.map(Into::into),
            products: c.products.into_nodes().map(Into::into).collect(),
            page_info,
        }
    }
}
