//! Product type conversions.

use crate::shopify::types::{
    CollectionRef, PriceRange, Product, ProductConnection, ProductOption, ProductVariant,
    SelectedOption,
};

use super::super::queries::fragments::{
    Connection, PriceRangeData, ProductData, SelectedOptionData, VariantData,
};

impl From<PriceRangeData> for PriceRange {
    fn from(range: PriceRangeData) -> Self {
        Self {
            min_variant_price: range.min_variant_price.into(),
            max_variant_price: range.max_variant_price.into(),
        }
    }
}

impl From<SelectedOptionData> for SelectedOption {
    fn from(opt: SelectedOptionData) -> Self {
        Self {
            name: opt.name,
            value: opt.value,
        }
    }
}

impl From<VariantData> for ProductVariant {
    fn from(v: VariantData) -> Self {
        Self {
            id: v.id,
            title: v.title,
            available_for_sale: v.available_for_sale,
            sku: v.sku.filter(|s| !s.is_empty()),
            price: v.price.into(),
            compare_at_price: v.compare_at_price.map(Into::into),
            selected_options: v.selected_options.into_iter().map(Into::into).collect(),
            image: v.image.map(Into::into),
        }
    }
}

impl From<ProductData> for Product {
    fn from(p: ProductData) -> Self {
        Self {
            id: p.id,
            handle: p.handle,
            title: p.title,
            description: p.description,
            description_html: p.description_html,
            available_for_sale: p.available_for_sale,
            kind: p.product_type,
            vendor: p.vendor,
            tags: p.tags,
            created_at: p.created_at,
            updated_at: p.updated_at,
            online_store_url: p.online_store_url,
            seo: p.seo.map(Into::into),
            price_range: p.price_range.into(),
            compare_at_price_range: p.compare_at_price_range.map(Into::into),
            featured_image: p.featured_image.map(Into::into),
            images: p.images.into_nodes().map(Into::into).collect(),
            options: p
                .options
                .into_iter()
                .map(|o| ProductOption {
                    id: o.id,
                    name: o.name,
                    values: o.values,
                })
                .collect(),
            variants: p.variants.into_nodes().map(Into::into).collect(),
            collections: p
                .collections
                .into_nodes()
                .map(|c| CollectionRef {
                    id: c.id,
                    handle: c.handle,
                    title: c.title,
                })
                .collect(),
        }
    }
}

impl From<Connection<ProductData>> for ProductConnection {
    fn from(connection: Connection<ProductData>) -> Self {
        let page_info = connection.page_info.clone().map(Into::into).unwrap_or_default();
        Self {
            products: connection.into_nodes().map(Into::into).collect(),
            page_info,
        }
    }
}
