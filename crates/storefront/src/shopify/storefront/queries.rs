//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation pairs a document from `graphql/storefront/` with typed
//! variables and response data. Documents are sent whole; Shopify picks the
//! operation by name, so every fragment a document carries must be used by
//! at least one of its operations.

use graphql_client::{GraphQLQuery, QueryBody};

const PRODUCTS_DOCUMENT: &str = concat!(
    include_str!("../../../graphql/storefront/fragments/image.graphql"),
    include_str!("../../../graphql/storefront/fragments/product.graphql"),
    include_str!("../../../graphql/storefront/queries/products.graphql"),
);

const COLLECTIONS_DOCUMENT: &str = concat!(
    include_str!("../../../graphql/storefront/fragments/image.graphql"),
    include_str!("../../../graphql/storefront/fragments/product.graphql"),
    include_str!("../../../graphql/storefront/queries/collections.graphql"),
);

const CART_DOCUMENT: &str = concat!(
    include_str!("../../../graphql/storefront/fragments/image.graphql"),
    include_str!("../../../graphql/storefront/queries/cart.graphql"),
);

const BLOG_DOCUMENT: &str = concat!(
    include_str!("../../../graphql/storefront/fragments/image.graphql"),
    include_str!("../../../graphql/storefront/queries/blog.graphql"),
);

/// Declare an operation type whose name matches the GraphQL operation name.
macro_rules! storefront_operation {
    ($name:ident, $module:ident, $document:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// Product queries
storefront_operation!(GetProducts, get_products, PRODUCTS_DOCUMENT);
storefront_operation!(GetProductByHandle, get_product_by_handle, PRODUCTS_DOCUMENT);
storefront_operation!(
    GetProductRecommendations,
    get_product_recommendations,
    PRODUCTS_DOCUMENT
);
storefront_operation!(GetProductHandles, get_product_handles, PRODUCTS_DOCUMENT);

// Collection queries
storefront_operation!(GetCollections, get_collections, COLLECTIONS_DOCUMENT);
storefront_operation!(
    GetCollectionByHandle,
    get_collection_by_handle,
    COLLECTIONS_DOCUMENT
);
storefront_operation!(
    GetCollectionHandles,
    get_collection_handles,
    COLLECTIONS_DOCUMENT
);

// Cart mutations and queries
storefront_operation!(CreateCart, create_cart, CART_DOCUMENT);
storefront_operation!(GetCart, get_cart, CART_DOCUMENT);
storefront_operation!(AddToCart, add_to_cart, CART_DOCUMENT);
storefront_operation!(UpdateCartLines, update_cart_lines, CART_DOCUMENT);
storefront_operation!(RemoveFromCart, remove_from_cart, CART_DOCUMENT);

// Blog queries
storefront_operation!(GetBlogs, get_blogs, BLOG_DOCUMENT);
storefront_operation!(GetBlogArticles, get_blog_articles, BLOG_DOCUMENT);

/// Response shapes shared across operations.
pub mod fragments {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edge<T> {
        pub node: T,
        #[serde(default)]
        pub cursor: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Connection<T> {
        pub edges: Vec<Edge<T>>,
        #[serde(default)]
        pub page_info: Option<PageInfoData>,
    }

    impl<T> Connection<T> {
        pub fn into_nodes(self) -> impl Iterator<Item = T> {
            self.edges.into_iter().map(|edge| edge.node)
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfoData {
        pub has_next_page: bool,
        pub has_previous_page: bool,
        pub start_cursor: Option<String>,
        pub end_cursor: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyData {
        pub amount: String,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageData {
        pub id: Option<String>,
        pub url: String,
        pub alt_text: Option<String>,
        pub width: Option<i64>,
        pub height: Option<i64>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SeoData {
        pub title: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOptionData {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductOptionData {
        pub id: String,
        pub name: String,
        pub values: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRangeData {
        pub min_variant_price: MoneyData,
        pub max_variant_price: MoneyData,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantData {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub sku: Option<String>,
        pub price: MoneyData,
        pub compare_at_price: Option<MoneyData>,
        pub selected_options: Vec<SelectedOptionData>,
        pub image: Option<ImageData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionRefData {
        pub id: String,
        pub handle: String,
        pub title: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub available_for_sale: bool,
        pub vendor: String,
        pub product_type: String,
        pub tags: Vec<String>,
        pub created_at: Option<String>,
        pub updated_at: Option<String>,
        pub online_store_url: Option<String>,
        pub seo: Option<SeoData>,
        pub featured_image: Option<ImageData>,
        pub images: Connection<ImageData>,
        pub options: Vec<ProductOptionData>,
        pub price_range: PriceRangeData,
        pub compare_at_price_range: Option<PriceRangeData>,
        pub variants: Connection<VariantData>,
        pub collections: Connection<CollectionRefData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct HandleData {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub updated_at: Option<String>,
        pub online_store_url: Option<String>,
        pub seo: Option<SeoData>,
        pub image: Option<ImageData>,
        pub products: Connection<ProductData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCostData {
        pub subtotal_amount: MoneyData,
        pub total_amount: MoneyData,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DiscountCodeData {
        pub code: String,
        pub applicable: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineCostData {
        pub amount_per_quantity: MoneyData,
        pub compare_at_amount_per_quantity: Option<MoneyData>,
        pub subtotal_amount: MoneyData,
        pub total_amount: MoneyData,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MerchandiseProductData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub vendor: String,
        pub featured_image: Option<ImageData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MerchandiseData {
        pub id: String,
        pub title: String,
        pub sku: Option<String>,
        pub available_for_sale: bool,
        pub price: MoneyData,
        pub compare_at_price: Option<MoneyData>,
        pub selected_options: Vec<SelectedOptionData>,
        pub image: Option<ImageData>,
        pub product: MerchandiseProductData,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartLineData {
        pub id: String,
        pub quantity: i64,
        pub cost: CartLineCostData,
        pub merchandise: MerchandiseData,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartData {
        pub id: String,
        pub checkout_url: String,
        pub created_at: String,
        pub updated_at: String,
        pub note: Option<String>,
        pub total_quantity: i64,
        pub cost: CartCostData,
        pub discount_codes: Vec<DiscountCodeData>,
        pub lines: Connection<CartLineData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserErrorData {
        pub code: Option<String>,
        pub field: Option<Vec<String>>,
        pub message: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartMutationPayload {
        pub cart: Option<CartData>,
        pub user_errors: Vec<UserErrorData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct BlogData {
        pub id: String,
        pub handle: String,
        pub title: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AuthorData {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ArticleData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub content: String,
        pub content_html: String,
        pub excerpt: Option<String>,
        pub excerpt_html: Option<String>,
        pub published_at: String,
        pub tags: Vec<String>,
        pub image: Option<ImageData>,
        pub seo: Option<SeoData>,
        pub author_v2: Option<AuthorData>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct BlogWithArticlesData {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub articles: Connection<ArticleData>,
    }
}

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::fragments::{Connection, ProductData};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
        pub query: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductData>,
    }
}

pub mod get_product_by_handle {
    use serde::{Deserialize, Serialize};

    use super::fragments::ProductData;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductData>,
    }
}

pub mod get_product_recommendations {
    use serde::{Deserialize, Serialize};

    use super::fragments::ProductData;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_recommendations: Option<Vec<ProductData>>,
    }
}

pub mod get_product_handles {
    use serde::{Deserialize, Serialize};

    use super::fragments::{Connection, HandleData};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<HandleData>,
    }
}

pub mod get_collections {
    use serde::{Deserialize, Serialize};

    use super::fragments::{CollectionData, Connection};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub product_count: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<CollectionData>,
    }
}

pub mod get_collection_by_handle {
    use serde::{Deserialize, Serialize};

    use super::fragments::CollectionData;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub handle: String,
        pub product_count: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionData>,
    }
}

pub mod get_collection_handles {
    use serde::{Deserialize, Serialize};

    use super::fragments::{Connection, HandleData};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<HandleData>,
    }
}

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartMutationPayload;
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

pub mod get_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartData;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartData>,
    }
}

pub mod add_to_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartMutationPayload;
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

pub mod update_cart_lines {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartMutationPayload;
    use crate::shopify::types::CartLineUpdateInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

pub mod remove_from_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartMutationPayload;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

pub mod get_blogs {
    use serde::{Deserialize, Serialize};

    use super::fragments::{BlogData, Connection};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub blogs: Connection<BlogData>,
    }
}

pub mod get_blog_articles {
    use serde::{Deserialize, Serialize};

    use super::fragments::{BlogWithArticlesData, Connection};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub blog_count: i64,
        pub article_count: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub blogs: Connection<BlogWithArticlesData>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_match_documents() {
        let body = GetProductByHandle::build_query(get_product_by_handle::Variables {
            handle: "x".to_string(),
        });
        assert_eq!(body.operation_name, "GetProductByHandle");
        assert!(body.query.contains("query GetProductByHandle("));
        assert!(body.query.contains("fragment ProductFields on Product"));
        assert!(body.query.contains("fragment ImageFields on Image"));

        let body = RemoveFromCart::build_query(remove_from_cart::Variables {
            cart_id: "c".to_string(),
            line_ids: vec![],
        });
        assert!(body.query.contains("mutation RemoveFromCart("));
        assert!(!body.query.contains("fragment ProductFields"));
    }

    #[test]
    fn test_variables_serialize_camel_case() {
        let body = GetCollectionByHandle::build_query(get_collection_by_handle::Variables {
            handle: "kueche".to_string(),
            product_count: 24,
            after: None,
        });
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["operationName"], "GetCollectionByHandle");
        assert_eq!(json["variables"]["productCount"], 24);
        assert_eq!(json["variables"]["handle"], "kueche");
    }

    #[test]
    fn test_cart_line_input_serializes_for_graphql() {
        let vars = add_to_cart::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![crate::shopify::types::CartLineInput {
                merchandise_id: "gid://shopify/ProductVariant/2".to_string(),
                quantity: 3,
            }],
        };
        let json = serde_json::to_value(&vars).unwrap_or_default();
        assert_eq!(json["cartId"], "gid://shopify/Cart/1");
        assert_eq!(json["lines"][0]["merchandiseId"], "gid://shopify/ProductVariant/2");
        assert_eq!(json["lines"][0]["quantity"], 3);
    }
}
