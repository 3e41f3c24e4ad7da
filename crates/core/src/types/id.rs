//! Shopify global IDs.
//!
//! Every Storefront API object is addressed by a GID of the form
//! `gid://shopify/<Resource>/<id>`, optionally followed by a query string
//! (carts carry their access key there). [`ShopifyGid`] parses any of them;
//! `define_gid!` creates wrappers that only accept one resource type so a
//! variant ID can't be passed where a cart line ID is expected.

use core::fmt;

use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a [`ShopifyGid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The input does not start with `gid://shopify/`.
    #[error("not a Shopify global id: {0}")]
    InvalidPrefix(String),
    /// The resource or id segment is missing.
    #[error("malformed Shopify global id: {0}")]
    Malformed(String),
    /// The id refers to a different resource type.
    #[error("expected a {expected} id, got {actual}")]
    WrongResource {
        /// Resource the caller asked for.
        expected: &'static str,
        /// Resource found in the id.
        actual: String,
    },
}

/// A parsed Shopify global ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopifyGid {
    raw: String,
    resource_end: usize,
    id_end: usize,
}

impl ShopifyGid {
    /// Parse a GID string.
    ///
    /// ```
    /// use alltagsgold_core::ShopifyGid;
    ///
    /// let gid = ShopifyGid::parse("gid://shopify/Cart/c1-abc?key=123").unwrap();
    /// assert_eq!(gid.resource(), "Cart");
    /// assert_eq!(gid.id(), "c1-abc");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is wrong or the resource/id segments
    /// are empty.
    pub fn parse(s: &str) -> Result<Self, GidError> {
        let rest = s
            .strip_prefix(GID_PREFIX)
            .ok_or_else(|| GidError::InvalidPrefix(s.to_owned()))?;

        let (resource, tail) = rest
            .split_once('/')
            .ok_or_else(|| GidError::Malformed(s.to_owned()))?;
        let id = tail.split_once('?').map_or(tail, |(id, _)| id);

        if resource.is_empty() || id.is_empty() || id.contains('/') {
            return Err(GidError::Malformed(s.to_owned()));
        }

        let resource_end = GID_PREFIX.len() + resource.len();
        Ok(Self {
            raw: s.to_owned(),
            resource_end,
            id_end: resource_end + 1 + id.len(),
        })
    }

    /// The resource type, e.g. `Product`.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.raw.get(GID_PREFIX.len()..self.resource_end).unwrap_or("")
    }

    /// The resource-local id without any query string.
    #[must_use]
    pub fn id(&self) -> &str {
        self.raw.get(self.resource_end + 1..self.id_end).unwrap_or("")
    }

    /// The full GID as sent to the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for ShopifyGid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopifyGid> for String {
    fn from(gid: ShopifyGid) -> Self {
        gid.raw
    }
}

/// Macro to define a GID wrapper restricted to one resource type.
///
/// # Example
///
/// ```rust
/// # use alltagsgold_core::define_gid;
/// define_gid!(MetaobjectId, "Metaobject");
///
/// assert!(MetaobjectId::parse("gid://shopify/Metaobject/1").is_ok());
/// assert!(MetaobjectId::parse("gid://shopify/Product/1").is_err());
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name($crate::ShopifyGid);

        impl $name {
            /// Resource type this id refers to.
            pub const RESOURCE: &'static str = $resource;

            /// Parse and check the resource type.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a GID of this resource.
            pub fn parse(s: &str) -> Result<Self, $crate::GidError> {
                let gid = $crate::ShopifyGid::parse(s)?;
                if gid.resource() != $resource {
                    return Err($crate::GidError::WrongResource {
                        expected: $resource,
                        actual: gid.resource().to_owned(),
                    });
                }
                Ok(Self(gid))
            }

            /// The full GID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// The resource-local id.
            #[must_use]
            pub fn id(&self) -> &str {
                self.0.id()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::GidError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.into()
            }
        }
    };
}

define_gid!(ProductId, "Product");
define_gid!(VariantId, "ProductVariant");
define_gid!(CollectionId, "Collection");
define_gid!(CartId, "Cart");
define_gid!(CartLineId, "CartLine");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_gid() {
        let gid = ShopifyGid::parse("gid://shopify/Product/7982301").unwrap();
        assert_eq!(gid.resource(), "Product");
        assert_eq!(gid.id(), "7982301");
        assert_eq!(gid.to_string(), "gid://shopify/Product/7982301");
    }

    #[test]
    fn test_query_string_kept_in_raw_but_not_id() {
        let gid = ShopifyGid::parse("gid://shopify/Cart/Z2NwLWV1?key=abc").unwrap();
        assert_eq!(gid.id(), "Z2NwLWV1");
        assert_eq!(gid.as_str(), "gid://shopify/Cart/Z2NwLWV1?key=abc");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            ShopifyGid::parse("7982301"),
            Err(GidError::InvalidPrefix(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/Product"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/Product/"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify//1"),
            Err(GidError::Malformed(_))
        ));
    }

    #[test]
    fn test_typed_ids_check_resource() {
        assert!(VariantId::parse("gid://shopify/ProductVariant/1").is_ok());
        let err = VariantId::parse("gid://shopify/Product/1").unwrap_err();
        assert_eq!(
            err,
            GidError::WrongResource {
                expected: "ProductVariant",
                actual: "Product".to_owned(),
            }
        );
    }

    #[test]
    fn test_typed_id_serde() {
        let id: CartLineId = serde_json::from_str("\"gid://shopify/CartLine/abc\"").unwrap();
        assert_eq!(id.id(), "abc");
        assert!(serde_json::from_str::<CartLineId>("\"gid://shopify/Cart/abc\"").is_err());
    }
}
