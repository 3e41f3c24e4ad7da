//! Cloudinary fetch-URL rewriting for Shopify CDN images.
//!
//! Remote images are routed through Cloudinary's `image/fetch` endpoint with
//! a named preset or a raw transformation string. URLs that are already
//! optimized or can't be fetched remotely are returned unchanged.

use std::str::FromStr;

use serde::Serialize;

use crate::shopify::{Article, Collection, Image, Product};

/// Returned for missing image URLs.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/800x800?text=Bild+nicht+verf%C3%BCgbar";

const CLOUDINARY_HOST: &str = "res.cloudinary.com";
const DEFAULT_VIDEO_TRANSFORM: &str = "w_800,q_auto,f_auto";

/// Named transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePreset {
    Thumbnail,
    #[default]
    Medium,
    Large,
    Hero,
    Product,
    ProductZoom,
    ProductList,
    BlogHero,
    BlogThumbnail,
    Mobile,
    MobileThumb,
}

impl ImagePreset {
    pub const ALL: [Self; 11] = [
        Self::Thumbnail,
        Self::Medium,
        Self::Large,
        Self::Hero,
        Self::Product,
        Self::ProductZoom,
        Self::ProductList,
        Self::BlogHero,
        Self::BlogThumbnail,
        Self::Mobile,
        Self::MobileThumb,
    ];

    /// Cloudinary transformation string.
    #[must_use]
    pub const fn transform(self) -> &'static str {
        match self {
            Self::Thumbnail => "w_300,h_300,c_fill,q_auto,f_webp",
            Self::Medium => "w_800,h_800,c_fit,q_auto,f_webp",
            Self::Large => "w_1200,h_1200,c_fit,q_auto:best,f_webp",
            Self::Hero => "w_1920,h_1080,c_fill,q_auto:best,f_webp",
            Self::Product => "w_800,h_800,c_pad,b_white,q_auto,f_webp",
            Self::ProductZoom => "w_1600,h_1600,c_pad,b_white,q_auto:best,f_webp",
            Self::ProductList => "w_400,h_400,c_fill,q_auto,f_webp,ar_1:1",
            Self::BlogHero => "w_1200,h_600,c_fill,q_auto,f_webp",
            Self::BlogThumbnail => "w_400,h_250,c_fill,q_auto,f_webp",
            Self::Mobile => "w_600,q_auto,f_webp,dpr_auto",
            Self::MobileThumb => "w_200,h_200,c_fill,q_auto,f_webp,dpr_auto",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Hero => "hero",
            Self::Product => "product",
            Self::ProductZoom => "product_zoom",
            Self::ProductList => "product_list",
            Self::BlogHero => "blog_hero",
            Self::BlogThumbnail => "blog_thumbnail",
            Self::Mobile => "mobile",
            Self::MobileThumb => "mobile_thumb",
        }
    }
}

impl FromStr for ImagePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.name() == normalized || p.name().replace('_', "") == normalized)
            .ok_or_else(|| format!("unknown image preset: {s}"))
    }
}

/// Preset name or raw transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform<'a> {
    Preset(ImagePreset),
    Raw(&'a str),
}

impl<'a> Transform<'a> {
    /// Anything containing a comma is a raw transformation; other strings
    /// are preset names, falling back to `medium`.
    #[must_use]
    pub fn parse(value: &'a str) -> Self {
        if value.contains(',') {
            Self::Raw(value)
        } else {
            Self::Preset(value.parse().unwrap_or_default())
        }
    }

    const fn as_str(self) -> &'a str {
        match self {
            Self::Preset(preset) => preset.transform(),
            Self::Raw(raw) => raw,
        }
    }
}

impl From<ImagePreset> for Transform<'_> {
    fn from(preset: ImagePreset) -> Self {
        Self::Preset(preset)
    }
}

/// Mobile, tablet and desktop variants of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponsiveSizes {
    pub mobile: String,
    pub tablet: String,
    pub desktop: String,
}

/// Rewrites image URLs for one Cloudinary account.
#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    cloud_name: String,
}

impl ImageOptimizer {
    #[must_use]
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
        }
    }

    /// Cloudinary fetch URL for `url`.
    #[must_use]
    pub fn image_url<'a>(&self, url: &str, transform: impl Into<Transform<'a>>) -> String {
        if url.trim().is_empty() {
            return PLACEHOLDER_IMAGE.to_string();
        }
        if is_optimized(url) || is_local(url) || !url.starts_with("http") {
            return url.to_string();
        }

        format!(
            "https://{CLOUDINARY_HOST}/{}/image/fetch/{}/{}",
            self.cloud_name,
            transform.into().as_str(),
            urlencoding::encode(url)
        )
    }

    /// Cloudinary video fetch URL; empty input stays empty.
    #[must_use]
    pub fn video_url(&self, url: &str, transform: Option<&str>) -> String {
        if url.is_empty() || url.contains(CLOUDINARY_HOST) || !url.starts_with("http") {
            return url.to_string();
        }

        format!(
            "https://{CLOUDINARY_HOST}/{}/video/fetch/{}/{}",
            self.cloud_name,
            transform.unwrap_or(DEFAULT_VIDEO_TRANSFORM),
            urlencoding::encode(url)
        )
    }

    #[must_use]
    pub fn responsive_sizes(&self, url: &str) -> ResponsiveSizes {
        ResponsiveSizes {
            mobile: self.image_url(url, Transform::Raw("w_600,q_auto,f_webp")),
            tablet: self.image_url(url, Transform::Raw("w_1024,q_auto,f_webp")),
            desktop: self.image_url(url, Transform::Raw("w_1920,q_auto,f_webp")),
        }
    }

    fn rewrite(&self, image: &mut Image, preset: ImagePreset) {
        image.url = self.image_url(&image.url, preset);
    }

    /// Rewrite every image of a product for detail pages.
    pub fn optimize_product(&self, product: &mut Product) {
        if let Some(image) = &mut product.featured_image {
            self.rewrite(image, ImagePreset::Product);
        }
        for image in &mut product.images {
            self.rewrite(image, ImagePreset::Product);
        }
        for image in product.variants.iter_mut().filter_map(|v| v.image.as_mut()) {
            self.rewrite(image, ImagePreset::Thumbnail);
        }
    }

    /// Rewrite the images a product card shows.
    pub fn optimize_product_card(&self, product: &mut Product) {
        if let Some(image) = &mut product.featured_image {
            self.rewrite(image, ImagePreset::ProductList);
        }
        for image in &mut product.images {
            self.rewrite(image, ImagePreset::ProductList);
        }
    }

    pub fn optimize_collection(&self, collection: &mut Collection) {
        if let Some(image) = &mut collection.image {
            self.rewrite(image, ImagePreset::Hero);
        }
        for product in &mut collection.products {
            self.optimize_product_card(product);
        }
    }

    pub fn optimize_article(&self, article: &mut Article, hero: bool) {
        if let Some(image) = &mut article.image {
            let preset = if hero {
                ImagePreset::BlogHero
            } else {
                ImagePreset::BlogThumbnail
            };
            self.rewrite(image, preset);
        }
    }
}

fn is_local(url: &str) -> bool {
    url.starts_with('/') || url.contains("localhost")
}

/// Whether `url` needs no further optimization.
#[must_use]
pub fn is_optimized(url: &str) -> bool {
    url.contains(CLOUDINARY_HOST)
        || url.contains("placeholder")
        || url.starts_with('/')
        || url.contains("data:image")
}

/// Alt text for product images.
#[must_use]
pub fn image_alt(product_title: Option<&str>, index: Option<usize>) -> String {
    match (product_title.filter(|t| !t.is_empty()), index) {
        (None, _) => "Produktbild".to_string(),
        (Some(title), Some(i)) if i > 0 => format!("{title} - AlltagsGold (Bild {})", i + 1),
        (Some(title), _) => format!("{title} - AlltagsGold"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOPIFY_URL: &str = "https://cdn.shopify.com/s/files/1/tasse.jpg?v=1";

    fn optimizer() -> ImageOptimizer {
        ImageOptimizer::new("alltagsgold")
    }

    #[test]
    fn test_preset_url() {
        assert_eq!(
            optimizer().image_url(SHOPIFY_URL, ImagePreset::Thumbnail),
            "https://res.cloudinary.com/alltagsgold/image/fetch/w_300,h_300,c_fill,q_auto,f_webp/https%3A%2F%2Fcdn.shopify.com%2Fs%2Ffiles%2F1%2Ftasse.jpg%3Fv%3D1"
        );
    }

    #[test]
    fn test_raw_transform_passes_through() {
        let url = optimizer().image_url(SHOPIFY_URL, Transform::parse("w_50,h_50"));
        assert!(url.contains("/image/fetch/w_50,h_50/"));
    }

    #[test]
    fn test_unknown_preset_falls_back_to_medium() {
        assert_eq!(Transform::parse("gigantic"), Transform::Preset(ImagePreset::Medium));
        assert_eq!(Transform::parse("productZoom"), Transform::Preset(ImagePreset::ProductZoom));
        assert_eq!(Transform::parse("blog-hero"), Transform::Preset(ImagePreset::BlogHero));
    }

    #[test]
    fn test_urls_left_unchanged() {
        let o = optimizer();
        for url in [
            "https://res.cloudinary.com/alltagsgold/image/upload/x.jpg",
            "/images/logo.svg",
            "http://localhost:3000/a.png",
            "https://via.placeholder.com/100",
            "data:image/png;base64,AAAA",
            "ftp://example.com/a.png",
        ] {
            assert_eq!(o.image_url(url, ImagePreset::Medium), url);
        }
    }

    #[test]
    fn test_empty_url_gets_placeholder() {
        assert_eq!(optimizer().image_url("", ImagePreset::Medium), PLACEHOLDER_IMAGE);
        assert_eq!(optimizer().image_url("  ", ImagePreset::Medium), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_video_url() {
        let o = optimizer();
        assert_eq!(
            o.video_url("https://cdn.shopify.com/v.mp4", None),
            "https://res.cloudinary.com/alltagsgold/video/fetch/w_800,q_auto,f_auto/https%3A%2F%2Fcdn.shopify.com%2Fv.mp4"
        );
        assert_eq!(o.video_url("", None), "");
    }

    #[test]
    fn test_responsive_sizes() {
        let sizes = optimizer().responsive_sizes(SHOPIFY_URL);
        assert!(sizes.mobile.contains("/w_600,q_auto,f_webp/"));
        assert!(sizes.tablet.contains("/w_1024,q_auto,f_webp/"));
        assert!(sizes.desktop.contains("/w_1920,q_auto,f_webp/"));
    }

    #[test]
    fn test_is_optimized() {
        assert!(is_optimized("https://res.cloudinary.com/x"));
        assert!(is_optimized("/local.png"));
        assert!(!is_optimized(SHOPIFY_URL));
    }

    #[test]
    fn test_image_alt() {
        assert_eq!(image_alt(None, None), "Produktbild");
        assert_eq!(image_alt(Some("Tasse"), None), "Tasse - AlltagsGold");
        assert_eq!(image_alt(Some("Tasse"), Some(0)), "Tasse - AlltagsGold");
        assert_eq!(image_alt(Some("Tasse"), Some(2)), "Tasse - AlltagsGold (Bild 3)");
    }

    #[test]
    fn test_optimize_product_rewrites_images() {
        let mut product = crate::product_cache::tests::product("tasse");
        product.featured_image = Some(Image {
            id: None,
            url: SHOPIFY_URL.to_string(),
            alt_text: None,
            width: None,
            height: None,
        });
        optimizer().optimize_product(&mut product);
        let url = product.featured_image.map(|i| i.url).unwrap_or_default();
        assert!(url.contains("/image/fetch/w_800,h_800,c_pad,b_white,q_auto,f_webp/"));
    }
}
