//! Click events as sent by the browser tracker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest `text` / `user_agent` kept per event, in characters.
pub const MAX_TEXT_CHARS: usize = 100;

/// Viewport coordinates of a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single click recorded by the storefront's click tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickEvent {
    /// Lowercase tag name (`a`, `button`, `img`, ...).
    pub element: String,
    pub text: Option<String>,
    pub href: Option<String>,
    pub class_name: Option<String>,
    pub id: Option<String>,
    /// Absent for clicks the tracker couldn't place.
    pub position: Option<Position>,
    /// Path of the page the click happened on.
    pub page: String,
    /// Client timestamp in milliseconds since the epoch.
    pub timestamp: i64,
    pub user_agent: String,
    pub session_id: String,
}

/// Rejected click event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClickError {
    #[error("Missing required fields")]
    MissingFields,
}

impl ClickEvent {
    /// Check required fields and cap free-text lengths.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` if `element`, `page` or `session_id` is empty.
    pub fn validated(mut self) -> Result<Self, ClickError> {
        if self.element.is_empty() || self.page.is_empty() || self.session_id.is_empty() {
            return Err(ClickError::MissingFields);
        }

        self.text = self.text.map(|t| truncate_chars(&t, MAX_TEXT_CHARS));
        self.user_agent = truncate_chars(&self.user_agent, MAX_TEXT_CHARS);
        Ok(self)
    }

    /// Whether the user agent looks like a phone or tablet.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        ["Mobile", "Android", "iPhone", "iPad"]
            .iter()
            .any(|marker| self.user_agent.contains(marker))
    }

    /// Analytics event name derived from the link target or element type.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        if let Some(href) = &self.href {
            return if href.contains("/products/") {
                "Product_Link_Click"
            } else if href.contains("/collections/") {
                "Collection_Link_Click"
            } else if href.contains("/cart") {
                "Cart_Link_Click"
            } else if href.contains("mailto:") {
                "Email_Link_Click"
            } else if href.contains("tel:") {
                "Phone_Link_Click"
            } else {
                "External_Link_Click"
            };
        }

        match self.element.as_str() {
            "button" => {
                let text = self.text.as_deref().unwrap_or_default().to_lowercase();
                if text.contains("cart") {
                    "Add_To_Cart_Button"
                } else if text.contains("buy") {
                    "Buy_Button_Click"
                } else if text.contains("search") {
                    "Search_Button_Click"
                } else if text.contains("filter") {
                    "Filter_Button_Click"
                } else {
                    "Button_Click"
                }
            }
            "img" if self.class_contains("product") => "Product_Image_Click",
            "img" => "Image_Click",
            "input" if self.class_contains("search") => "Search_Input_Focus",
            "input" => "Input_Focus",
            _ => "Element_Click",
        }
    }

    fn class_contains(&self, needle: &str) -> bool {
        self.class_name.as_deref().is_some_and(|c| c.contains(needle))
    }
}

/// Cut `s` to at most `max` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn click(element: &str) -> ClickEvent {
        ClickEvent {
            element: element.to_string(),
            page: "/".to_string(),
            session_id: "session_1700000000000_k3j9x2m1q".to_string(),
            ..ClickEvent::default()
        }
    }

    fn link(href: &str) -> ClickEvent {
        ClickEvent {
            href: Some(href.to_string()),
            ..click("a")
        }
    }

    #[test]
    fn test_deserializes_browser_payload() {
        let event: ClickEvent = serde_json::from_str(
            r#"{
                "element": "button",
                "text": "In den Warenkorb",
                "className": "btn btn-primary",
                "position": { "x": 120, "y": 640 },
                "page": "/products/tasse",
                "timestamp": 1700000000000,
                "userAgent": "Mozilla/5.0 (iPhone)",
                "sessionId": "session_1"
            }"#,
        )
        .unwrap();
        assert_eq!(event.class_name.as_deref(), Some("btn btn-primary"));
        assert!(event.position.is_some_and(|p| (p.y - 640.0).abs() < f64::EPSILON));
        assert!(event.is_mobile());
    }

    #[test]
    fn test_validation_requires_fields() {
        assert!(click("a").validated().is_ok());
        assert_eq!(click("").validated(), Err(ClickError::MissingFields));

        let mut no_session = click("a");
        no_session.session_id.clear();
        assert_eq!(no_session.validated(), Err(ClickError::MissingFields));

        let mut no_page = click("a");
        no_page.page.clear();
        assert_eq!(no_page.validated(), Err(ClickError::MissingFields));
    }

    #[test]
    fn test_validation_truncates_text() {
        let mut event = click("p");
        event.text = Some("ä".repeat(150));
        event.user_agent = "x".repeat(300);
        let event = event.validated().unwrap();
        assert_eq!(event.text.unwrap().chars().count(), MAX_TEXT_CHARS);
        assert_eq!(event.user_agent.len(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_link_event_names() {
        assert_eq!(link("/products/tasse").event_name(), "Product_Link_Click");
        assert_eq!(link("/collections/kueche").event_name(), "Collection_Link_Click");
        assert_eq!(link("/cart").event_name(), "Cart_Link_Click");
        assert_eq!(link("mailto:info@alltagsgold.ch").event_name(), "Email_Link_Click");
        assert_eq!(link("tel:+41441234567").event_name(), "Phone_Link_Click");
        assert_eq!(link("https://instagram.com").event_name(), "External_Link_Click");
    }

    #[test]
    fn test_button_event_names() {
        let button = |text: &str| ClickEvent {
            text: Some(text.to_string()),
            ..click("button")
        };
        assert_eq!(button("Add to Cart").event_name(), "Add_To_Cart_Button");
        assert_eq!(button("Buy now").event_name(), "Buy_Button_Click");
        assert_eq!(button("Search").event_name(), "Search_Button_Click");
        assert_eq!(button("Filter").event_name(), "Filter_Button_Click");
        assert_eq!(button("Mehr").event_name(), "Button_Click");
        assert_eq!(click("button").event_name(), "Button_Click");
    }

    #[test]
    fn test_image_and_input_event_names() {
        let with_class = |element: &str, class: &str| ClickEvent {
            class_name: Some(class.to_string()),
            ..click(element)
        };
        assert_eq!(with_class("img", "product-image").event_name(), "Product_Image_Click");
        assert_eq!(click("img").event_name(), "Image_Click");
        assert_eq!(with_class("input", "search-field").event_name(), "Search_Input_Focus");
        assert_eq!(click("input").event_name(), "Input_Focus");
        assert_eq!(click("div").event_name(), "Element_Click");
    }

    #[test]
    fn test_is_mobile() {
        let mut event = click("a");
        event.user_agent = "Mozilla/5.0 (Linux; Android 14)".to_string();
        assert!(event.is_mobile());
        event.user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string();
        assert!(!event.is_mobile());
    }
}
