//! Cache revalidation for Shopify webhooks and manual triggers.
//!
//! A request is authorized by the revalidate secret (query or bearer token);
//! requests carrying a Shopify topic are additionally HMAC-checked when a
//! webhook secret is configured. The plan names the affected resource and
//! the storefront paths whose data changed; identical plans within the
//! dedupe window are reported as duplicates and not executed again.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::config::secret_matches;

type HmacSha256 = Hmac<Sha256>;

/// Identical revalidations inside this window are skipped.
pub const DEDUPE_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevalidateError {
    #[error("Invalid token")]
    Unauthorized,
    #[error("Invalid HMAC")]
    InvalidHmac,
}

/// Resource type a revalidation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Product,
    Collection,
}

impl ResourceType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(Self::Product),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Collection => "collection",
        }
    }
}

/// Incoming request, already split into the parts that matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevalidateRequest<'a> {
    pub query_secret: Option<&'a str>,
    pub authorization: Option<&'a str>,
    /// `X-Shopify-Topic`, e.g. `products/update`.
    pub topic: Option<&'a str>,
    /// `X-Shopify-Hmac-Sha256`.
    pub hmac: Option<&'a str>,
    pub body: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inferred {
    #[serde(rename = "type")]
    pub resource: Option<ResourceType>,
    pub handle: Option<String>,
}

/// What a revalidation affects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevalidationPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub inferred: Inferred,
    pub paths: Vec<String>,
    /// Seen inside the dedupe window; nothing should be invalidated.
    pub duplicate: bool,
}

impl RevalidationPlan {
    /// Shopify `*/create` topics.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.topic.as_deref().is_some_and(|t| t.ends_with("/create"))
    }
}

/// Authorizes and plans revalidations, remembering recent ones.
#[derive(Debug)]
pub struct Revalidator {
    secret: Option<SecretString>,
    webhook_secret: Option<SecretString>,
    recent: Mutex<HashMap<String, Instant>>,
}

impl Revalidator {
    #[must_use]
    pub fn new(secret: Option<SecretString>, webhook_secret: Option<SecretString>) -> Self {
        Self {
            secret,
            webhook_secret,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// # Errors
    ///
    /// `Unauthorized` for a missing or wrong secret (or none configured),
    /// `InvalidHmac` for a webhook whose signature doesn't match.
    pub fn plan(&self, request: &RevalidateRequest<'_>) -> Result<RevalidationPlan, RevalidateError> {
        self.plan_at(request, Instant::now())
    }

    /// [`plan`](Self::plan) as of `now`.
    ///
    /// # Errors
    ///
    /// Same as [`plan`](Self::plan).
    pub fn plan_at(
        &self,
        request: &RevalidateRequest<'_>,
        now: Instant,
    ) -> Result<RevalidationPlan, RevalidateError> {
        self.authorize(request)?;

        let topic = request.topic.filter(|t| !t.is_empty());
        if let (Some(_), Some(secret)) = (topic, &self.webhook_secret)
            && !verify_shopify_hmac(secret, request.body, request.hmac)
        {
            return Err(RevalidateError::InvalidHmac);
        }

        let body: Value = serde_json::from_slice(request.body).unwrap_or(Value::Null);
        let inferred = infer(&body, topic);
        let paths = paths_for(&inferred);

        let key = format!(
            "{}:{}:{}",
            inferred.resource.map_or("unknown", ResourceType::as_str),
            inferred.handle.as_deref().unwrap_or("unknown"),
            topic.unwrap_or_default()
        );

        Ok(RevalidationPlan {
            topic: topic.map(str::to_string),
            inferred,
            paths,
            duplicate: self.is_duplicate(key, now),
        })
    }

    fn authorize(&self, request: &RevalidateRequest<'_>) -> Result<(), RevalidateError> {
        let Some(secret) = &self.secret else {
            return Err(RevalidateError::Unauthorized);
        };

        let bearer = request
            .authorization
            .and_then(|h| h.strip_prefix("Bearer "));
        let matches = [request.query_secret, bearer]
            .into_iter()
            .flatten()
            .any(|candidate| secret_matches(secret, candidate));

        if matches {
            Ok(())
        } else {
            Err(RevalidateError::Unauthorized)
        }
    }

    fn is_duplicate(&self, key: String, now: Instant) -> bool {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.retain(|_, at| now.saturating_duration_since(*at) < DEDUPE_WINDOW);

        if recent.contains_key(&key) {
            return true;
        }
        recent.insert(key, now);
        false
    }
}

/// Base64 HMAC-SHA256 of the raw body, compared in constant time.
#[must_use]
pub fn verify_shopify_hmac(secret: &SecretString, body: &[u8], header: Option<&str>) -> bool {
    let Some(signature) = header.and_then(|h| BASE64.decode(h.trim()).ok()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Resource type from the body or the topic; handle from the usual places
/// in manual and webhook payloads.
fn infer(body: &Value, topic: Option<&str>) -> Inferred {
    let resource = body
        .get("type")
        .and_then(Value::as_str)
        .and_then(ResourceType::parse)
        .or_else(|| {
            let topic = topic.unwrap_or_default();
            if topic.starts_with("products/") {
                Some(ResourceType::Product)
            } else if topic.starts_with("collections/") {
                Some(ResourceType::Collection)
            } else {
                None
            }
        });

    let handle = ["/handle", "/product/handle", "/collection/handle"]
        .into_iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .filter(|h| !h.is_empty())
        .map(str::to_string);

    Inferred { resource, handle }
}

fn paths_for(inferred: &Inferred) -> Vec<String> {
    let mut paths = vec!["/products".to_string(), "/collections".to_string()];
    match (inferred.resource, &inferred.handle) {
        (Some(ResourceType::Product), Some(handle)) => paths.push(format!("/products/{handle}")),
        (Some(ResourceType::Collection), Some(handle)) => {
            paths.push(format!("/collections/{handle}"));
        }
        _ => {}
    }
    paths
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "rv_8d1f6c2a9e4b7053";
    const WEBHOOK_SECRET: &str = "whsec_52c9e1a7f03b48d6";

    fn revalidator() -> Revalidator {
        Revalidator::new(
            Some(SecretString::from(SECRET)),
            Some(SecretString::from(WEBHOOK_SECRET)),
        )
    }

    fn sign(body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    fn manual(body: &[u8]) -> RevalidateRequest<'_> {
        RevalidateRequest {
            query_secret: Some(SECRET),
            body,
            ..RevalidateRequest::default()
        }
    }

    #[test]
    fn test_rejects_missing_or_wrong_secret() {
        let r = revalidator();
        let body = br#"{}"#;
        let no_secret = RevalidateRequest { body, ..RevalidateRequest::default() };
        assert_eq!(r.plan(&no_secret), Err(RevalidateError::Unauthorized));

        let wrong = RevalidateRequest { query_secret: Some("nope"), body, ..RevalidateRequest::default() };
        assert_eq!(r.plan(&wrong), Err(RevalidateError::Unauthorized));

        let unconfigured = Revalidator::new(None, None);
        assert_eq!(unconfigured.plan(&manual(body)), Err(RevalidateError::Unauthorized));
    }

    #[test]
    fn test_accepts_bearer_token() {
        let bearer = format!("Bearer {SECRET}");
        let request = RevalidateRequest {
            authorization: Some(&bearer),
            body: b"{}",
            ..RevalidateRequest::default()
        };
        assert!(revalidator().plan(&request).is_ok());
    }

    #[test]
    fn test_manual_product_plan() {
        let plan = revalidator()
            .plan(&manual(br#"{"type":"product","handle":"tasse"}"#))
            .unwrap();
        assert_eq!(plan.inferred.resource, Some(ResourceType::Product));
        assert_eq!(plan.inferred.handle.as_deref(), Some("tasse"));
        assert_eq!(plan.paths, vec!["/products", "/collections", "/products/tasse"]);
        assert!(!plan.duplicate);
        assert!(!plan.is_create());
    }

    #[test]
    fn test_webhook_infers_from_topic_and_payload() {
        let body = br#"{"id":1,"collection":{"handle":"kueche"}}"#;
        let hmac = sign(body);
        let request = RevalidateRequest {
            topic: Some("collections/create"),
            hmac: Some(&hmac),
            ..manual(body)
        };
        let plan = revalidator().plan(&request).unwrap();
        assert_eq!(plan.inferred.resource, Some(ResourceType::Collection));
        assert_eq!(plan.inferred.handle.as_deref(), Some("kueche"));
        assert_eq!(plan.paths.last().map(String::as_str), Some("/collections/kueche"));
        assert!(plan.is_create());
    }

    #[test]
    fn test_webhook_with_bad_hmac_is_rejected() {
        let body = br#"{"handle":"tasse"}"#;
        let request = RevalidateRequest {
            topic: Some("products/update"),
            hmac: Some("AAAA"),
            ..manual(body)
        };
        assert_eq!(revalidator().plan(&request), Err(RevalidateError::InvalidHmac));

        let unsigned = RevalidateRequest {
            topic: Some("products/update"),
            ..manual(body)
        };
        assert_eq!(revalidator().plan(&unsigned), Err(RevalidateError::InvalidHmac));
    }

    #[test]
    fn test_hmac_not_required_without_webhook_secret() {
        let r = Revalidator::new(Some(SecretString::from(SECRET)), None);
        let request = RevalidateRequest {
            topic: Some("products/update"),
            ..manual(br#"{"handle":"tasse"}"#)
        };
        let plan = r.plan(&request).unwrap();
        assert_eq!(plan.inferred.resource, Some(ResourceType::Product));
        assert_eq!(plan.inferred.handle.as_deref(), Some("tasse"));
    }

    #[test]
    fn test_duplicates_within_window() {
        let r = revalidator();
        let body = br#"{"type":"product","handle":"tasse"}"#;
        let start = Instant::now();

        assert!(!r.plan_at(&manual(body), start).unwrap().duplicate);
        assert!(r.plan_at(&manual(body), start + Duration::from_secs(4)).unwrap().duplicate);
        assert!(!r.plan_at(&manual(body), start + Duration::from_secs(6)).unwrap().duplicate);

        let other = br#"{"type":"product","handle":"teller"}"#;
        assert!(!r.plan_at(&manual(other), start + Duration::from_secs(6)).unwrap().duplicate);
    }

    #[test]
    fn test_unparseable_body_still_revalidates_listings() {
        let plan = revalidator().plan(&manual(b"not json")).unwrap();
        assert_eq!(plan.inferred, Inferred { resource: None, handle: None });
        assert_eq!(plan.paths, vec!["/products", "/collections"]);
    }
}
