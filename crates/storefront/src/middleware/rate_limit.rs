//! Per-IP rate limiting using governor and `tower_governor`.
//!
//! - `error_report_rate_limiter`: `/api/errors`, ~10 reports per minute
//! - `proxy_rate_limiter`: `/api/shopify-proxy`, ~100 queries per minute

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP from proxy headers, falling back to the socket peer.
///
/// Checks `CF-Connecting-IP`, the first `X-Forwarded-For` hop and
/// `X-Real-IP`, in that order.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

const IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        IP_HEADERS
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.split(',').next())
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            })
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// 10 error reports per IP, refilling one every 6 seconds.
///
/// # Panics
///
/// Never: `per_second(6)` and `burst_size(10)` are valid positive values.
#[must_use]
pub fn error_report_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// 100 proxied queries per IP, refilling one every 600ms.
///
/// # Panics
///
/// Never: `per_millisecond(600)` and `burst_size(100)` are valid positive values.
#[must_use]
pub fn proxy_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(600)
        .burst_size(100)
        .finish()
        .expect("rate limiter config with per_millisecond(600) and burst_size(100) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/errors");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).ok(),
            "203.0.113.7".parse().ok()
        );
    }

    #[test]
    fn test_uses_first_forwarded_hop() {
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.1")]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).ok(),
            "198.51.100.4".parse().ok()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[("x-real-ip", "garbage")]);
        let peer: SocketAddr = "192.0.2.9:51234".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).ok(),
            Some(peer.ip())
        );
    }

    #[test]
    fn test_no_ip_is_an_error() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }
}
