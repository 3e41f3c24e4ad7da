//! Core Web Vitals beacons.

use serde::Deserialize;

/// One metric as reported by the browser's web-vitals library.
#[derive(Debug, Clone, Deserialize)]
pub struct WebVital {
    /// Metric name (`LCP`, `CLS`, `INP`, `FCP`, `TTFB`).
    pub name: String,
    pub value: f64,
    /// Unique id of this metric instance.
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl WebVital {
    pub fn record(&self) {
        tracing::info!(
            metric = %self.name,
            value = self.value,
            metric_id = %self.id,
            url = self.url.as_deref().unwrap_or_default(),
            "Web vital"
        );
    }
}
