//! In-memory click store and the summary served to the dashboard.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::ClickEvent;

const TOP_ENTRIES: usize = 5;
const HEATMAP_POINTS: usize = 20;
/// Clicks closer than this on both axes share a heatmap point.
const HEATMAP_RADIUS: f64 = 50.0;

/// Most recent clicks plus the session ids seen, both bounded. The
/// oldest session is forgotten first.
#[derive(Debug)]
pub struct ClickStore {
    clicks: VecDeque<ClickEvent>,
    capacity: usize,
    sessions: HashSet<String>,
    session_order: VecDeque<String>,
    session_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementCount {
    pub element: String,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub page: String,
    pub clicks: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub x: f64,
    pub y: f64,
    pub intensity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickSummary {
    pub total_clicks: usize,
    pub unique_sessions: usize,
    pub top_elements: Vec<ElementCount>,
    pub top_pages: Vec<PageCount>,
    pub heatmap_data: Vec<HeatmapPoint>,
}

impl ClickStore {
    #[must_use]
    pub fn new(capacity: usize, session_capacity: usize) -> Self {
        Self {
            clicks: VecDeque::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            sessions: HashSet::new(),
            session_order: VecDeque::new(),
            session_capacity: session_capacity.max(1),
        }
    }

    /// Append a batch, dropping the oldest clicks beyond capacity.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = ClickEvent>) {
        for click in batch {
            self.remember_session(&click.session_id);
            if self.clicks.len() == self.capacity {
                self.clicks.pop_front();
            }
            self.clicks.push_back(click);
        }
    }

    fn remember_session(&mut self, session_id: &str) {
        if self.sessions.contains(session_id) {
            return;
        }
        if self.session_order.len() == self.session_capacity
            && let Some(oldest) = self.session_order.pop_front()
        {
            self.sessions.remove(&oldest);
        }
        self.sessions.insert(session_id.to_string());
        self.session_order.push_back(session_id.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> ClickSummary {
        let total = self.clicks.len();

        let top_elements = top_counts(self.clicks.iter().map(|c| c.element.as_str()))
            .into_iter()
            .map(|(element, count)| ElementCount {
                element: element.to_string(),
                count,
                percentage: percentage(count, total),
            })
            .collect();

        let top_pages = top_counts(self.clicks.iter().map(|c| c.page.as_str()))
            .into_iter()
            .map(|(page, clicks)| PageCount {
                page: page.to_string(),
                clicks,
                percentage: percentage(clicks, total),
            })
            .collect();

        ClickSummary {
            total_clicks: total,
            unique_sessions: self.sessions.len(),
            top_elements,
            top_pages,
            heatmap_data: self.heatmap(),
        }
    }

    /// Greedy clustering: each placed click joins the first point within
    /// the radius, otherwise starts a new one at its own position.
    fn heatmap(&self) -> Vec<HeatmapPoint> {
        let mut points: Vec<HeatmapPoint> = Vec::new();
        for pos in self.clicks.iter().filter_map(|c| c.position) {
            match points.iter_mut().find(|p| {
                (p.x - pos.x).abs() < HEATMAP_RADIUS && (p.y - pos.y).abs() < HEATMAP_RADIUS
            }) {
                Some(point) => point.intensity += 1,
                None => points.push(HeatmapPoint {
                    x: pos.x,
                    y: pos.y,
                    intensity: 1,
                }),
            }
        }

        // Stable sort keeps first-seen order among equal intensities
        points.sort_by(|a, b| b.intensity.cmp(&a.intensity));
        points.truncate(HEATMAP_POINTS);
        points
    }
}

/// Counts in descending order, first-seen order on ties, at most five.
fn top_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        let count = counts.entry(value).or_insert_with(|| {
            order.push(value);
            0
        });
        *count += 1;
    }

    let mut ranked: Vec<(&str, usize)> = order
        .into_iter()
        .map(|v| (v, counts.get(v).copied().unwrap_or_default()))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(TOP_ENTRIES);
    ranked
}

/// Share of `total` as a rounded whole percentage.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::Position;
    use super::*;

    fn click(element: &str, page: &str, session: &str, x: f64, y: f64) -> ClickEvent {
        ClickEvent {
            element: element.to_string(),
            page: page.to_string(),
            session_id: session.to_string(),
            position: Some(Position { x, y }),
            ..ClickEvent::default()
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = ClickStore::new(10, 100).summary();
        assert_eq!(summary.total_clicks, 0);
        assert!(summary.top_elements.is_empty());
        assert!(summary.heatmap_data.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut store = ClickStore::new(3, 100);
        store.extend((0..5).map(|i| click("a", &format!("/p{i}"), "s", 0.0, 0.0)));
        assert_eq!(store.len(), 3);
        let pages: Vec<String> = store.summary().top_pages.into_iter().map(|p| p.page).collect();
        assert_eq!(pages, vec!["/p2", "/p3", "/p4"]);
    }

    #[test]
    fn test_sessions_outlive_dropped_clicks() {
        let mut store = ClickStore::new(1, 100);
        store.extend([click("a", "/", "s1", 0.0, 0.0), click("a", "/", "s2", 0.0, 0.0)]);
        assert_eq!(store.summary().unique_sessions, 2);
    }

    #[test]
    fn test_session_count_is_bounded() {
        let mut store = ClickStore::new(100, 3);
        store.extend((0..10).map(|i| click("a", "/", &format!("s{i}"), 0.0, 0.0)));
        assert_eq!(store.summary().unique_sessions, 3);

        // A remembered session isn't counted twice
        store.extend([click("a", "/", "s9", 0.0, 0.0)]);
        assert_eq!(store.summary().unique_sessions, 3);
    }

    #[test]
    fn test_top_elements_and_percentages() {
        let mut store = ClickStore::new(100, 100);
        store.extend([
            click("button", "/", "s", 0.0, 0.0),
            click("a", "/", "s", 0.0, 0.0),
            click("button", "/cart", "s", 0.0, 0.0),
        ]);
        let summary = store.summary();
        assert_eq!(
            summary.top_elements,
            vec![
                ElementCount { element: "button".to_string(), count: 2, percentage: 67 },
                ElementCount { element: "a".to_string(), count: 1, percentage: 33 },
            ]
        );
        assert_eq!(summary.top_pages[0].page, "/");
        assert_eq!(summary.top_pages[0].clicks, 2);
    }

    #[test]
    fn test_top_lists_are_capped() {
        let mut store = ClickStore::new(100, 100);
        store.extend((0..8).map(|i| click(&format!("e{i}"), &format!("/p{i}"), "s", 0.0, 0.0)));
        let summary = store.summary();
        assert_eq!(summary.top_elements.len(), 5);
        assert_eq!(summary.top_pages.len(), 5);
    }

    #[test]
    fn test_heatmap_clusters_nearby_clicks() {
        let mut store = ClickStore::new(100, 100);
        store.extend([
            click("a", "/", "s", 100.0, 100.0),
            click("a", "/", "s", 140.0, 60.0),
            click("a", "/", "s", 500.0, 500.0),
            click("a", "/", "s", 149.0, 100.0),
            // 50px away on x is outside the cluster
            click("a", "/", "s", 150.0, 100.0),
        ]);
        let heatmap = store.summary().heatmap_data;
        assert_eq!(heatmap.len(), 3);
        assert_eq!(heatmap[0].intensity, 3);
        assert!((heatmap[0].x - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_heatmap_skips_clicks_without_position() {
        let unplaced: ClickEvent =
            serde_json::from_str(r#"{"element":"a","page":"/","sessionId":"s"}"#).unwrap();
        let mut store = ClickStore::new(10, 100);
        store.extend([unplaced.clone(), unplaced, click("a", "/", "s", 300.0, 200.0)]);

        let summary = store.summary();
        assert_eq!(summary.total_clicks, 3);
        assert_eq!(
            summary.heatmap_data,
            vec![HeatmapPoint { x: 300.0, y: 200.0, intensity: 1 }]
        );
    }

    #[test]
    fn test_heatmap_keeps_twenty_hottest() {
        let mut store = ClickStore::new(1000, 100);
        store.extend((0..30).map(|i| click("a", "/", "s", f64::from(i) * 100.0, 0.0)));
        store.extend([click("a", "/", "s", 2900.0, 0.0)]);
        let heatmap = store.summary().heatmap_data;
        assert_eq!(heatmap.len(), 20);
        assert_eq!(heatmap[0].intensity, 2);
    }
}
