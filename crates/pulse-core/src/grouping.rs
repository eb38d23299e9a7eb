//! Dimension grouping over an in-window fact set.
//!
//! Every grouping returns buckets sorted by count descending; ties keep
//! first-seen order, so the scan order of the input (insertion order from the
//! store) is part of the contract. Dimension strings are never empty — the
//! write boundary coalesces blanks to `"Unknown"` — except for the traffic
//! source, where the empty string gets its own bucket.

use std::collections::HashMap;

use serde::Serialize;

use crate::fact::{CustomEvent, PageView, Visit};
use crate::metrics::round1;

/// Label for the empty-source bucket.
pub const DIRECT_TRAFFIC: &str = "Direct Traffic";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBucket {
    pub source: String,
    pub count: u64,
    /// Share of all in-window visits, one-decimal rounding.
    pub percentage: f64,
}

/// A location bucket keyed by the city+region+country triple; the component
/// strings ride along for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationBucket {
    pub city: String,
    pub region: String,
    pub country: String,
    pub count: u64,
}

/// Count occurrences preserving first-seen order, then stable-sort by count
/// descending so equal counts keep that order.
fn count_by<I>(values: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = String>,
{
    let mut order: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for value in values {
        match index.get(&value) {
            Some(&at) => order[at].count += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push(Bucket { value, count: 1 });
            }
        }
    }
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order
}

/// Strip the leading scheme/host portion of a page URL, keeping the path,
/// query string and fragment as the grouping key.
///
/// The stripped prefix is the longest run of `//` pairs and host-like
/// segments ending in a slash, so `https://example.com/blog/post-1?x=1`,
/// `//example.com/blog/post-1?x=1` and `/blog/post-1?x=1` all group under
/// `blog/post-1?x=1`.
pub fn strip_page_key(page: &str) -> String {
    let bytes = page.as_bytes();
    let mut boundary: Option<usize> = None;
    let mut at = 0;
    while at < bytes.len() {
        if bytes[at] == b'/' {
            let run_start = at;
            while at < bytes.len() && bytes[at] == b'/' {
                at += 1;
            }
            boundary = Some(at - 1);
            if (at - run_start) % 2 == 1 {
                // Odd slash run: its final slash ends the host prefix.
                break;
            }
        } else {
            at += 1;
        }
    }
    match boundary {
        Some(end) => page[end + 1..].to_string(),
        None => page.to_string(),
    }
}

/// Group pageviews by page key.
pub fn group_pages(page_views: &[PageView]) -> Vec<Bucket> {
    count_by(page_views.iter().map(|view| strip_page_key(&view.page)))
}

/// Group visits by raw source string; the empty source gets its own
/// "Direct Traffic" bucket.
pub fn group_sources(visits: &[Visit]) -> Vec<Bucket> {
    count_by(visits.iter().map(|visit| {
        if visit.source.is_empty() {
            DIRECT_TRAFFIC.to_string()
        } else {
            visit.source.clone()
        }
    }))
}

/// Attach each source bucket's share of the total, one-decimal rounding.
pub fn with_percentages(buckets: &[Bucket]) -> Vec<SourceBucket> {
    let total: u64 = buckets.iter().map(|bucket| bucket.count).sum();
    buckets
        .iter()
        .map(|bucket| SourceBucket {
            source: bucket.value.clone(),
            count: bucket.count,
            percentage: if total == 0 {
                0.0
            } else {
                round1(bucket.count as f64 / total as f64 * 100.0)
            },
        })
        .collect()
}

/// Group pageviews by the city+region+country triple.
pub fn group_locations(page_views: &[PageView]) -> Vec<LocationBucket> {
    let mut order: Vec<LocationBucket> = Vec::new();
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();
    for view in page_views {
        let key = (view.city.clone(), view.region.clone(), view.country.clone());
        match index.get(&key) {
            Some(&at) => order[at].count += 1,
            None => {
                index.insert(key, order.len());
                order.push(LocationBucket {
                    city: view.city.clone(),
                    region: view.region.clone(),
                    country: view.country.clone(),
                    count: 1,
                });
            }
        }
    }
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order
}

pub fn group_operating_systems(page_views: &[PageView]) -> Vec<Bucket> {
    count_by(page_views.iter().map(|view| view.operating_system.clone()))
}

pub fn group_device_types(page_views: &[PageView]) -> Vec<Bucket> {
    count_by(page_views.iter().map(|view| view.device_type.clone()))
}

pub fn group_browsers(page_views: &[PageView]) -> Vec<Bucket> {
    count_by(page_views.iter().map(|view| view.browser_name.clone()))
}

pub fn group_screen_resolutions(page_views: &[PageView]) -> Vec<Bucket> {
    count_by(page_views.iter().map(|view| view.screen_resolution.clone()))
}

/// Group custom events by (already lowercased) name.
pub fn group_event_names(events: &[CustomEvent]) -> Vec<Bucket> {
    count_by(events.iter().map(|event| event.event_name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page_view(page: &str) -> PageView {
        PageView {
            id: uuid::Uuid::new_v4().to_string(),
            domain: "example.com".to_string(),
            page: page.to_string(),
            visit_id: None,
            city: "Berlin".to_string(),
            region: "BE".to_string(),
            country: "DE".to_string(),
            operating_system: "Linux".to_string(),
            device_type: "desktop".to_string(),
            browser_name: "Firefox".to_string(),
            screen_resolution: "1920x1080".to_string(),
            created_at: Utc::now(),
        }
    }

    fn visit(source: &str) -> Visit {
        Visit {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            visitor_id: None,
            website_id: "example.com".to_string(),
            source: source.to_string(),
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            country: "Unknown".to_string(),
            operating_system: "Unknown".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn page_key_strips_scheme_and_host_but_keeps_query() {
        assert_eq!(
            strip_page_key("https://example.com/blog/post-1?x=1"),
            "blog/post-1?x=1"
        );
    }

    #[test]
    fn page_key_handles_paths_and_bare_hosts() {
        assert_eq!(strip_page_key("/about"), "about");
        assert_eq!(strip_page_key("example.com/pricing"), "pricing");
        assert_eq!(strip_page_key("//cdn.example.com/asset"), "asset");
        assert_eq!(strip_page_key("https://example.com/"), "");
        assert_eq!(strip_page_key("no-slash-at-all"), "no-slash-at-all");
    }

    #[test]
    fn pages_with_same_path_group_together() {
        let views = vec![
            page_view("https://example.com/docs"),
            page_view("/docs"),
            page_view("https://example.com/pricing"),
        ];
        let grouped = group_pages(&views);
        assert_eq!(grouped[0], Bucket { value: "docs".to_string(), count: 2 });
        assert_eq!(grouped[1], Bucket { value: "pricing".to_string(), count: 1 });
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let visits: Vec<Visit> = ["A", "A", "A", "B", "B", "B", "C"]
            .iter()
            .map(|s| visit(s))
            .collect();
        let grouped = group_sources(&visits);
        let order: Vec<&str> = grouped.iter().map(|b| b.value.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(grouped[0].count, 3);
        assert_eq!(grouped[1].count, 3);
        assert_eq!(grouped[2].count, 1);
    }

    #[test]
    fn empty_source_is_its_own_direct_traffic_bucket() {
        let visits = vec![visit(""), visit("Direct"), visit("")];
        let grouped = group_sources(&visits);
        assert_eq!(grouped[0].value, DIRECT_TRAFFIC);
        assert_eq!(grouped[0].count, 2);
        assert_eq!(grouped[1].value, "Direct");
    }

    #[test]
    fn source_percentages_round_to_one_decimal() {
        let visits = vec![visit("newsletter"), visit("newsletter"), visit("twitter")];
        let grouped = with_percentages(&group_sources(&visits));
        assert_eq!(grouped[0].percentage, 66.7);
        assert_eq!(grouped[1].percentage, 33.3);
    }

    #[test]
    fn percentages_of_nothing_are_zero() {
        assert!(with_percentages(&[]).is_empty());
    }

    #[test]
    fn locations_group_by_triple_and_carry_components() {
        let mut munich = page_view("/a");
        munich.city = "Munich".to_string();
        munich.region = "BY".to_string();
        let views = vec![page_view("/a"), page_view("/b"), munich];
        let grouped = group_locations(&views);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].city, "Berlin");
        assert_eq!(grouped[0].region, "BE");
        assert_eq!(grouped[0].country, "DE");
        assert_eq!(grouped[0].count, 2);
        assert_eq!(grouped[1].city, "Munich");
    }

    #[test]
    fn event_names_group_by_normalized_value() {
        let events = vec![
            CustomEvent::record("Purchase_Completed", "example.com", "", Utc::now()),
            CustomEvent::record("purchase_completed", "example.com", "", Utc::now()),
            CustomEvent::record("Signup", "example.com", "", Utc::now()),
        ];
        let grouped = group_event_names(&events);
        assert_eq!(
            grouped[0],
            Bucket { value: "purchase_completed".to_string(), count: 2 }
        );
        assert_eq!(grouped[1].value, "signup");
    }
}
