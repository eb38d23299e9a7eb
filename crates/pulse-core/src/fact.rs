use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session-start fact — mirrors the DuckDB `visits` table columns exactly.
///
/// Dimensional fields are always non-empty strings: blank values are
/// coalesced to `"Unknown"` (and a blank source to `"Direct"`) when the fact
/// is constructed, so grouping code never handles nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub session_id: String,
    /// Durable cross-session visitor token, when the client holds one.
    /// Distinct from `session_id`; feeds the return-rate metric.
    pub visitor_id: Option<String>,
    pub website_id: String,
    pub source: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub operating_system: String,
    pub created_at: DateTime<Utc>,
}

/// A pageview fact — mirrors the `page_views` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub id: String,
    /// Website identifier; same namespace as `Visit::website_id`.
    pub domain: String,
    /// The URL as sent by the tracking script, absolute or path-only.
    pub page: String,
    /// Session correlation. NULL for session-less pageviews — the store does
    /// not enforce referential integrity, a pageview may arrive before or
    /// without its visit.
    pub visit_id: Option<String>,
    pub city: String,
    pub region: String,
    pub country: String,
    pub operating_system: String,
    pub device_type: String,
    pub browser_name: String,
    pub screen_resolution: String,
    pub created_at: DateTime<Utc>,
}

/// A server-side custom event — mirrors the `custom_events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: String,
    pub event_name: String,
    pub website_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl CustomEvent {
    /// Build a stored custom-event fact. Names are case-normalized to
    /// lowercase so grouping by name is case-insensitive.
    pub fn record(name: &str, domain: &str, message: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_name: name.trim().to_lowercase(),
            website_id: domain.trim().to_string(),
            message: message.to_string(),
            created_at: now,
        }
    }
}

/// A registered website. Rows are provisioned by the (external) registration
/// flow; `name` holds the domain and is the natural key every fact references.
#[derive(Debug, Clone, Serialize)]
pub struct Website {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: String,
}

/// The in-window fact rows a `GetViews` call returns. Reading is idempotent:
/// two calls with no intervening writes produce identical results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsResult {
    pub page_views: Vec<PageView>,
    pub visits: Vec<Visit>,
    pub custom_events: Vec<CustomEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_event_name_is_lowercased() {
        let event = CustomEvent::record("Purchase_Completed", "example.com", "plan=pro", Utc::now());
        assert_eq!(event.event_name, "purchase_completed");
        assert_eq!(event.website_id, "example.com");
    }

    #[test]
    fn custom_event_trims_name_and_domain() {
        let event = CustomEvent::record("  Signup ", " example.com ", "", Utc::now());
        assert_eq!(event.event_name, "signup");
        assert_eq!(event.website_id, "example.com");
    }
}
