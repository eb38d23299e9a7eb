use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fact::{PageView, Visit};

/// Fallback for dimensional fields the tracking script could not resolve.
pub const UNKNOWN: &str = "Unknown";
/// Source attributed to visits that arrive without a campaign tag.
pub const DIRECT: &str = "Direct";

/// Wire value of the `event` field. Unknown strings are rejected at
/// deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackEventKind {
    SessionStart,
    Pageview,
    SessionEnd,
}

/// The payload the tracking script sends to POST /api/track.
/// Wire names are camelCase; `event` selects the fact kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackPayload {
    pub domain: String,
    pub url: String,
    pub event: TrackEventKind,
    pub source: Option<String>,
    /// Client-generated session token; server-assigned for session starts
    /// that arrive without one.
    pub session_id: Option<String>,
    /// Long-lived visitor token (localStorage), if the client holds one.
    pub visitor_id: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub operating_system: Option<String>,
    pub device_type: Option<String>,
    pub browser_name: Option<String>,
    pub screen_resolution: Option<String>,
}

/// A validated tracking payload mapped to the fact it stores — one explicit
/// variant per event kind instead of a single loosely-typed record.
#[derive(Debug, Clone)]
pub enum TrackFact {
    SessionStart(Visit),
    PageView(PageView),
    /// Reserved for duration tracking: acknowledged, writes nothing.
    SessionEnd,
}

fn coalesce(field: Option<String>, fallback: &str) -> String {
    match field {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

impl TrackPayload {
    /// True when `url` legitimately belongs to `domain`.
    ///
    /// The embed snippet can be pasted on the wrong site (or forged); a
    /// payload whose URL does not contain its own domain is rejected before
    /// any fact is written.
    pub fn domain_matches(&self) -> bool {
        self.url.contains(&self.domain)
    }

    /// Fill blank optional fields at the write boundary: dimensions become
    /// `"Unknown"`, a missing source becomes `"Direct"`. The result is what
    /// gets echoed back to the caller and fed to [`TrackPayload::into_fact`].
    pub fn normalized(self) -> Self {
        Self {
            domain: self.domain,
            url: self.url,
            event: self.event,
            source: Some(coalesce(self.source, DIRECT)),
            session_id: non_blank(self.session_id),
            visitor_id: non_blank(self.visitor_id),
            city: Some(coalesce(self.city, UNKNOWN)),
            region: Some(coalesce(self.region, UNKNOWN)),
            country: Some(coalesce(self.country, UNKNOWN)),
            operating_system: Some(coalesce(self.operating_system, UNKNOWN)),
            device_type: Some(coalesce(self.device_type, UNKNOWN)),
            browser_name: Some(coalesce(self.browser_name, UNKNOWN)),
            screen_resolution: Some(coalesce(self.screen_resolution, UNKNOWN)),
        }
    }

    /// Convert into the fact to store. `now` is the server-assigned insert
    /// timestamp. Coalescing is applied here as well, so the conversion is
    /// safe on payloads that skipped [`TrackPayload::normalized`].
    pub fn into_fact(self, now: DateTime<Utc>) -> TrackFact {
        match self.event {
            TrackEventKind::SessionStart => TrackFact::SessionStart(Visit {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: non_blank(self.session_id)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                visitor_id: non_blank(self.visitor_id),
                website_id: self.domain,
                source: coalesce(self.source, DIRECT),
                city: coalesce(self.city, UNKNOWN),
                region: coalesce(self.region, UNKNOWN),
                country: coalesce(self.country, UNKNOWN),
                operating_system: coalesce(self.operating_system, UNKNOWN),
                created_at: now,
            }),
            TrackEventKind::Pageview => TrackFact::PageView(PageView {
                id: uuid::Uuid::new_v4().to_string(),
                domain: self.domain,
                page: self.url,
                visit_id: non_blank(self.session_id),
                city: coalesce(self.city, UNKNOWN),
                region: coalesce(self.region, UNKNOWN),
                country: coalesce(self.country, UNKNOWN),
                operating_system: coalesce(self.operating_system, UNKNOWN),
                device_type: coalesce(self.device_type, UNKNOWN),
                browser_name: coalesce(self.browser_name, UNKNOWN),
                screen_resolution: coalesce(self.screen_resolution, UNKNOWN),
                created_at: now,
            }),
            TrackEventKind::SessionEnd => TrackFact::SessionEnd,
        }
    }
}
