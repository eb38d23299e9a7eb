//! Derived metrics over an in-window fact set.
//!
//! Every function here is a pure read of the rows handed to it: no clock, no
//! store access, no cached state. Zero-division cases are pinned to 0, never
//! NaN or infinity.

use std::collections::{HashMap, HashSet};

use crate::fact::{PageView, Visit};

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of sessions with exactly one pageview, in [0, 100] with
/// two-decimal rounding. 0 when there are no sessions.
///
/// Pageviews correlate to sessions via `visit_id == session_id`; pageviews
/// without a matching session are ignored, and a session with zero pageviews
/// is not a bounce.
pub fn bounce_rate(page_views: &[PageView], visits: &[Visit]) -> f64 {
    if visits.is_empty() {
        return 0.0;
    }
    let sessions: HashSet<&str> = visits.iter().map(|v| v.session_id.as_str()).collect();
    let mut per_session: HashMap<&str, u64> = HashMap::new();
    for view in page_views {
        if let Some(sid) = view.visit_id.as_deref() {
            if sessions.contains(sid) {
                *per_session.entry(sid).or_insert(0) += 1;
            }
        }
    }
    let bounces = per_session.values().filter(|&&count| count == 1).count();
    round2(bounces as f64 / visits.len() as f64 * 100.0)
}

/// Pageviews per session, one-decimal rounding. 0 when there are no visits.
pub fn pages_per_session(page_views: &[PageView], visits: &[Visit]) -> f64 {
    if visits.is_empty() {
        return 0.0;
    }
    round1(page_views.len() as f64 / visits.len() as f64)
}

/// Percentage of sessions attributable to a returning visitor:
/// `(sessions - unique visitors) / sessions * 100`, one-decimal rounding.
///
/// Uniqueness comes from the durable `visitor_id`; a visit without one counts
/// as its own unique visitor, so untagged traffic contributes 0 rather than
/// inflating the rate.
pub fn return_rate(visits: &[Visit]) -> f64 {
    if visits.is_empty() {
        return 0.0;
    }
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = 0usize;
    for visit in visits {
        match visit.visitor_id.as_deref() {
            Some(vid) => {
                if seen.insert(vid) {
                    unique += 1;
                }
            }
            None => unique += 1,
        }
    }
    round1((visits.len() - unique) as f64 / visits.len() as f64 * 100.0)
}
