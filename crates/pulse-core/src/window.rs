use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};

/// A rolling time filter applied to facts before aggregation.
///
/// Parsed from the strings the dashboard sends (`"all time"`, `"last 1 hour"`,
/// `"last 7 days"`, ...). Day windows are converted to hours so inclusion is
/// a single comparison: a fact qualifies when `now - created_at` does not
/// exceed the window. `now` is taken per request — there is no cached clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    AllTime,
    LastHours(i64),
}

impl WindowSpec {
    /// Parse a window string. `None`, the empty string, `"0"` and
    /// `"all time"` all mean unbounded.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty()
            || raw == "0"
            || raw.eq_ignore_ascii_case("all")
            || raw.eq_ignore_ascii_case("all time")
        {
            return Ok(Self::AllTime);
        }

        let rest = raw
            .strip_prefix("last ")
            .ok_or_else(|| anyhow!("window must be \"all time\" or \"last N hours|days\""))?;
        let mut parts = rest.splitn(2, ' ');
        let count: i64 = parts
            .next()
            .unwrap_or("")
            .parse()
            .map_err(|_| anyhow!("window count must be a positive integer"))?;
        if count <= 0 {
            return Err(anyhow!("window count must be a positive integer"));
        }
        match parts.next().map(str::trim) {
            Some("hour") | Some("hours") => Ok(Self::LastHours(count)),
            Some("day") | Some("days") => Ok(Self::LastHours(count * 24)),
            _ => Err(anyhow!("window unit must be hours or days")),
        }
    }

    /// Inclusive lower bound for qualifying facts, or `None` when unbounded.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::AllTime => None,
            Self::LastHours(hours) => Some(now - Duration::hours(*hours)),
        }
    }

    /// Whether a fact with this `created_at` falls inside the window.
    pub fn contains(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.cutoff(now) {
            None => true,
            Some(cutoff) => created_at >= cutoff,
        }
    }
}
