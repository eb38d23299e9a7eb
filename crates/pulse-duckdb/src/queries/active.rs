use anyhow::Result;
use chrono::Utc;

use crate::facts::TS_CMP_FMT;
use crate::DuckDbBackend;

/// Width of the trailing active-user window.
const ACTIVE_WINDOW_MINUTES: i64 = 10;

impl DuckDbBackend {
    /// Distinct sessions with at least one event (visit or correlated
    /// pageview) in the trailing ten minutes.
    ///
    /// Recomputed from the facts on every call — there is no persisted gauge;
    /// the dashboard polls this (~60s) rather than subscribing. Pageviews
    /// without a session correlation cannot name a session and are excluded.
    pub async fn count_active_sessions(&self, website_id: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let cutoff = (Utc::now() - chrono::Duration::minutes(ACTIVE_WINDOW_MINUTES))
            .format(TS_CMP_FMT)
            .to_string();

        let count: i64 = conn
            .prepare(
                r#"SELECT COUNT(*) FROM (
                       SELECT session_id AS sid FROM visits
                       WHERE website_id = ?1 AND created_at >= ?2
                       UNION
                       SELECT visit_id AS sid FROM page_views
                       WHERE domain = ?1 AND visit_id IS NOT NULL AND created_at >= ?2
                   )"#,
            )?
            .query_row(duckdb::params![website_id, cutoff], |row| row.get(0))?;

        Ok(count)
    }
}
