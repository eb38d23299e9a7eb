use anyhow::Result;
use chrono::{DateTime, Utc};

use pulse_core::fact::{CustomEvent, PageView, ViewsResult, Visit};
use pulse_core::window::WindowSpec;

use crate::DuckDbBackend;

/// Format used for timestamp comparisons bound as SQL parameters.
pub(crate) const TS_CMP_FMT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Lower bound bound into windowed scans; unbounded windows scan from the
/// epoch so every query shape stays identical.
fn cutoff_param(window: WindowSpec, now: DateTime<Utc>) -> String {
    window
        .cutoff(now)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .format(TS_CMP_FMT)
        .to_string()
}

fn ts_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl DuckDbBackend {
    /// Insert a single visit fact. `created_at` was server-assigned by the
    /// gateway; exactly one row per call.
    pub async fn insert_visit(&self, visit: &Visit) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO visits (
                id, session_id, visitor_id, website_id, source,
                city, region, country, operating_system, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            duckdb::params![
                visit.id,
                visit.session_id,
                visit.visitor_id,
                visit.website_id,
                visit.source,
                visit.city,
                visit.region,
                visit.country,
                visit.operating_system,
                visit.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert a single pageview fact.
    pub async fn insert_page_view(&self, view: &PageView) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO page_views (
                id, domain, page, visit_id,
                city, region, country, operating_system,
                device_type, browser_name, screen_resolution, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            duckdb::params![
                view.id,
                view.domain,
                view.page,
                view.visit_id,
                view.city,
                view.region,
                view.country,
                view.operating_system,
                view.device_type,
                view.browser_name,
                view.screen_resolution,
                view.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert a single custom-event fact.
    pub async fn insert_custom_event(&self, event: &CustomEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO custom_events (id, event_name, website_id, message, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            duckdb::params![
                event.id,
                event.event_name,
                event.website_id,
                event.message,
                event.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Scan the in-window facts for one website.
    ///
    /// The window is applied in SQL (inclusive lower bound, `now` taken per
    /// call), rows come back in insertion order so downstream grouping keeps
    /// its first-seen tie order. Pure read: no state survives the call.
    pub async fn get_views(&self, website_id: &str, window: WindowSpec) -> Result<ViewsResult> {
        let conn = self.conn.lock().await;
        let cutoff = cutoff_param(window, Utc::now());

        let mut stmt = conn.prepare(
            r#"SELECT id, domain, page, visit_id,
                      city, region, country, operating_system,
                      device_type, browser_name, screen_resolution,
                      epoch_us(created_at)
               FROM page_views
               WHERE domain = ?1 AND created_at >= ?2
               ORDER BY created_at"#,
        )?;
        let rows = stmt.query_map(duckdb::params![website_id, cutoff], |row| {
            Ok(PageView {
                id: row.get(0)?,
                domain: row.get(1)?,
                page: row.get(2)?,
                visit_id: row.get(3)?,
                city: row.get(4)?,
                region: row.get(5)?,
                country: row.get(6)?,
                operating_system: row.get(7)?,
                device_type: row.get(8)?,
                browser_name: row.get(9)?,
                screen_resolution: row.get(10)?,
                created_at: ts_from_micros(row.get(11)?),
            })
        })?;
        let mut page_views = Vec::new();
        for row in rows {
            page_views.push(row?);
        }

        let mut stmt = conn.prepare(
            r#"SELECT id, session_id, visitor_id, website_id, source,
                      city, region, country, operating_system,
                      epoch_us(created_at)
               FROM visits
               WHERE website_id = ?1 AND created_at >= ?2
               ORDER BY created_at"#,
        )?;
        let rows = stmt.query_map(duckdb::params![website_id, cutoff], |row| {
            Ok(Visit {
                id: row.get(0)?,
                session_id: row.get(1)?,
                visitor_id: row.get(2)?,
                website_id: row.get(3)?,
                source: row.get(4)?,
                city: row.get(5)?,
                region: row.get(6)?,
                country: row.get(7)?,
                operating_system: row.get(8)?,
                created_at: ts_from_micros(row.get(9)?),
            })
        })?;
        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?);
        }

        let mut stmt = conn.prepare(
            r#"SELECT id, event_name, website_id, message, epoch_us(created_at)
               FROM custom_events
               WHERE website_id = ?1 AND created_at >= ?2
               ORDER BY created_at"#,
        )?;
        let rows = stmt.query_map(duckdb::params![website_id, cutoff], |row| {
            Ok(CustomEvent {
                id: row.get(0)?,
                event_name: row.get(1)?,
                website_id: row.get(2)?,
                message: row.get(3)?,
                created_at: ts_from_micros(row.get(4)?),
            })
        })?;
        let mut custom_events = Vec::new();
        for row in rows {
            custom_events.push(row?);
        }

        Ok(ViewsResult {
            page_views,
            visits,
            custom_events,
        })
    }

    /// List custom events, newest first, optionally scoped to one website.
    /// Unpaginated — the whole collection comes back.
    pub async fn list_custom_events(&self, website_id: Option<&str>) -> Result<Vec<CustomEvent>> {
        let conn = self.conn.lock().await;
        let map_row = |row: &duckdb::Row<'_>| {
            Ok(CustomEvent {
                id: row.get(0)?,
                event_name: row.get(1)?,
                website_id: row.get(2)?,
                message: row.get(3)?,
                created_at: ts_from_micros(row.get(4)?),
            })
        };

        let mut events = Vec::new();
        match website_id {
            Some(website_id) => {
                let mut stmt = conn.prepare(
                    r#"SELECT id, event_name, website_id, message, epoch_us(created_at)
                       FROM custom_events WHERE website_id = ?1
                       ORDER BY created_at DESC"#,
                )?;
                let rows = stmt.query_map(duckdb::params![website_id], map_row)?;
                for row in rows {
                    events.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"SELECT id, event_name, website_id, message, epoch_us(created_at)
                       FROM custom_events ORDER BY created_at DESC"#,
                )?;
                let rows = stmt.query_map([], map_row)?;
                for row in rows {
                    events.push(row?);
                }
            }
        }
        Ok(events)
    }
}
