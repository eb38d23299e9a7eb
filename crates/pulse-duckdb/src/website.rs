use anyhow::Result;

use pulse_core::fact::Website;

use crate::DuckDbBackend;

/// Rows removed by a cascading website delete, per fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCounts {
    pub page_views: usize,
    pub visits: usize,
    pub custom_events: usize,
}

impl DuckDbBackend {
    /// Insert a website row if the domain is not registered yet.
    ///
    /// Registration proper is an external flow; this exists for startup
    /// seeding and tests. `INSERT OR IGNORE` (name is UNIQUE) keeps re-runs
    /// on every startup safe.
    pub async fn seed_website(&self, name: &str, user_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO websites (id, name, user_id) VALUES (?1, ?2, ?3)",
            duckdb::params![uuid::Uuid::new_v4().to_string(), name, user_id],
        )?;
        Ok(())
    }

    /// Return `true` if a website with the given domain exists.
    ///
    /// Used at track time to reject session starts for unknown sites before
    /// a visit row is written.
    pub async fn website_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM websites WHERE name = ?1")?;
        let count: i64 = stmt.query_row(duckdb::params![name], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub async fn get_website(&self, name: &str) -> Result<Option<Website>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, user_id, CAST(created_at AS VARCHAR) FROM websites WHERE name = ?1",
        )?;
        let website = stmt
            .query_row(duckdb::params![name], |row| {
                Ok(Website {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    user_id: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .ok();
        Ok(website)
    }

    /// Delete a website and every fact sharing its domain.
    ///
    /// All four deletes run inside one transaction, facts first, so a
    /// mid-cascade failure can never leave fact rows referencing a missing
    /// website. Returns the per-resource row counts, or `None` when the
    /// domain is unknown (nothing is touched in that case).
    pub async fn delete_website(&self, name: &str) -> Result<Option<DeleteCounts>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let exists: i64 = tx
            .prepare("SELECT COUNT(*) FROM websites WHERE name = ?1")?
            .query_row(duckdb::params![name], |row| row.get(0))?;
        if exists == 0 {
            return Ok(None);
        }

        let page_views = tx.execute(
            "DELETE FROM page_views WHERE domain = ?1",
            duckdb::params![name],
        )?;
        let visits = tx.execute(
            "DELETE FROM visits WHERE website_id = ?1",
            duckdb::params![name],
        )?;
        let custom_events = tx.execute(
            "DELETE FROM custom_events WHERE website_id = ?1",
            duckdb::params![name],
        )?;
        tx.execute("DELETE FROM websites WHERE name = ?1", duckdb::params![name])?;
        tx.commit()?;

        Ok(Some(DeleteCounts {
            page_views,
            visits,
            custom_events,
        }))
    }
}
