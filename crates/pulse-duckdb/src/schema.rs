/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`,
/// read from `Config.duckdb_memory_limit` (env `PULSE_DUCKDB_MEMORY`).
/// An explicit limit is always set — the DuckDB default (80% of system RAM)
/// is not acceptable for a server process. `threads = 2` bounds the
/// background pool for single-writer embedded use.
///
/// Fact tables carry no foreign keys: a pageview may arrive before or
/// without its visit, and the cascading website delete orders its own
/// statements inside one transaction (see `website.rs`).
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- WEBSITES
-- ===========================================
-- Provisioned by the (external) registration flow. `name` holds the domain
-- and is the natural key every fact table references.
CREATE TABLE IF NOT EXISTS websites (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    name            VARCHAR NOT NULL UNIQUE,
    user_id         VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- USERS (collaborator-owned credentials)
-- ===========================================
-- Written by the out-of-scope key-issuance flow; this service only reads.
-- Keys are stored as SHA-256 hex, never raw.
CREATE TABLE IF NOT EXISTS users (
    id              VARCHAR PRIMARY KEY,
    api_key_hash    VARCHAR NOT NULL UNIQUE,
    discord_webhook VARCHAR
);

-- ===========================================
-- VISITS (one row per session start)
-- ===========================================
-- Dimensional columns are NOT NULL: blanks are coalesced to 'Unknown'
-- (source to 'Direct') before the insert, so aggregation never sees NULLs.
CREATE TABLE IF NOT EXISTS visits (
    id               VARCHAR NOT NULL,             -- UUID v4
    session_id       VARCHAR NOT NULL,
    visitor_id       VARCHAR,                      -- durable client token (nullable)
    website_id       VARCHAR NOT NULL,             -- domain, references websites.name
    source           VARCHAR NOT NULL,
    city             VARCHAR NOT NULL,
    region           VARCHAR NOT NULL,
    country          VARCHAR NOT NULL,
    operating_system VARCHAR NOT NULL,
    created_at       TIMESTAMP NOT NULL
);
-- Primary query pattern: website + trailing window
CREATE INDEX IF NOT EXISTS idx_visits_website_created
    ON visits(website_id, created_at);

-- ===========================================
-- PAGE VIEWS
-- ===========================================
CREATE TABLE IF NOT EXISTS page_views (
    id                VARCHAR NOT NULL,            -- UUID v4
    domain            VARCHAR NOT NULL,            -- same namespace as visits.website_id
    page              VARCHAR NOT NULL,            -- URL as sent by the script
    visit_id          VARCHAR,                     -- session correlation (nullable)
    city              VARCHAR NOT NULL,
    region            VARCHAR NOT NULL,
    country           VARCHAR NOT NULL,
    operating_system  VARCHAR NOT NULL,
    device_type       VARCHAR NOT NULL,
    browser_name      VARCHAR NOT NULL,
    screen_resolution VARCHAR NOT NULL,
    created_at        TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_page_views_domain_created
    ON page_views(domain, created_at);

-- ===========================================
-- CUSTOM EVENTS
-- ===========================================
CREATE TABLE IF NOT EXISTS custom_events (
    id              VARCHAR NOT NULL,              -- UUID v4
    event_name      VARCHAR NOT NULL,              -- lowercased at write
    website_id      VARCHAR NOT NULL,
    message         VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_custom_events_website_created
    ON custom_events(website_id, created_at);
"#
    )
}
