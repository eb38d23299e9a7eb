use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Domain to seed as a website at startup so the server is usable out of
    /// the box. `None` skips seeding (production: websites are provisioned by
    /// the registration flow).
    pub seed_domain: Option<String>,
    pub notify_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("PULSE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("PULSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("PULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            seed_domain: std::env::var("PULSE_SEED_DOMAIN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            notify_timeout_secs: std::env::var("PULSE_NOTIFY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}
