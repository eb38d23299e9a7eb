use std::sync::Arc;

use pulse_core::config::Config;
use pulse_duckdb::DuckDbBackend;
use pulse_metadata::{KeyDirectory, Notifier};

use crate::notify::DiscordNotifier;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// All fields are cheap to clone — heavy resources are wrapped in `Arc`.
/// There is no mutable aggregate state here: every ingestion call is one
/// fact insert and every aggregation call is a stateless scan, so
/// overlapping dashboard polls cannot corrupt anything by construction.
pub struct AppState {
    /// The DuckDB fact store. Internally `Arc<tokio::sync::Mutex<Connection>>`,
    /// already async-safe and cheap to clone.
    pub db: Arc<DuckDbBackend>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// API-credential lookup. Defaults to the DuckDB-backed directory; tests
    /// and hosted deployments swap in their own.
    pub directory: Arc<dyn KeyDirectory>,

    /// Best-effort custom-event side-channel. Defaults to the Discord webhook
    /// notifier; tests swap in a recording mock.
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let notifier = Arc::new(DiscordNotifier::new(config.notify_timeout()));
        Self {
            directory: db.clone(),
            notifier,
            db,
            config: Arc::new(config),
        }
    }
}
