//! Interfaces to the collaborators the analytics core depends on but does
//! not own: API-credential lookup and the best-effort notification channel.
//! Key issuance, user management and webhook configuration all live outside
//! this system; only their lookup/delivery surfaces are modelled here so
//! implementations can be swapped without touching route handlers.

use async_trait::async_trait;
use serde::Serialize;

/// The owner resolved from an API credential.
#[derive(Debug, Clone)]
pub struct OwnerRecord {
    pub user_id: String,
    /// Messaging webhook for the custom-event side-channel, when configured.
    pub discord_webhook: Option<String>,
}

/// Credential lookup. Self-hosted deployments back this with the local
/// store's `users` table; a hosted deployment can point it at its own
/// directory service.
#[async_trait]
pub trait KeyDirectory: Send + Sync + 'static {
    /// Resolve a raw bearer token to its owner, or `None` when unknown.
    async fn resolve_api_key(&self, token: &str) -> anyhow::Result<Option<OwnerRecord>>;
}

/// Summary pushed to an owner's messaging webhook when a custom event is
/// recorded.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event_name: String,
    pub website: String,
    pub message: String,
    pub timestamp: String,
}

/// Best-effort notification delivery. A push failure must never affect the
/// fact write it follows — callers annotate their response and move on.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn push(&self, webhook_url: &str, summary: &EventSummary) -> anyhow::Result<()>;
}
