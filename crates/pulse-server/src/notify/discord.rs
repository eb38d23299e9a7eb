use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::json;

use pulse_metadata::{EventSummary, Notifier};

/// Pushes custom-event summaries to a Discord-compatible webhook.
///
/// Fire-and-forget semantics: tight timeouts, no redirects, no retries.
/// A failed delivery is the caller's advisory annotation, never a rollback
/// of the fact write that preceded it.
pub struct DiscordNotifier {
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn push(&self, webhook_url: &str, summary: &EventSummary) -> anyhow::Result<()> {
        let parsed = url::Url::parse(webhook_url.trim())
            .map_err(|_| anyhow!("invalid webhook url"))?;
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            bail!("webhook url must use http or https");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let payload = json!({
            "content": format!("🔔 {}", summary.event_name),
            "embeds": [{
                "title": summary.event_name,
                "fields": [
                    { "name": "Website", "value": summary.website },
                    { "name": "Message", "value": summary.message },
                    { "name": "Timestamp", "value": summary.timestamp },
                ],
            }],
        });

        let response = client.post(parsed).json(&payload).send().await?;
        if !response.status().is_success() {
            bail!("webhook responded with status {}", response.status());
        }
        Ok(())
    }
}
