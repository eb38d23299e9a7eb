use async_trait::async_trait;
use sha2::{Digest, Sha256};

use pulse_metadata::{KeyDirectory, OwnerRecord};

use crate::backend::rand_hex;
use crate::DuckDbBackend;

/// Hash an API key with SHA-256. Only the hash ever touches storage, so a
/// leaked database does not leak usable credentials.
pub fn hash_api_key(raw_key: &str) -> String {
    let hash = Sha256::digest(raw_key.as_bytes());
    hex::encode(hash)
}

/// Credential lookup against the collaborator-provisioned `users` table.
/// This service never issues or revokes keys — it only resolves them.
#[async_trait]
impl KeyDirectory for DuckDbBackend {
    async fn resolve_api_key(&self, token: &str) -> anyhow::Result<Option<OwnerRecord>> {
        let key_hash = hash_api_key(token);
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT id, discord_webhook FROM users WHERE api_key_hash = ?1")?;
        let owner = stmt
            .query_row(duckdb::params![key_hash], |row| {
                Ok(OwnerRecord {
                    user_id: row.get(0)?,
                    discord_webhook: row.get(1)?,
                })
            })
            .ok();
        Ok(owner)
    }
}

impl DuckDbBackend {
    /// Provision a credential row for startup seeding and tests.
    ///
    /// Returns the raw key — the only time it is ever visible; the table
    /// stores its hash.
    pub async fn seed_user(
        &self,
        user_id: &str,
        discord_webhook: Option<&str>,
    ) -> anyhow::Result<String> {
        let raw_key = format!("plk_{}", rand_hex(16));
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, api_key_hash, discord_webhook) VALUES (?1, ?2, ?3)",
            duckdb::params![user_id, hash_api_key(&raw_key), discord_webhook],
        )?;
        Ok(raw_key)
    }
}
