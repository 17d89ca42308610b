//! Redis-backed invalidation of cached lead listings

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use leadflow_core::CacheInvalidator;

const SCAN_BATCH: usize = 500;

/// Deletes every `leads:{tenant_id}:*` key of a tenant
#[derive(Clone)]
pub struct RedisCacheInvalidator {
    conn: ConnectionManager,
}

impl RedisCacheInvalidator {
    /// Connect through a manager that reconnects after dropped connections
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).context("Invalid Redis URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

pub(crate) fn lead_key_pattern(tenant_id: i64) -> String {
    format!("leads:{}:*", tenant_id)
}

#[async_trait]
impl CacheInvalidator for RedisCacheInvalidator {
    #[tracing::instrument(skip(self))]
    async fn invalidate_leads(&self, tenant_id: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        let pattern = lead_key_pattern(tenant_id);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .context("Failed to scan lead cache keys")?;

            if !keys.is_empty() {
                let deleted: u64 = conn
                    .del(&keys)
                    .await
                    .context("Failed to delete lead cache keys")?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(tenant_id = tenant_id, removed = removed, "Lead cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_key_pattern() {
        assert_eq!(lead_key_pattern(42), "leads:42:*");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let err = match RedisCacheInvalidator::connect("not a redis url").await {
            Ok(_) => panic!("expected an invalid URL error"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("Invalid Redis URL"));
    }
}
