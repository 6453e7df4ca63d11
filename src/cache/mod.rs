use anyhow::Result;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Optional Redis-backed key/value store. Every operation degrades to a miss
/// or a no-op when the server cannot be reached.
pub struct Cache {
    client: redis::Client,
}

impl Cache {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Cache { client })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.client.get_multiplexed_async_connection().await.ok()?;
        let raw: Option<String> = conn.get(key).await.unwrap_or(None);
        match serde_json::from_str(&raw?) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Ignoring undecodable cache entry {key}: {e}");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        if let Ok(mut conn) = self.client.get_multiplexed_async_connection().await {
            let _: std::result::Result<(), _> = conn.set_ex(key, raw, ttl_secs).await;
        }
        Ok(())
    }

    pub async fn delete(&self, key: &str) {
        if let Ok(mut conn) = self.client.get_multiplexed_async_connection().await {
            let _: std::result::Result<(), _> = conn.del(key).await;
        }
    }

    pub async fn ping(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: std::result::Result<String, _> =
                    redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }
}
