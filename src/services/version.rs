//! Option version stamp.
//!
//! Clients compare this stamp with the one stored next to their cached
//! options snapshot and refetch on mismatch. An automation calls the bump
//! endpoint whenever the options table changes.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicI64, Ordering};

const VERSION_KEY: &str = "template_relay:option_version";

#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Current version stamp.
    async fn current(&self) -> Result<i64, VersionError>;

    /// Move the stamp to the current time (strictly increasing) and return it.
    async fn bump(&self) -> Result<i64, VersionError>;

    /// Backend reachability, for health checks.
    async fn health_check(&self) -> Result<(), VersionError> {
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Process-local stamp. Resets to the start-up time on restart.
#[derive(Debug)]
pub struct MemoryVersionStore {
    version: AtomicI64,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::starting_at(now_millis())
    }

    pub fn starting_at(version: i64) -> Self {
        Self {
            version: AtomicI64::new(version),
        }
    }
}

impl Default for MemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn current(&self) -> Result<i64, VersionError> {
        Ok(self.version.load(Ordering::Acquire))
    }

    async fn bump(&self) -> Result<i64, VersionError> {
        let now = now_millis();
        let prev = self
            .version
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(now.max(v + 1)))
            .unwrap_or_else(|v| v);
        Ok(now.max(prev + 1))
    }
}

// GET, max(now, current + 1), SET as one atomic step. Lua numbers are
// doubles, exact for millisecond stamps.
const BUMP_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]))
local next = tonumber(ARGV[1])
if current and current + 1 > next then
  next = current + 1
end
redis.call('SET', KEYS[1], next)
return next
"#;

/// Redis-held stamp shared by every instance and kept across restarts.
#[derive(Debug)]
pub struct RedisVersionStore {
    client: redis::Client,
}

impl RedisVersionStore {
    pub fn new(redis_url: &str) -> Result<Self, VersionError> {
        let client = redis::Client::open(redis_url).map_err(VersionError::Redis)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VersionStore for RedisVersionStore {
    async fn current(&self) -> Result<i64, VersionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stored: Option<i64> = conn.get(VERSION_KEY).await?;
        if let Some(version) = stored {
            return Ok(version);
        }

        // First read on a fresh store: seed it, unless another instance won.
        let seeded: bool = conn.set_nx(VERSION_KEY, now_millis()).await?;
        if seeded {
            tracing::info!("Seeded option version in Redis");
        }
        let version: i64 = conn.get(VERSION_KEY).await?;
        Ok(version)
    }

    async fn bump(&self) -> Result<i64, VersionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let next: i64 = redis::Script::new(BUMP_SCRIPT)
            .key(VERSION_KEY)
            .arg(now_millis())
            .invoke_async(&mut conn)
            .await?;
        Ok(next)
    }

    async fn health_check(&self) -> Result<(), VersionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
