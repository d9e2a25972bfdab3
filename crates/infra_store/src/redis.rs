//! Redis-backed store adapter.
//!
//! Maps the [`SharedStore`] contract onto Redis primitives: `SET NX PX`
//! for the atomic set-if-absent, `PX`-qualified `SET` for plain writes,
//! `GET`/`DEL`/`KEYS` for the rest. Server-side TTL enforcement is what
//! gives lock expiry its cross-process guarantee.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::StoreError;
use crate::store::SharedStore;

/// Redis [`SharedStore`] implementation.
///
/// Holds a [`ConnectionManager`], which multiplexes and reconnects
/// transparently; each operation works on a cheap clone of it.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the given Redis URL (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Wraps an already established connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        // PX 0 is rejected by the server; clamp to the shortest legal TTL.
        (ttl.as_millis() as u64).max(1)
    }
}

fn map_err(e: redis::RedisError) -> StoreError {
    if e.is_connection_refusal() || e.is_io_error() || e.is_timeout() {
        StoreError::unavailable(e.to_string())
    } else {
        StoreError::backend(e.to_string())
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(Self::ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(reply.is_some())
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(Self::ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(removed > 0)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(map_err)
    }
}
