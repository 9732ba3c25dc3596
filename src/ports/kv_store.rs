//! Key-Value Store Port - Redis List Commands
//!
//! The minimal list surface the PPS history needs. Values are opaque
//! strings on write; reads return JSON values because REST front-ends
//! may hand back either raw strings or already-decoded objects.

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait KvStore: Send + Sync + 'static {
  /// `LPUSH key v1 v2 ...`; each value goes to the head in turn, so the
  /// last one ends up first. Returns the new list length.
  async fn lpush(&self, key: &str, values: &[String]) -> anyhow::Result<u64>;

  /// `LRANGE key start stop` (inclusive, negative indices from the end).
  async fn lrange(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<Value>>;

  /// `DEL key`; returns the number of keys removed.
  async fn del(&self, key: &str) -> anyhow::Result<u64>;
}
