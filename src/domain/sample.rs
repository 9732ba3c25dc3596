//! PPS Samples - Persisted Price-per-Share History
//!
//! Samples are stored as JSON strings in one Redis list per vault,
//! newest first. The field names match what the dashboard reads back
//! (`timestamp`, `pps`, `blockNumber`, `txHash`).

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Seconds in one retention day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// One price-per-share observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PpsSample {
  /// Unix epoch seconds.
  pub timestamp: i64,
  /// Decimal price-per-share rendered as a string.
  #[serde(rename = "pps")]
  pub price_per_share: String,
  pub block_number: u64,
  pub tx_hash: String,
}

impl PpsSample {
  /// Parse a stored list entry. The REST store may return either the raw
  /// JSON string or an already-decoded object; anything else is `None`.
  pub fn from_stored(value: &Value) -> Option<Self> {
    match value {
      Value::String(raw) => serde_json::from_str(raw).ok(),
      Value::Object(_) => serde_json::from_value(value.clone()).ok(),
      _ => None,
    }
  }

  /// True when the sample is strictly older than `cutoff`.
  pub fn is_older_than(&self, cutoff: i64) -> bool {
    self.timestamp < cutoff
  }
}

/// Store key for a vault's sample list: `pps:<lower-case hex address>`.
pub fn pps_key(vault: &Address) -> String {
  format!("pps:{vault:#x}")
}

/// Oldest timestamp still inside a `retention_days` window ending at `now`.
pub fn retention_cutoff(now: i64, retention_days: u32) -> i64 {
  now - i64::from(retention_days) * SECONDS_PER_DAY
}
