//! PPS History Use Case - Sample Persistence and Retention
//!
//! Appends price-per-share samples to a per-vault Redis list and prunes
//! entries older than the retention window.
//!
//! Cleanup flow:
//! 1. Read the whole list
//! 2. Parse entries, drop unparsable ones, find stale ones
//! 3. If nothing is stale, stop without writing
//! 4. Otherwise DEL the key and LPUSH the survivors (oldest first) so the
//!    list is newest-first again
//!
//! Steps 3 and 4 are two separate commands; a crash in between leaves the
//! list empty until the next sample is written.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::sample::{pps_key, retention_cutoff, PpsSample};
use crate::ports::kv_store::KvStore;

/// What a cleanup pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
  /// Valid, in-window samples left in the list.
  pub kept: usize,
  /// Samples dropped for being older than the cutoff.
  pub expired: usize,
  /// Entries dropped because they could not be parsed.
  pub malformed: usize,
  /// Whether DEL + LPUSH were issued.
  pub rewritten: bool,
}

/// PPS sample store over any `KvStore`.
pub struct PpsStore<K: KvStore> {
  kv: K,
}

impl<K: KvStore> PpsStore<K> {
  pub fn new(kv: K) -> Self {
    Self { kv }
  }

  /// Append `sample` to the vault's list. Returns `false` on any failure.
  #[instrument(skip(self, sample), fields(vault = %vault))]
  pub async fn store_sample(&self, vault: &Address, sample: &PpsSample) -> bool {
    let key = pps_key(vault);
    let encoded = match serde_json::to_string(sample) {
      Ok(encoded) => encoded,
      Err(e) => {
        warn!(error = %e, "Failed to encode PPS sample");
        return false;
      }
    };

    match self.kv.lpush(&key, &[encoded]).await {
      Ok(len) => {
        info!(key = %key, pps = %sample.price_per_share, list_len = len, "PPS sample stored");
        true
      }
      Err(e) => {
        warn!(key = %key, error = %e, "Failed to store PPS sample");
        false
      }
    }
  }

  /// Prune samples older than `retention_days` relative to now.
  pub async fn cleanup(&self, vault: &Address, retention_days: u32) -> Result<CleanupSummary> {
    self
      .cleanup_at(vault, retention_days, Utc::now().timestamp())
      .await
  }

  /// Prune samples older than `retention_days` relative to `now`.
  #[instrument(skip(self), fields(vault = %vault))]
  pub async fn cleanup_at(
    &self,
    vault: &Address,
    retention_days: u32,
    now: i64,
  ) -> Result<CleanupSummary> {
    let key = pps_key(vault);
    let cutoff = retention_cutoff(now, retention_days);

    let entries = self
      .kv
      .lrange(&key, 0, -1)
      .await
      .context("Failed to read PPS history")?;

    let mut summary = CleanupSummary::default();
    let mut survivors: Vec<String> = Vec::with_capacity(entries.len());

    for entry in &entries {
      match PpsSample::from_stored(entry) {
        Some(sample) if sample.is_older_than(cutoff) => summary.expired += 1,
        Some(_) => survivors.push(stored_text(entry)),
        None => summary.malformed += 1,
      }
    }
    summary.kept = survivors.len();

    if summary.expired == 0 {
      debug!(key = %key, entries = entries.len(), "No expired PPS samples");
      return Ok(summary);
    }

    self
      .kv
      .del(&key)
      .await
      .context("Failed to delete PPS history")?;

    if !survivors.is_empty() {
      survivors.reverse();
      self
        .kv
        .lpush(&key, &survivors)
        .await
        .context("Failed to rewrite PPS history")?;
    }
    summary.rewritten = true;

    info!(
      key = %key,
      kept = summary.kept,
      expired = summary.expired,
      malformed = summary.malformed,
      "PPS history pruned"
    );

    Ok(summary)
  }

  /// Newest-first samples, at most `limit` of them. Invalid entries are
  /// skipped, so fewer than `limit` may come back.
  pub async fn history(&self, vault: &Address, limit: Option<usize>) -> Result<Vec<PpsSample>> {
    if limit == Some(0) {
      return Ok(Vec::new());
    }
    let stop = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX) - 1);
    let entries = self
      .kv
      .lrange(&pps_key(vault), 0, stop)
      .await
      .context("Failed to read PPS history")?;

    Ok(entries.iter().filter_map(PpsSample::from_stored).collect())
  }
}

/// The exact text to write back for an entry that survived cleanup.
fn stored_text(entry: &Value) -> String {
  match entry {
    Value::String(raw) => raw.clone(),
    other => other.to_string(),
  }
}
